//! # Server Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file at all) is a valid configuration.
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0:32887"
//! tick_rate = 60
//!
//! [gameplay]
//! team1_spawn = { x = 64.0, y = 256.0, z = 58.0 }
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use trench_core::{Vec3, VoxelMap};

use crate::error::{ServerError, ServerResult};

/// Highest accepted tick rate (Hz).
pub const MAX_TICK_RATE: u32 = 240;

/// Highest accepted player count. Player ids are one byte and the client
/// protocol reserves everything above 31.
pub const MAX_PLAYERS: usize = 32;

/// Most voxels a map may hold (eight times a 512x512x64 map).
pub const MAX_MAP_VOLUME: usize = 1 << 27;

/// Complete server configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Network and pacing.
    pub server: NetworkConfig,
    /// Simulation map.
    pub map: MapConfig,
    /// Match rules.
    pub gameplay: GameplayConfig,
}

/// Network and pacing settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// UDP address to bind.
    pub bind_address: SocketAddr,
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Player slots.
    pub max_players: usize,
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_level: String,
    /// Seconds of silence before a player is dropped.
    pub client_timeout_secs: f32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 32887)),
            tick_rate: 60,
            max_players: MAX_PLAYERS,
            log_level: "info".to_string(),
            client_timeout_secs: 10.0,
        }
    }
}

/// Simulation map settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Extent along `x`.
    pub width: i32,
    /// Extent along `y`.
    pub length: i32,
    /// Extent along `z`.
    pub depth: i32,
    /// Voxels at and below this `z` start solid.
    pub ground_z: i32,
    /// Map file streamed to joining clients as-is. No file means an empty
    /// transfer.
    pub file: Option<PathBuf>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 512,
            length: 512,
            depth: 64,
            ground_z: 60,
            file: None,
        }
    }
}

/// Match rules.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameplayConfig {
    /// Longest fuse a client may request (seconds).
    pub max_grenade_fuse: f32,
    /// Largest perpendicular miss a hit claim may have (units).
    pub aim_tolerance: f32,
    /// Longest range a hit claim may have (units).
    pub dist_tolerance: f32,
    /// Hit points lost per unit of fall magnitude.
    pub fall_damage_scale: f32,
    /// Seconds between death and respawn.
    pub respawn_secs: f32,
    /// Furthest a player may build or dig from its eye (units).
    pub build_reach: f32,
    /// Furthest a reported position may be from the server's (units).
    pub position_tolerance: f32,
    /// Captures needed to win.
    pub cap_limit: u8,
    /// Fog colour sent to joining players.
    pub fog_color: [u8; 3],
    /// Team 1 spawn point (eye position).
    pub team1_spawn: Vec3,
    /// Team 2 spawn point (eye position).
    pub team2_spawn: Vec3,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            max_grenade_fuse: 3.0,
            aim_tolerance: 1.5,
            dist_tolerance: 128.0,
            fall_damage_scale: 4.0,
            respawn_secs: 5.0,
            build_reach: 6.0,
            position_tolerance: 4.0,
            cap_limit: 10,
            fog_color: [128, 232, 255],
            team1_spawn: Vec3::new(64.0, 256.0, 57.0),
            team2_spawn: Vec3::new(448.0, 256.0, 57.0),
        }
    }
}

impl ServerConfig {
    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid TOML for this shape,
    /// or holds out-of-range values.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::load`].
    pub fn from_toml(content: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> ServerResult<()> {
        let server = &self.server;
        if !(1..=MAX_TICK_RATE).contains(&server.tick_rate) {
            return Err(ServerError::InvalidConfig(format!(
                "server.tick_rate must be 1..={MAX_TICK_RATE}, got {}",
                server.tick_rate
            )));
        }
        if !(1..=MAX_PLAYERS).contains(&server.max_players) {
            return Err(ServerError::InvalidConfig(format!(
                "server.max_players must be 1..={MAX_PLAYERS}, got {}",
                server.max_players
            )));
        }
        if server.client_timeout_secs <= 0.0 {
            return Err(ServerError::InvalidConfig(
                "server.client_timeout_secs must be positive".to_string(),
            ));
        }
        let map = &self.map;
        if map.width <= 0 || map.length <= 0 || map.depth <= 0 {
            return Err(ServerError::InvalidConfig(format!(
                "map dimensions must be positive, got {}x{}x{}",
                map.width, map.length, map.depth
            )));
        }
        if !VoxelMap::cells(map.width, map.length, map.depth)
            .is_some_and(|cells| cells <= MAX_MAP_VOLUME)
        {
            return Err(ServerError::InvalidConfig(format!(
                "map volume must be at most {MAX_MAP_VOLUME} voxels, got {}x{}x{}",
                map.width, map.length, map.depth
            )));
        }
        if self.gameplay.max_grenade_fuse <= 0.0 {
            return Err(ServerError::InvalidConfig(
                "gameplay.max_grenade_fuse must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Fails if an override leaves the configuration out of range.
    pub fn apply(&mut self, args: &CliArgs) -> ServerResult<()> {
        if let Some(port) = args.port {
            self.server.bind_address.set_port(port);
        }
        if let Some(tick_rate) = args.tick_rate {
            self.server.tick_rate = tick_rate;
        }
        self.validate()
    }

    /// Seconds per tick.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.server.tick_rate as f32
    }
}

/// Command-line arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `--config <PATH>`
    pub config: Option<PathBuf>,
    /// `--port <PORT>`
    pub port: Option<u16>,
    /// `--tick-rate <HZ>`
    pub tick_rate: Option<u32>,
    /// `--duration <SECS>`: stop after this long.
    pub duration_secs: Option<u64>,
    /// `--help`
    pub help: bool,
}

impl CliArgs {
    /// Usage text for `--help`.
    pub const USAGE: &'static str = "\
Usage: trench_server [OPTIONS]

Options:
  -c, --config <PATH>      TOML configuration file
  -p, --port <PORT>        UDP port to bind (overrides the config)
  -t, --tick-rate <HZ>     Simulation rate (overrides the config)
  -d, --duration <SECS>    Run for N seconds then exit
  -h, --help               Show this help";

    /// Parses arguments, program name excluded. Unknown flags are ignored.
    ///
    /// # Errors
    ///
    /// Fails if a flag is missing its value or the value does not parse.
    pub fn parse<I>(args: I) -> ServerResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => parsed.config = Some(PathBuf::from(value(&arg, args.next())?)),
                "--port" | "-p" => parsed.port = Some(number(&arg, args.next())?),
                "--tick-rate" | "-t" => parsed.tick_rate = Some(number(&arg, args.next())?),
                "--duration" | "-d" => parsed.duration_secs = Some(number(&arg, args.next())?),
                "--help" | "-h" => parsed.help = true,
                _ => {}
            }
        }
        Ok(parsed)
    }
}

fn value(flag: &str, value: Option<String>) -> ServerResult<String> {
    value.ok_or_else(|| ServerError::InvalidArgument(format!("{flag} needs a value")))
}

fn number<T: std::str::FromStr>(flag: &str, raw: Option<String>) -> ServerResult<T> {
    let raw = value(flag, raw)?;
    raw.parse()
        .map_err(|_| ServerError::InvalidArgument(format!("{flag}: {raw:?} is not a valid number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.server.tick_rate, 60);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            [server]
            bind_address = "127.0.0.1:4000"
            max_players = 8

            [gameplay]
            team1_spawn = { x = 1.0, y = 2.0, z = 3.0 }
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address.port(), 4000);
        assert_eq!(config.server.max_players, 8);
        assert_eq!(config.server.tick_rate, 60);
        assert_eq!(config.gameplay.team1_spawn, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.map, MapConfig::default());
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let sample = include_str!("../../../config/server.toml");
        assert_eq!(ServerConfig::from_toml(sample).unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_out_of_range_rejected() {
        for bad in [
            "[server]\ntick_rate = 0",
            "[server]\ntick_rate = 241",
            "[server]\nmax_players = 0",
            "[server]\nmax_players = 33",
            "[map]\nwidth = 0",
            "[map]\nwidth = 65536\nlength = 65536\ndepth = 1",
            "[map]\nwidth = 4096\nlength = 4096\ndepth = 64",
        ] {
            assert!(
                matches!(ServerConfig::from_toml(bad), Err(ServerError::InvalidConfig(_))),
                "{bad} should be rejected"
            );
        }
        assert!(ServerConfig::from_toml("[server]\ntick_rate = 240").is_ok());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            ServerConfig::from_toml("[server]\ntick_rate = \"fast\""),
            Err(ServerError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_cli_parse() {
        let parsed = CliArgs::parse(args(&[
            "--config", "a.toml", "-p", "5000", "--tick-rate", "30", "--verbose",
        ]))
        .unwrap();

        assert_eq!(parsed.config, Some(PathBuf::from("a.toml")));
        assert_eq!(parsed.port, Some(5000));
        assert_eq!(parsed.tick_rate, Some(30));
        assert!(!parsed.help);
    }

    #[test]
    fn test_cli_errors() {
        assert!(matches!(
            CliArgs::parse(args(&["--port"])),
            Err(ServerError::InvalidArgument(_))
        ));
        assert!(matches!(
            CliArgs::parse(args(&["--port", "99999"])),
            Err(ServerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = ServerConfig::default();
        let overrides = CliArgs {
            port: Some(7000),
            tick_rate: Some(120),
            ..CliArgs::default()
        };
        config.apply(&overrides).unwrap();
        assert_eq!(config.server.bind_address.port(), 7000);
        assert_eq!(config.server.tick_rate, 120);

        let too_fast = CliArgs {
            tick_rate: Some(1000),
            ..CliArgs::default()
        };
        assert!(config.apply(&too_fast).is_err());
    }
}

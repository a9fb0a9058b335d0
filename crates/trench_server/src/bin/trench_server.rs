//! # TRENCH Server
//!
//! ```bash
//! trench_server --config server.toml --port 32887 --duration 60
//! ```
//!
//! Without `--config`, `server.toml` in the working directory is used when
//! present, built-in defaults otherwise. `RUST_LOG` overrides the configured
//! log level.

use std::path::PathBuf;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use trench_server::{CliArgs, ServerConfig, ServerResult};

const DEFAULT_CONFIG: &str = "server.toml";

fn main() -> ServerResult<()> {
    let args = CliArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", CliArgs::USAGE);
        return Ok(());
    }

    let path = args.config.clone().or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG);
        default.exists().then_some(default)
    });
    let mut config = match &path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    config.apply(&args)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(path) = &path {
        tracing::info!(path = %path.display(), "config loaded");
    }
    trench_server::run(config, args.duration_secs.map(Duration::from_secs))
}

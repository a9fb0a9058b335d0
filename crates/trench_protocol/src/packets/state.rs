//! Game state sync.
//!
//! [`StateData`] carries a mode byte and a mode-specific nested state. The
//! nested states are [`Loader`]s too, but they are never routed: their id is
//! the mode byte, resolved through [`StateData::MODES`].

use trench_core::Vec3;

use super::Loader;
use crate::error::{ProtocolError, ProtocolResult};
use crate::stream::{ByteReader, ByteWriter};

/// An unpacked color triplet, as carried by [`StateData`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Creates a color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs into `0xRRGGBB`.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn packed(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Unpacks from `0xRRGGBB`, ignoring the top byte.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_packed(color: u32) -> Self {
        Self {
            r: (color >> 16) as u8,
            g: (color >> 8) as u8,
            b: color as u8,
        }
    }
}

/// Where a team's intel is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IntelState {
    /// Held by a player.
    Carried {
        /// The carrying player.
        carrier: u8,
    },
    /// Lying on the ground.
    Dropped {
        /// Where it lies.
        position: Vec3,
    },
}

impl Default for IntelState {
    fn default() -> Self {
        Self::Dropped {
            position: Vec3::ZERO,
        }
    }
}

impl IntelState {
    /// Wire size of either shape.
    const SIZE: usize = 12;

    const fn is_carried(&self) -> bool {
        matches!(self, Self::Carried { .. })
    }

    fn read(reader: &mut ByteReader<'_>, carried: bool) -> ProtocolResult<Self> {
        if carried {
            let carrier = reader.read_u8()?;
            reader.skip(Self::SIZE - 1)?;
            Ok(Self::Carried { carrier })
        } else {
            Ok(Self::Dropped {
                position: reader.read_vec3()?,
            })
        }
    }

    fn write(&self, writer: &mut ByteWriter) {
        match *self {
            Self::Carried { carrier } => {
                writer.write_u8(carrier);
                writer.pad(Self::SIZE - 1);
            }
            Self::Dropped { position } => writer.write_vec3(position),
        }
    }
}

/// Capture-the-flag state, nested in [`StateData`] under mode 0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CtfState {
    /// Team 1 captures.
    pub team1_score: u8,
    /// Team 2 captures.
    pub team2_score: u8,
    /// Captures needed to win.
    pub cap_limit: u8,
    /// Team 1 intel.
    pub team1_intel: IntelState,
    /// Team 2 intel.
    pub team2_intel: IntelState,
    /// Team 1 base position.
    pub team1_base: Vec3,
    /// Team 2 base position.
    pub team2_base: Vec3,
}

impl CtfState {
    /// Intel flag: team 1 intel carried.
    pub const TEAM1_CARRIED: u8 = 1 << 0;
    /// Intel flag: team 2 intel carried.
    pub const TEAM2_CARRIED: u8 = 1 << 1;

    fn intel_flags(&self) -> u8 {
        let mut flags = 0;
        if self.team1_intel.is_carried() {
            flags |= Self::TEAM1_CARRIED;
        }
        if self.team2_intel.is_carried() {
            flags |= Self::TEAM2_CARRIED;
        }
        flags
    }
}

impl Loader for CtfState {
    const ID: u8 = 0;
    const NAME: &'static str = "ctf_state";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let team1_score = reader.read_u8()?;
        let team2_score = reader.read_u8()?;
        let cap_limit = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let team1_intel = IntelState::read(reader, flags & Self::TEAM1_CARRIED != 0)?;
        let team2_intel = IntelState::read(reader, flags & Self::TEAM2_CARRIED != 0)?;
        let team1_base = reader.read_vec3()?;
        let team2_base = reader.read_vec3()?;
        Ok(Self {
            team1_score,
            team2_score,
            cap_limit,
            team1_intel,
            team2_intel,
            team1_base,
            team2_base,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.team1_score);
        writer.write_u8(self.team2_score);
        writer.write_u8(self.cap_limit);
        writer.write_u8(self.intel_flags());
        self.team1_intel.write(writer);
        self.team2_intel.write(writer);
        writer.write_vec3(self.team1_base);
        writer.write_vec3(self.team2_base);
        Ok(())
    }
}

/// Mode-specific state carried by [`StateData`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ModeState {
    /// Capture the flag.
    Ctf(CtfState),
}

impl ModeState {
    /// The mode byte, which is the nested state's own id.
    #[must_use]
    pub const fn mode(&self) -> u8 {
        match self {
            Self::Ctf(_) => CtfState::ID,
        }
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        match self {
            Self::Ctf(state) => state.write(writer),
        }
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::Ctf(CtfState::default())
    }
}

/// One entry of the state mode table.
#[derive(Clone, Copy)]
pub struct ModeRoute {
    /// Mode byte.
    pub mode: u8,
    /// Name, for logs.
    pub name: &'static str,
    /// Decoder for the nested state.
    pub read: fn(&mut ByteReader<'_>) -> ProtocolResult<ModeState>,
}

impl std::fmt::Debug for ModeRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeRoute")
            .field("mode", &self.mode)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn read_ctf(reader: &mut ByteReader<'_>) -> ProtocolResult<ModeState> {
    CtfState::read(reader).map(ModeState::Ctf)
}

/// Initial game state for a joining client - Server -> Client.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StateData {
    /// The joining player's id.
    pub player_id: u8,
    /// Fog color.
    pub fog_color: Rgb,
    /// Mode-specific state.
    pub state: ModeState,
}

impl StateData {
    /// Mode table: one entry per game mode.
    pub const MODES: &'static [ModeRoute] = &[ModeRoute {
        mode: CtfState::ID,
        name: CtfState::NAME,
        read: read_ctf,
    }];

    fn route(mode: u8) -> ProtocolResult<&'static ModeRoute> {
        Self::MODES
            .iter()
            .find(|route| route.mode == mode)
            .ok_or(ProtocolError::UnknownStateMode(mode))
    }
}

impl Loader for StateData {
    const ID: u8 = 12;
    const NAME: &'static str = "state_data";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let fog_color = Rgb::new(reader.read_u8()?, reader.read_u8()?, reader.read_u8()?);
        let mode = reader.read_u8()?;
        let state = (Self::route(mode)?.read)(reader)?;
        Ok(Self {
            player_id,
            fog_color,
            state,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_u8(self.fog_color.r);
        writer.write_u8(self.fog_color.g);
        writer.write_u8(self.fog_color.b);
        writer.write_u8(self.state.mode());
        self.state.write(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StateData {
        StateData {
            player_id: 5,
            fog_color: Rgb::new(128, 232, 255),
            state: ModeState::Ctf(CtfState {
                team1_score: 1,
                team2_score: 2,
                cap_limit: 10,
                team1_intel: IntelState::Carried { carrier: 7 },
                team2_intel: IntelState::Dropped {
                    position: Vec3::new(10.0, 20.0, 30.0),
                },
                team1_base: Vec3::new(1.0, 2.0, 3.0),
                team2_base: Vec3::new(4.0, 5.0, 6.0),
            }),
        }
    }

    #[test]
    fn test_ctf_roundtrip() {
        let packet = sample();
        let bytes = packet.to_bytes().unwrap();
        // id + player + rgb + mode + 4 header + 12 + 12 + 12 + 12
        assert_eq!(bytes.len(), 1 + 1 + 3 + 1 + 4 + 48);
        let decoded = StateData::read(&mut ByteReader::new(&bytes[1..])).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_carried_intel_is_padded_with_zeros() {
        let bytes = sample().to_bytes().unwrap();
        // intel flags byte follows the three score bytes
        assert_eq!(bytes[9], CtfState::TEAM1_CARRIED);
        assert_eq!(bytes[10], 7);
        assert!(bytes[11..22].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_padding_is_not_validated() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[11..22].fill(0xAA);
        let decoded = StateData::read(&mut ByteReader::new(&bytes[1..])).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_unknown_mode() {
        let bytes = [0, 1, 2, 3, 9];
        assert_eq!(
            StateData::read(&mut ByteReader::new(&bytes)),
            Err(ProtocolError::UnknownStateMode(9))
        );
    }

    #[test]
    fn test_mode_byte_is_nested_id() {
        assert_eq!(sample().state.mode(), CtfState::ID);
        assert!(StateData::MODES.iter().any(|m| m.mode == CtfState::ID));
    }

    #[test]
    fn test_rgb_packing() {
        let rgb = Rgb::from_packed(0x12_3456);
        assert_eq!(rgb, Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(rgb.packed(), 0x12_3456);
    }
}

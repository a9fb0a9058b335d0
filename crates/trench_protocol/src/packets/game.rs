//! World events: blocks, kills, chat, intel and fog.

use trench_core::VoxelCoord;

use super::Loader;
use crate::error::ProtocolResult;
use crate::stream::{ByteReader, ByteWriter, Endian};
use crate::text::Cp437;

/// Object relocation - Server -> Client.
///
/// Position comes first on the wire, ahead of the object type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveObject {
    /// Target voxel.
    pub position: VoxelCoord,
    /// What is being moved (intel, base).
    pub object_type: u8,
}

impl Loader for MoveObject {
    const ID: u8 = 9;
    const NAME: &'static str = "move_object";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let position = reader.read_coord()?;
        let object_type = reader.read_u8()?;
        Ok(Self {
            position,
            object_type,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_coord(self.position);
        writer.write_u8(self.object_type);
        Ok(())
    }
}

/// Block edit - both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockAction {
    /// Player editing.
    pub player_id: u8,
    /// Target voxel.
    pub position: VoxelCoord,
    /// Edit kind.
    pub value: u8,
}

impl BlockAction {
    /// Action: Build a block.
    pub const BUILD: u8 = 0;
    /// Action: Destroy a block with the spade.
    pub const DESTROY: u8 = 1;
    /// Action: Destroy a block column with the spade's secondary.
    pub const SPADE_SECONDARY: u8 = 2;
    /// Action: Grenade blast.
    pub const GRENADE: u8 = 3;
}

impl Loader for BlockAction {
    const ID: u8 = 11;
    const NAME: &'static str = "block_action";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let position = reader.read_coord()?;
        let value = reader.read_u8()?;
        Ok(Self {
            player_id,
            position,
            value,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_coord(self.position);
        writer.write_u8(self.value);
        Ok(())
    }
}

/// Kill notification - Server -> Client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KillAction {
    /// Victim.
    pub player_id: u8,
    /// Killer (the victim itself for falls and suicides).
    pub killer_id: u8,
    /// Cause of death.
    pub kill_type: u8,
}

impl KillAction {
    /// Cause: Weapon, body shot.
    pub const WEAPON: u8 = 0;
    /// Cause: Weapon, head shot.
    pub const HEADSHOT: u8 = 1;
    /// Cause: Melee.
    pub const MELEE: u8 = 2;
    /// Cause: Grenade.
    pub const GRENADE: u8 = 3;
    /// Cause: Fall.
    pub const FALL: u8 = 4;
    /// Cause: Team change.
    pub const TEAM_CHANGE: u8 = 5;
    /// Cause: Weapon change.
    pub const CLASS_CHANGE: u8 = 6;
}

impl Loader for KillAction {
    const ID: u8 = 13;
    const NAME: &'static str = "kill_action";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: reader.read_u8()?,
            killer_id: reader.read_u8()?,
            kill_type: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_u8(self.killer_id);
        writer.write_u8(self.kill_type);
        Ok(())
    }
}

/// Chat line - both directions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatMessage {
    /// Speaker.
    pub player_id: u8,
    /// Channel.
    pub chat_type: u8,
    /// Message text.
    pub value: String,
}

impl ChatMessage {
    /// Channel: Everyone.
    pub const ALL: u8 = 0;
    /// Channel: Own team.
    pub const TEAM: u8 = 1;
    /// Channel: Server notice.
    pub const SYSTEM: u8 = 2;
}

impl Loader for ChatMessage {
    const ID: u8 = 14;
    const NAME: &'static str = "chat_message";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: reader.read_u8()?,
            chat_type: reader.read_u8()?,
            value: reader.read_text(&Cp437)?,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_u8(self.chat_type);
        writer.write_text(&self.value, &Cp437)
    }
}

/// Intel captured - Server -> Client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntelCapture {
    /// Capturing player.
    pub player_id: u8,
    /// True if this capture wins the round.
    pub winning: bool,
}

impl Loader for IntelCapture {
    const ID: u8 = 18;
    const NAME: &'static str = "intel_capture";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let winning = reader.read_bool()?;
        Ok(Self { player_id, winning })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_bool(self.winning);
        Ok(())
    }
}

/// Intel picked up - Server -> Client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntelPickup {
    /// New carrier.
    pub player_id: u8,
}

impl Loader for IntelPickup {
    const ID: u8 = 19;
    const NAME: &'static str = "intel_pickup";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        Ok(())
    }
}

/// Intel dropped - Server -> Client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntelDrop {
    /// Former carrier.
    pub player_id: u8,
    /// Where it landed.
    pub position: VoxelCoord,
}

impl Loader for IntelDrop {
    const ID: u8 = 20;
    const NAME: &'static str = "intel_drop";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let position = reader.read_coord()?;
        Ok(Self {
            player_id,
            position,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_coord(self.position);
        Ok(())
    }
}

/// Fog color change - Server -> Client.
///
/// The wire value is the packed color shifted right by five bits, so the low
/// five bits of `color` never survive a round trip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FogColor {
    /// Packed color, `0xRRGGBB`.
    pub color: u32,
}

impl FogColor {
    const SHIFT: u32 = 5;
}

impl Loader for FogColor {
    const ID: u8 = 22;
    const NAME: &'static str = "fog_color";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let raw = reader.read_u32(Endian::Little)?;
        Ok(Self {
            color: raw << Self::SHIFT,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u32(self.color >> Self::SHIFT, Endian::Little);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fog_color_loses_low_bits() {
        let packet = FogColor { color: 0x00FF_FFFF };
        let bytes = packet.to_bytes().unwrap();
        let decoded = FogColor::read(&mut ByteReader::new(&bytes[1..])).unwrap();
        assert_eq!(decoded.color, 0x00FF_FFE0);
        assert_eq!(&bytes[1..], &(0x00FF_FFFFu32 >> 5).to_le_bytes());
    }

    #[test]
    fn test_move_object_position_first() {
        let packet = MoveObject {
            position: [1, 0, 0],
            object_type: 7,
        };
        assert_eq!(
            packet.to_bytes().unwrap(),
            vec![9, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 7]
        );
    }

    #[test]
    fn test_boolean_decodes_nonzero() {
        let decoded = IntelCapture::read(&mut ByteReader::new(&[2, 0x7F])).unwrap();
        assert!(decoded.winning);
        assert_eq!(
            IntelCapture {
                player_id: 2,
                winning: true
            }
            .to_bytes()
            .unwrap(),
            vec![18, 2, 1]
        );
    }

    #[test]
    fn test_chat_truncated_text() {
        // Length prefix says 5 bytes, only 2 follow.
        let result = ChatMessage::read(&mut ByteReader::new(&[0, 0, 5, b'h', b'i']));
        assert!(result.is_err());
    }
}

//! Join, leave and map transfer packets.

use trench_core::VoxelCoord;

use super::Loader;
use crate::error::ProtocolResult;
use crate::stream::{ByteReader, ByteWriter, Endian};
use crate::text::Cp437;

/// Full player description - both directions.
///
/// Sent by a client to join, and by the server to describe players already
/// in the game.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExistingPlayer {
    /// Player id.
    pub player_id: u8,
    /// Team (`-1` is spectator).
    pub team: i8,
    /// Weapon.
    pub weapon: u8,
    /// Held tool.
    pub tool: u8,
    /// Kill count.
    pub kills: u32,
    /// Block color, `0xRRGGBB`.
    pub color: u32,
    /// Display name.
    pub name: String,
}

impl Loader for ExistingPlayer {
    const ID: u8 = 8;
    const NAME: &'static str = "existing_player";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: reader.read_u8()?,
            team: reader.read_i8()?,
            weapon: reader.read_u8()?,
            tool: reader.read_u8()?,
            kills: reader.read_u32(Endian::Little)?,
            color: reader.read_u32(Endian::Little)?,
            name: reader.read_text(&Cp437)?,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_i8(self.team);
        writer.write_u8(self.weapon);
        writer.write_u8(self.tool);
        writer.write_u32(self.kills, Endian::Little);
        writer.write_u32(self.color, Endian::Little);
        writer.write_text(&self.name, &Cp437)
    }
}

/// Player spawn - Server -> Client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreatePlayer {
    /// Player id.
    pub player_id: u8,
    /// Team.
    pub team: i8,
    /// Spawn voxel.
    pub position: VoxelCoord,
    /// Weapon.
    pub weapon: u8,
    /// Display name.
    pub name: String,
}

impl Loader for CreatePlayer {
    const ID: u8 = 10;
    const NAME: &'static str = "create_player";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: reader.read_u8()?,
            team: reader.read_i8()?,
            position: reader.read_coord()?,
            weapon: reader.read_u8()?,
            name: reader.read_text(&Cp437)?,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_i8(self.team);
        writer.write_coord(self.position);
        writer.write_u8(self.weapon);
        writer.write_text(&self.name, &Cp437)
    }
}

/// Map transfer header - Server -> Client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapStart {
    /// Total size of the map data that follows, in bytes.
    pub size: u32,
}

impl Loader for MapStart {
    const ID: u8 = 15;
    const NAME: &'static str = "map_start";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            size: reader.read_u32(Endian::Little)?,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u32(self.size, Endian::Little);
        Ok(())
    }
}

/// A slice of opaque map data - Server -> Client.
///
/// The body is everything after the id byte.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapChunk {
    /// Raw map bytes.
    pub data: Vec<u8>,
}

impl Loader for MapChunk {
    const ID: u8 = 16;
    const NAME: &'static str = "map_chunk";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            data: reader.read_rest().to_vec(),
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_bytes(&self.data);
        Ok(())
    }
}

/// Player disconnect - Server -> Client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerLeft {
    /// Player that left.
    pub player_id: u8,
}

impl Loader for PlayerLeft {
    const ID: u8 = 17;
    const NAME: &'static str = "player_left";

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;

    #[test]
    fn test_existing_player_layout() {
        let packet = ExistingPlayer {
            player_id: 1,
            team: -1,
            weapon: 2,
            tool: 3,
            kills: 0x0102_0304,
            color: 0x00AB_CDEF,
            name: "Ö".to_string(),
        };
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(
            bytes,
            vec![8, 1, 0xFF, 2, 3, 4, 3, 2, 1, 0xEF, 0xCD, 0xAB, 0, 1, 0x99]
        );
    }

    #[test]
    fn test_unencodable_name_fails() {
        let packet = CreatePlayer {
            name: "名前".to_string(),
            ..CreatePlayer::default()
        };
        assert_eq!(packet.to_bytes(), Err(ProtocolError::Unencodable('名')));
    }

    #[test]
    fn test_map_chunk_takes_rest() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        let chunk = MapChunk::read(&mut reader).unwrap();
        assert_eq!(chunk.data, vec![1, 2, 3]);
        assert_eq!(reader.remaining(), 0);

        let empty = MapChunk::read(&mut ByteReader::new(&[])).unwrap();
        assert!(empty.data.is_empty());
    }

    #[test]
    fn test_create_player_negative_coords() {
        let packet = CreatePlayer {
            player_id: 4,
            team: 1,
            position: [-1, 256, 63],
            weapon: 0,
            name: "x".to_string(),
        };
        let bytes = packet.to_bytes().unwrap();
        let decoded = CreatePlayer::read(&mut ByteReader::new(&bytes[1..])).unwrap();
        assert_eq!(decoded, packet);
    }
}

//! Per-player state packets: movement, input, combat and loadout.

use trench_core::Vec3;

use super::Loader;
use crate::error::ProtocolResult;
use crate::stream::{ByteReader, ByteWriter, Endian};

/// Player position - both directions.
///
/// Size: 13 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionData {
    /// Player this position belongs to.
    pub player_id: u8,
    /// Eye position (world units).
    pub position: Vec3,
}

impl Loader for PositionData {
    const ID: u8 = 0;
    const NAME: &'static str = "position_data";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let position = reader.read_vec3()?;
        Ok(Self { player_id, position })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_vec3(self.position);
        Ok(())
    }
}

/// Client-side alias of [`PositionData`] for the local player.
///
/// Shares id 0 but is never routed: a client fills in its own player id
/// with [`LocalPositionData::with_player`] before sending.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalPositionData {
    /// Eye position (world units).
    pub position: Vec3,
}

impl LocalPositionData {
    /// Converts to the routable packet.
    #[must_use]
    pub const fn with_player(self, player_id: u8) -> PositionData {
        PositionData {
            player_id,
            position: self.position,
        }
    }
}

impl Loader for LocalPositionData {
    const ID: u8 = 0;
    const NAME: &'static str = "local_position_data";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            position: reader.read_vec3()?,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_vec3(self.position);
        Ok(())
    }
}

/// Player aim direction - both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrientationData {
    /// Player this orientation belongs to.
    pub player_id: u8,
    /// Aim direction (not necessarily normalized on the wire).
    pub orientation: Vec3,
}

impl Loader for OrientationData {
    const ID: u8 = 1;
    const NAME: &'static str = "orientation_data";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let orientation = reader.read_vec3()?;
        Ok(Self {
            player_id,
            orientation,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_vec3(self.orientation);
        Ok(())
    }
}

/// The eight input booleans carried by [`InputData`], one bit each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct InputFlags {
    /// Move forward.
    pub up: bool,
    /// Move backward.
    pub down: bool,
    /// Strafe left.
    pub left: bool,
    /// Strafe right.
    pub right: bool,
    /// Primary fire.
    pub fire: bool,
    /// Jump.
    pub jump: bool,
    /// Crouch.
    pub crouch: bool,
    /// Aim down sights.
    pub aim: bool,
}

impl InputFlags {
    /// Input flag: Forward.
    pub const UP: u8 = 1 << 0;
    /// Input flag: Backward.
    pub const DOWN: u8 = 1 << 1;
    /// Input flag: Strafe left.
    pub const LEFT: u8 = 1 << 2;
    /// Input flag: Strafe right.
    pub const RIGHT: u8 = 1 << 3;
    /// Input flag: Primary fire.
    pub const FIRE: u8 = 1 << 4;
    /// Input flag: Jump.
    pub const JUMP: u8 = 1 << 5;
    /// Input flag: Crouch.
    pub const CROUCH: u8 = 1 << 6;
    /// Input flag: Aim.
    pub const AIM: u8 = 1 << 7;

    /// Unpacks a flag byte.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            up: bits & Self::UP != 0,
            down: bits & Self::DOWN != 0,
            left: bits & Self::LEFT != 0,
            right: bits & Self::RIGHT != 0,
            fire: bits & Self::FIRE != 0,
            jump: bits & Self::JUMP != 0,
            crouch: bits & Self::CROUCH != 0,
            aim: bits & Self::AIM != 0,
        }
    }

    /// Packs into a flag byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        let mut bits = 0;
        if self.up {
            bits |= Self::UP;
        }
        if self.down {
            bits |= Self::DOWN;
        }
        if self.left {
            bits |= Self::LEFT;
        }
        if self.right {
            bits |= Self::RIGHT;
        }
        if self.fire {
            bits |= Self::FIRE;
        }
        if self.jump {
            bits |= Self::JUMP;
        }
        if self.crouch {
            bits |= Self::CROUCH;
        }
        if self.aim {
            bits |= Self::AIM;
        }
        bits
    }
}

/// Player input state - both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputData {
    /// Player the input belongs to.
    pub player_id: u8,
    /// Packed input booleans.
    pub flags: InputFlags,
}

impl Loader for InputData {
    const ID: u8 = 2;
    const NAME: &'static str = "input_data";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let flags = InputFlags::from_bits(reader.read_u8()?);
        Ok(Self { player_id, flags })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_u8(self.flags.bits());
        Ok(())
    }
}

/// Hit report - Client -> Server.
///
/// Client claims "I hit this player here". The server validates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HitPacket {
    /// Player that was hit.
    pub player_id: u8,
    /// Body part tag.
    pub value: u8,
}

impl HitPacket {
    /// Body part: Torso.
    pub const TORSO: u8 = 0;
    /// Body part: Head.
    pub const HEAD: u8 = 1;
    /// Body part: Arms.
    pub const ARMS: u8 = 2;
    /// Body part: Legs.
    pub const LEGS: u8 = 3;
    /// Body part: Melee (spade).
    pub const MELEE: u8 = 4;
}

impl Loader for HitPacket {
    const ID: u8 = 4;
    const NAME: &'static str = "hit_packet";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let value = reader.read_u8()?;
        Ok(Self { player_id, value })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_u8(self.value);
        Ok(())
    }
}

/// Health update - Server -> Client.
///
/// Shares id 4 with [`HitPacket`], which only travels the other way.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SetHp {
    /// Remaining health.
    pub hp: u8,
    /// True if the damage came from falling.
    pub fall: bool,
    /// Where the damage came from, for the client's hit indicator.
    pub source: Vec3,
}

impl Loader for SetHp {
    const ID: u8 = 4;
    const NAME: &'static str = "set_hp";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let hp = reader.read_u8()?;
        let fall = reader.read_bool()?;
        let source = reader.read_vec3()?;
        Ok(Self { hp, fall, source })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.hp);
        writer.write_bool(self.fall);
        writer.write_vec3(self.source);
        Ok(())
    }
}

/// Grenade throw - both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrenadePacket {
    /// Thrower.
    pub player_id: u8,
    /// Seconds until detonation.
    pub fuse: f32,
    /// Release position.
    pub position: Vec3,
    /// Release velocity.
    pub velocity: Vec3,
}

impl Loader for GrenadePacket {
    const ID: u8 = 5;
    const NAME: &'static str = "grenade_packet";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let fuse = reader.read_f32(Endian::Little)?;
        let position = reader.read_vec3()?;
        let velocity = reader.read_vec3()?;
        Ok(Self {
            player_id,
            fuse,
            position,
            velocity,
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_f32(self.fuse, Endian::Little);
        writer.write_vec3(self.position);
        writer.write_vec3(self.velocity);
        Ok(())
    }
}

/// Tool selection - both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetTool {
    /// Player switching tools.
    pub player_id: u8,
    /// Selected tool.
    pub tool: u8,
}

impl SetTool {
    /// Tool: Spade.
    pub const SPADE: u8 = 0;
    /// Tool: Block.
    pub const BLOCK: u8 = 1;
    /// Tool: Weapon.
    pub const WEAPON: u8 = 2;
    /// Tool: Grenade.
    pub const GRENADE: u8 = 3;
}

impl Loader for SetTool {
    const ID: u8 = 6;
    const NAME: &'static str = "set_tool";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let tool = reader.read_u8()?;
        Ok(Self { player_id, tool })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_u8(self.tool);
        Ok(())
    }
}

/// Block color selection - both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetColor {
    /// Player picking the color.
    pub player_id: u8,
    /// Packed color, `0xRRGGBB`.
    pub color: u32,
}

impl Loader for SetColor {
    const ID: u8 = 7;
    const NAME: &'static str = "set_color";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let color = reader.read_u32(Endian::Little)?;
        Ok(Self { player_id, color })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_u32(self.color, Endian::Little);
        Ok(())
    }
}

/// Ammo refill - Server -> Client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Restock {
    /// Player being restocked.
    pub player_id: u8,
}

impl Loader for Restock {
    const ID: u8 = 21;
    const NAME: &'static str = "restock";

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

/// Weapon reload - both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeaponReload {
    /// Player reloading.
    pub player_id: u8,
}

impl Loader for WeaponReload {
    const ID: u8 = 23;
    const NAME: &'static str = "weapon_reload";

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

/// Team change - both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeTeam {
    /// Player changing team.
    pub player_id: u8,
    /// New team (`-1` is spectator).
    pub team: i8,
}

impl Loader for ChangeTeam {
    const ID: u8 = 24;
    const NAME: &'static str = "change_team";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let team = reader.read_i8()?;
        Ok(Self { player_id, team })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_i8(self.team);
        Ok(())
    }
}

/// Weapon change - both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeWeapon {
    /// Player changing weapon.
    pub player_id: u8,
    /// New weapon.
    pub weapon: u8,
}

impl Loader for ChangeWeapon {
    const ID: u8 = 25;
    const NAME: &'static str = "change_weapon";

    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self> {
        let player_id = reader.read_u8()?;
        let weapon = reader.read_u8()?;
        Ok(Self { player_id, weapon })
    }

    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(self.player_id);
        writer.write_u8(self.weapon);
        Ok(())
    }
}

//! # Player Table
//!
//! Fixed slots indexed by the one-byte player id. The lowest free id goes to
//! the next joiner.

use std::net::SocketAddr;

use trench_core::Vec3;
use trench_protocol::{CreatePlayer, ExistingPlayer};
use trench_world::ObjectId;

/// Team byte of spectators.
pub const SPECTATOR: i8 = -1;

/// Full health.
pub const MAX_HP: u8 = 100;

/// A joined player.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// Slot id, as sent on the wire.
    pub id: u8,
    /// Where the player's datagrams come from.
    pub addr: SocketAddr,
    /// Display name.
    pub name: String,
    /// Team (`-1`, `0` or `1`).
    pub team: i8,
    /// Weapon.
    pub weapon: u8,
    /// Held tool.
    pub tool: u8,
    /// Block colour, `0xRRGGBB`.
    pub color: u32,
    /// Kill count.
    pub kills: u32,
    /// Hit points.
    pub hp: u8,
    /// The player's body in the world.
    pub character: ObjectId,
    /// Tick of the last datagram from this player.
    pub last_seen: u64,
    /// Tick at which a dead player comes back.
    pub respawn_at: Option<u64>,
}

impl Player {
    /// Returns true unless dead and waiting to respawn.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.respawn_at.is_none()
    }

    /// Description sent to players who join later.
    #[must_use]
    pub fn existing(&self) -> ExistingPlayer {
        ExistingPlayer {
            player_id: self.id,
            team: self.team,
            weapon: self.weapon,
            tool: self.tool,
            kills: self.kills,
            color: self.color,
            name: self.name.clone(),
        }
    }

    /// Spawn announcement at `position`.
    #[must_use]
    pub fn create(&self, position: Vec3) -> CreatePlayer {
        CreatePlayer {
            player_id: self.id,
            team: self.team,
            position: position.voxel(),
            weapon: self.weapon,
            name: self.name.clone(),
        }
    }
}

/// Player slots.
#[derive(Clone, Debug)]
pub struct PlayerTable {
    slots: Vec<Option<Player>>,
}

impl PlayerTable {
    /// Creates `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of joined players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Returns true if nobody has joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lowest free id.
    #[must_use]
    pub fn free_id(&self) -> Option<u8> {
        self.slots
            .iter()
            .position(Option::is_none)
            .and_then(|i| u8::try_from(i).ok())
    }

    /// Fills the player's slot.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range or taken.
    pub fn insert(&mut self, player: Player) {
        let slot = &mut self.slots[usize::from(player.id)];
        assert!(slot.is_none(), "player slot {} is taken", player.id);
        *slot = Some(player);
    }

    /// Empties a slot.
    pub fn remove(&mut self, id: u8) -> Option<Player> {
        self.slots.get_mut(usize::from(id)).and_then(Option::take)
    }

    /// Looks up a player.
    #[must_use]
    pub fn get(&self, id: u8) -> Option<&Player> {
        self.slots.get(usize::from(id)).and_then(Option::as_ref)
    }

    /// Looks up a player mutably.
    pub fn get_mut(&mut self, id: u8) -> Option<&mut Player> {
        self.slots.get_mut(usize::from(id)).and_then(Option::as_mut)
    }

    /// Player sending from `addr`.
    #[must_use]
    pub fn by_addr(&self, addr: SocketAddr) -> Option<u8> {
        self.iter().find(|p| p.addr == addr).map(|p| p.id)
    }

    /// Player whose body is `object`.
    #[must_use]
    pub fn by_character(&self, object: ObjectId) -> Option<u8> {
        self.iter().find(|p| p.character == object).map(|p| p.id)
    }

    /// Joined players by id.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.slots.iter().flatten()
    }

    /// Joined players by id, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.slots.iter_mut().flatten()
    }

    /// Ids of joined players.
    #[must_use]
    pub fn ids(&self) -> Vec<u8> {
        self.iter().map(|p| p.id).collect()
    }
}

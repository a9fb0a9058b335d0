//! Object identity and the closed set of object kinds.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use trench_core::Vec3;

use crate::character::{Character, FallCallback};
use crate::grenade::{DetonateCallback, Grenade};
use crate::kernel::PhysicsKernel;
use crate::world::TickContext;

/// Identifier of an object within its world.
///
/// Ids are never reused and increase with creation order, so sorting by id
/// gives update order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub(crate) u64);

impl ObjectId {
    /// Raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a world, unique within the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldId(u64);

impl WorldId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world-{}", self.0)
    }
}

/// Object kind tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A player's body.
    Character,
    /// A thrown grenade.
    Grenade,
}

/// A live world object.
pub enum Object {
    /// See [`Character`].
    Character(Character),
    /// See [`Grenade`].
    Grenade(Grenade),
}

impl Object {
    /// Kind tag.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Character(_) => ObjectKind::Character,
            Self::Grenade(_) => ObjectKind::Grenade,
        }
    }

    /// This object's id.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        match self {
            Self::Character(c) => c.id(),
            Self::Grenade(g) => g.id(),
        }
    }

    /// The world this object belongs to.
    #[must_use]
    pub const fn world(&self) -> WorldId {
        match self {
            Self::Character(c) => c.world(),
            Self::Grenade(g) => g.world(),
        }
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        match self {
            Self::Character(c) => c.position(),
            Self::Grenade(g) => g.position(),
        }
    }

    /// Returns the character, if this is one.
    #[must_use]
    pub const fn as_character(&self) -> Option<&Character> {
        match self {
            Self::Character(c) => Some(c),
            Self::Grenade(_) => None,
        }
    }

    /// Returns the character mutably, if this is one.
    pub fn as_character_mut(&mut self) -> Option<&mut Character> {
        match self {
            Self::Character(c) => Some(c),
            Self::Grenade(_) => None,
        }
    }

    /// Returns the grenade, if this is one.
    #[must_use]
    pub const fn as_grenade(&self) -> Option<&Grenade> {
        match self {
            Self::Grenade(g) => Some(g),
            Self::Character(_) => None,
        }
    }

    /// Returns the grenade mutably, if this is one.
    pub fn as_grenade_mut(&mut self) -> Option<&mut Grenade> {
        match self {
            Self::Grenade(g) => Some(g),
            Self::Character(_) => None,
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_>) {
        match self {
            Self::Character(c) => c.update(ctx),
            Self::Grenade(g) => g.update(ctx),
        }
    }

    /// Hands the physics body back to the kernel.
    pub(crate) fn release(self, kernel: &mut dyn PhysicsKernel) {
        match self {
            Self::Character(c) => kernel.release_player(c.into_body()),
            Self::Grenade(g) => kernel.release_grenade(g.into_body()),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Character(c) => fmt::Debug::fmt(c, f),
            Self::Grenade(g) => fmt::Debug::fmt(g, f),
        }
    }
}

/// Parameters for a new [`Character`].
pub struct CharacterSpawn {
    /// Eye position.
    pub position: Vec3,
    /// Aim direction.
    pub orientation: Vec3,
    /// Called with the fall magnitude after a hard landing.
    pub on_fall: Option<FallCallback>,
}

impl CharacterSpawn {
    /// A character at `position` facing east.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            orientation: Vec3::X,
            on_fall: None,
        }
    }

    /// Sets the initial aim direction.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Vec3) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the fall callback.
    #[must_use]
    pub fn on_fall(mut self, callback: impl FnMut(&mut TickContext<'_>, f32) + 'static) -> Self {
        self.on_fall = Some(Box::new(callback));
        self
    }
}

/// Parameters for a new [`Grenade`].
pub struct GrenadeSpawn {
    /// Release position.
    pub position: Vec3,
    /// Release velocity.
    pub velocity: Vec3,
    /// Thrower's aim, added to `velocity` when present.
    pub orientation: Option<Vec3>,
    /// Seconds until detonation.
    pub fuse: f32,
    /// Called once when the fuse runs out.
    pub on_detonate: Option<DetonateCallback>,
}

impl GrenadeSpawn {
    /// A grenade with no callback.
    #[must_use]
    pub const fn new(position: Vec3, velocity: Vec3, fuse: f32) -> Self {
        Self {
            position,
            velocity,
            orientation: None,
            fuse,
            on_detonate: None,
        }
    }

    /// Adds the thrower's aim to the release velocity.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Vec3) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Sets the detonation callback.
    #[must_use]
    pub fn on_detonate(
        mut self,
        callback: impl FnOnce(&Grenade, &mut TickContext<'_>) + 'static,
    ) -> Self {
        self.on_detonate = Some(Box::new(callback));
        self
    }
}

/// What to create, passed to [`crate::World::create_object`].
pub enum Spawn {
    /// A player's body.
    Character(CharacterSpawn),
    /// A thrown grenade.
    Grenade(GrenadeSpawn),
}

impl From<CharacterSpawn> for Spawn {
    fn from(spawn: CharacterSpawn) -> Self {
        Self::Character(spawn)
    }
}

impl From<GrenadeSpawn> for Spawn {
    fn from(spawn: GrenadeSpawn) -> Self {
        Self::Grenade(spawn)
    }
}

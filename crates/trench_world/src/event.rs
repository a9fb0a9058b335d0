//! Events objects raise during a tick, for the application to act on after it.

use trench_core::Vec3;

use crate::object::ObjectId;

/// Damage a blast does to one character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlastHit {
    /// The character hit.
    pub object: ObjectId,
    /// Damage before any armor or team rules.
    pub damage: f32,
}

/// Something the application should react to.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    /// A character landed hard.
    Fell {
        /// The character.
        object: ObjectId,
        /// Fall magnitude reported by the kernel.
        magnitude: f32,
    },
    /// A grenade's fuse ran out.
    Detonated {
        /// The grenade (already deleted by the time this is drained).
        grenade: ObjectId,
        /// Where it went off.
        position: Vec3,
        /// Characters in range and in sight.
        hits: Vec<BlastHit>,
    },
}

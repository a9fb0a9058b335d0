//! # TRENCH World
//!
//! Characters and grenades stepped by a pluggable physics kernel.
//!
//! ## Ownership
//!
//! - The [`World`] owns its objects, its kernel and its map
//! - Each object owns its physics body; the kernel only borrows it per call
//! - Objects reach the rest of the world only through [`TickContext`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use trench_core::{Vec3, VoxelMap};
//! use trench_world::{CharacterSpawn, KinematicKernel, World};
//!
//! let mut world = World::with_map(
//!     Box::new(KinematicKernel::default()),
//!     Box::new(VoxelMap::flat(512, 512, 64, 62)),
//! );
//! let id = world.create_object(CharacterSpawn::new(Vec3::new(256.0, 256.0, 40.0)));
//! world.update(1.0 / 60.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![deny(clippy::perf)]
#![warn(clippy::pedantic)]

pub mod character;
pub mod event;
pub mod grenade;
pub mod kernel;
pub mod kinematic;
pub mod object;
pub mod world;

pub use character::{emit_fall, BodyPart, Character, FallCallback, HitDirection, CROUCH_OFFSET};
pub use event::{BlastHit, WorldEvent};
pub use grenade::{emit_detonation, Collision, DetonateCallback, Grenade};
pub use kernel::{GrenadeBody, PhysicsKernel, PlayerBody, PlayerInputs};
pub use kinematic::{KinematicConfig, KinematicKernel};
pub use object::{CharacterSpawn, GrenadeSpawn, Object, ObjectId, ObjectKind, Spawn, WorldId};
pub use world::{ObjectSet, TickContext, World, WorldParts};

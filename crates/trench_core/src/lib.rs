//! # TRENCH Core
//!
//! Types shared by the protocol codec and the simulation.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `trench_protocol`
//! - `trench_world`
//!
//! If you need wire or simulation logic, it does not belong here.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![deny(clippy::perf)]
#![warn(clippy::pedantic)]

pub mod map;
pub mod math;

pub use map::{RaycastHit, SpatialMap, VoxelMap};
pub use math::{Vec3, VoxelCoord};

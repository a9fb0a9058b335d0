//! # TRENCH Protocol
//!
//! Bit-exact wire codec for server <-> client traffic.
//!
//! ## Wire Rules
//!
//! 1. **One id byte, then a fixed body** - no length prefix, no versioning
//! 2. **Little-endian** - unless a field says otherwise
//! 3. **Direction-scoped ids** - ids 0 and 4 decode differently per direction
//!
//! ## Example
//!
//! ```rust,ignore
//! use trench_protocol::{Direction, Loader, Packet, PacketRegistry, SetTool};
//!
//! let bytes = SetTool { player_id: 3, tool: SetTool::SPADE }.to_bytes()?;
//! let registry = PacketRegistry::for_direction(Direction::Serverbound);
//! assert!(matches!(registry.decode(&bytes)?, Packet::SetTool(_)));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![deny(clippy::perf)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod packets;
pub mod registry;
pub mod stream;
pub mod text;

pub use error::{ProtocolError, ProtocolResult};
pub use packets::*;
pub use registry::{Direction, NestedKind, PacketRegistry, Route};
pub use stream::{ByteReader, ByteWriter, Endian};
pub use text::{Cp437, TextEncoding};

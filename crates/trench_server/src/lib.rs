//! # TRENCH Server
//!
//! Authoritative match server: UDP in, [`trench_world::World`] in the middle,
//! UDP out.
//!
//! ## Trust No One
//!
//! Clients own their movement within a tolerance. Everything else they send
//! (hits, throws, block edits, team and weapon changes) is checked against
//! the server's own view before anyone else hears about it.
//!
//! ## Threads
//!
//! | Thread       | Work                                   |
//! |--------------|----------------------------------------|
//! | `trench-udp` | socket reads and writes                |
//! | main         | decode, rules, `World::update`, encode |

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![deny(clippy::perf)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod game;
pub mod player;
pub mod server;
pub mod tick;
pub mod transport;

pub use config::{CliArgs, GameplayConfig, MapConfig, NetworkConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use game::{GameServer, Target, MAP_CHUNK_SIZE};
pub use player::{Player, PlayerTable, MAX_HP, SPECTATOR};
pub use server::run;
pub use tick::{TickLoop, TickStats};
pub use transport::{Datagram, PacketSink, TransportStats, UdpTransport, MAX_DATAGRAM_SIZE};

//! # Protocol Error Types
//!
//! Everything that can go wrong while decoding or encoding a packet.
//! The codec never papers over these: the transport decides whether to drop
//! the datagram or the connection.

use thiserror::Error;

use crate::registry::Direction;

/// Errors that can occur in the protocol codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The stream ended before the packet layout was complete.
    #[error("truncated packet: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the next field required.
        needed: usize,
        /// Bytes left in the stream.
        remaining: usize,
    },

    /// No packet with this id is routable in this direction.
    #[error("unrecognized packet id {id} ({direction})")]
    UnknownPacket {
        /// The id byte that was read.
        id: u8,
        /// The traffic direction of the table that was consulted.
        direction: Direction,
    },

    /// State sync carried a mode tag with no registered sub-state.
    #[error("unrecognized state mode {0}")]
    UnknownStateMode(u8),

    /// Encoded text does not fit its one-byte length prefix.
    #[error("text too long: {0} bytes (max 255)")]
    TextTooLong(usize),

    /// Text contains a character the wire encoding cannot represent.
    #[error("character {0:?} cannot be encoded")]
    Unencodable(char),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

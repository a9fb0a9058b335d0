//! # Codec Registry
//!
//! Id-to-decoder tables, one per traffic direction.
//!
//! Ids 0 and 4 mean different things depending on who sent the datagram, so
//! there is no global table: a server decodes with
//! [`Direction::Serverbound`], a client with [`Direction::Clientbound`].

use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};
use crate::packets::{
    BlockAction, ChangeTeam, ChangeWeapon, ChatMessage, CreatePlayer, CtfState, ExistingPlayer,
    FogColor, GrenadePacket, HitPacket, InputData, IntelCapture, IntelDrop, IntelPickup,
    KillAction, Loader, LocalPositionData, MapChunk, MapStart, MoveObject, OrientationData, Packet,
    PlayerLeft, PositionData, Restock, SetColor, SetHp, SetTool, StateData, WeaponReload,
};
use crate::stream::ByteReader;

/// Traffic direction a registry decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client -> Server.
    Serverbound,
    /// Server -> Client.
    Clientbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serverbound => f.write_str("serverbound"),
            Self::Clientbound => f.write_str("clientbound"),
        }
    }
}

/// One routable packet kind.
#[derive(Clone, Copy)]
pub struct Route {
    /// Wire identifier.
    pub id: u8,
    /// Packet name.
    pub name: &'static str,
    decode: fn(&mut ByteReader<'_>) -> ProtocolResult<Packet>,
}

impl Route {
    /// Builds the route for a packet kind.
    #[must_use]
    pub const fn of<T: Loader + Into<Packet>>() -> Self {
        Self {
            id: T::ID,
            name: T::NAME,
            decode: decode_as::<T>,
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn decode_as<T: Loader + Into<Packet>>(reader: &mut ByteReader<'_>) -> ProtocolResult<Packet> {
    T::read(reader).map(Into::into)
}

/// Client -> Server routes.
const SERVERBOUND: &[Route] = &[
    Route::of::<PositionData>(),
    Route::of::<OrientationData>(),
    Route::of::<InputData>(),
    Route::of::<HitPacket>(),
    Route::of::<GrenadePacket>(),
    Route::of::<SetTool>(),
    Route::of::<SetColor>(),
    Route::of::<ExistingPlayer>(),
    Route::of::<BlockAction>(),
    Route::of::<ChatMessage>(),
    Route::of::<WeaponReload>(),
    Route::of::<ChangeTeam>(),
    Route::of::<ChangeWeapon>(),
];

/// Server -> Client routes.
const CLIENTBOUND: &[Route] = &[
    Route::of::<PositionData>(),
    Route::of::<OrientationData>(),
    Route::of::<InputData>(),
    Route::of::<SetHp>(),
    Route::of::<GrenadePacket>(),
    Route::of::<SetTool>(),
    Route::of::<SetColor>(),
    Route::of::<ExistingPlayer>(),
    Route::of::<MoveObject>(),
    Route::of::<CreatePlayer>(),
    Route::of::<BlockAction>(),
    Route::of::<StateData>(),
    Route::of::<KillAction>(),
    Route::of::<ChatMessage>(),
    Route::of::<MapStart>(),
    Route::of::<MapChunk>(),
    Route::of::<PlayerLeft>(),
    Route::of::<IntelCapture>(),
    Route::of::<IntelPickup>(),
    Route::of::<IntelDrop>(),
    Route::of::<Restock>(),
    Route::of::<FogColor>(),
    Route::of::<WeaponReload>(),
    Route::of::<ChangeTeam>(),
    Route::of::<ChangeWeapon>(),
];

/// Kinds with an id that no table dispatches on.
const NESTED_ONLY: &[NestedKind] = &[
    NestedKind {
        id: LocalPositionData::ID,
        name: LocalPositionData::NAME,
    },
    NestedKind {
        id: CtfState::ID,
        name: CtfState::NAME,
    },
];

/// A packet kind that has an id but is never dispatched by a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NestedKind {
    /// Wire identifier (or mode byte).
    pub id: u8,
    /// Packet name.
    pub name: &'static str,
}

/// Id-indexed decoder table for one direction.
#[derive(Clone)]
pub struct PacketRegistry {
    direction: Direction,
    table: [Option<Route>; 256],
}

impl PacketRegistry {
    /// Builds the table for a direction.
    ///
    /// # Panics
    ///
    /// Panics if the static route list holds the same id twice.
    #[must_use]
    pub fn for_direction(direction: Direction) -> Self {
        let routes = match direction {
            Direction::Serverbound => SERVERBOUND,
            Direction::Clientbound => CLIENTBOUND,
        };
        Self::from_routes(direction, routes)
    }

    fn from_routes(direction: Direction, routes: &[Route]) -> Self {
        let mut table = [None; 256];
        for route in routes {
            let slot = &mut table[usize::from(route.id)];
            assert!(
                slot.is_none(),
                "duplicate {direction} route for id {}: {}",
                route.id,
                route.name
            );
            *slot = Some(*route);
        }
        Self { direction, table }
    }

    /// Direction this registry decodes.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns true if `id` is routable in this direction.
    #[must_use]
    pub fn contains(&self, id: u8) -> bool {
        self.table[usize::from(id)].is_some()
    }

    /// Iterates the routes in id order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.table.iter().flatten()
    }

    /// Kinds that share an id with a routable kind but are only reachable
    /// some other way.
    #[must_use]
    pub const fn nested_only() -> &'static [NestedKind] {
        NESTED_ONLY
    }

    /// Decodes one packet: id byte, then the routed body.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Truncated`] if `bytes` is empty or the body is short
    /// - [`ProtocolError::UnknownPacket`] if the id is not routable here
    pub fn decode(&self, bytes: &[u8]) -> ProtocolResult<Packet> {
        let mut reader = ByteReader::new(bytes);
        let id = reader.read_u8()?;
        let Some(route) = self.table[usize::from(id)] else {
            tracing::trace!(id, direction = %self.direction, "unrouted packet id");
            return Err(ProtocolError::UnknownPacket {
                id,
                direction: self.direction,
            });
        };
        let packet = (route.decode)(&mut reader)?;
        if reader.remaining() > 0 {
            tracing::trace!(
                packet = route.name,
                trailing = reader.remaining(),
                "ignoring trailing bytes"
            );
        }
        Ok(packet)
    }
}

impl fmt::Debug for PacketRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketRegistry")
            .field("direction", &self.direction)
            .field("routes", &self.routes().count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_build() {
        let server = PacketRegistry::for_direction(Direction::Serverbound);
        let client = PacketRegistry::for_direction(Direction::Clientbound);
        assert_eq!(server.routes().count(), SERVERBOUND.len());
        assert_eq!(client.routes().count(), CLIENTBOUND.len());
    }

    #[test]
    fn test_id_4_depends_on_direction() {
        let server = PacketRegistry::for_direction(Direction::Serverbound);
        let client = PacketRegistry::for_direction(Direction::Clientbound);
        assert_eq!(server.routes().find(|r| r.id == 4).map(|r| r.name), Some("hit_packet"));
        assert_eq!(client.routes().find(|r| r.id == 4).map(|r| r.name), Some("set_hp"));
    }

    #[test]
    fn test_clientbound_only_ids_rejected_serverbound() {
        let server = PacketRegistry::for_direction(Direction::Serverbound);
        assert!(!server.contains(MapStart::ID));
        assert_eq!(
            server.decode(&[MapStart::ID, 0, 0, 0, 0]),
            Err(ProtocolError::UnknownPacket {
                id: MapStart::ID,
                direction: Direction::Serverbound,
            })
        );
    }

    #[test]
    fn test_empty_datagram_is_truncated() {
        let client = PacketRegistry::for_direction(Direction::Clientbound);
        assert!(matches!(
            client.decode(&[]),
            Err(ProtocolError::Truncated { needed: 1, remaining: 0 })
        ));
    }

    #[test]
    #[should_panic(expected = "duplicate serverbound route for id 4")]
    fn test_duplicate_id_panics() {
        let routes = [Route::of::<HitPacket>(), Route::of::<SetHp>()];
        let _ = PacketRegistry::from_routes(Direction::Serverbound, &routes);
    }

    #[test]
    fn test_nested_kinds_are_not_routed_separately() {
        let client = PacketRegistry::for_direction(Direction::Clientbound);
        for kind in PacketRegistry::nested_only() {
            let routed = client.routes().find(|r| r.id == kind.id);
            assert_ne!(routed.map(|r| r.name), Some(kind.name));
        }
    }
}

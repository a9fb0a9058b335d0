//! # Packet Definitions
//!
//! Every packet kind of the wire protocol.
//!
//! ## Layout
//!
//! ```text
//! ┌────────────┬─────────────────────────────────────────────┐
//! │ id (1)     │ body (fixed order, per-kind layout)         │
//! └────────────┴─────────────────────────────────────────────┘
//! ```
//!
//! A kind's [`Loader::read`] consumes the body only: the id byte has already
//! been consumed by whoever dispatched on it. [`Loader::encode`] writes the id
//! byte first, then the body.

mod game;
mod player;
mod session;
mod state;

pub use game::{
    BlockAction, ChatMessage, FogColor, IntelCapture, IntelDrop, IntelPickup, KillAction,
    MoveObject,
};
pub use player::{
    ChangeTeam, ChangeWeapon, GrenadePacket, HitPacket, InputData, InputFlags, LocalPositionData,
    OrientationData, PositionData, Restock, SetColor, SetHp, SetTool, WeaponReload,
};
pub use session::{CreatePlayer, ExistingPlayer, MapChunk, MapStart, PlayerLeft};
pub use state::{CtfState, IntelState, ModeRoute, ModeState, Rgb, StateData};

use crate::error::ProtocolResult;
use crate::stream::{ByteReader, ByteWriter};

/// A packet kind with a fixed id and a fixed body layout.
pub trait Loader: Sized {
    /// Wire identifier.
    const ID: u8;
    /// Human-readable name, for logs.
    const NAME: &'static str;

    /// Decodes the body. The id byte must already be consumed.
    ///
    /// # Errors
    ///
    /// Fails if the stream ends before the layout is complete.
    fn read(reader: &mut ByteReader<'_>) -> ProtocolResult<Self>;

    /// Encodes the body without the id byte.
    ///
    /// # Errors
    ///
    /// Fails if a text field cannot be encoded.
    fn write(&self, writer: &mut ByteWriter) -> ProtocolResult<()>;

    /// Encodes the id byte followed by the body.
    ///
    /// # Errors
    ///
    /// See [`Loader::write`]. The writer may hold a partial packet on failure.
    fn encode(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
        writer.write_u8(Self::ID);
        self.write(writer)
    }

    /// Encodes into a fresh buffer.
    ///
    /// # Errors
    ///
    /// See [`Loader::write`].
    fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        let mut writer = ByteWriter::new();
        self.encode(&mut writer)?;
        Ok(writer.into_inner())
    }
}

macro_rules! routable_packets {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// Any packet that can be dispatched by id from a registry.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Packet {
            $(
                #[doc = concat!("See [`", stringify!($ty), "`].")]
                $variant($ty),
            )+
        }

        impl Packet {
            /// Wire identifier of the contained packet.
            #[must_use]
            pub const fn id(&self) -> u8 {
                match self {
                    $(Self::$variant(_) => <$ty as Loader>::ID,)+
                }
            }

            /// Name of the contained packet kind.
            #[must_use]
            pub const fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => <$ty as Loader>::NAME,)+
                }
            }

            /// Encodes the contained packet, id byte first.
            ///
            /// # Errors
            ///
            /// Fails if a text field cannot be encoded.
            pub fn encode(&self, writer: &mut ByteWriter) -> ProtocolResult<()> {
                match self {
                    $(Self::$variant(p) => p.encode(writer),)+
                }
            }

            /// Encodes into a fresh buffer.
            ///
            /// # Errors
            ///
            /// Fails if a text field cannot be encoded.
            pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
                let mut writer = ByteWriter::new();
                self.encode(&mut writer)?;
                Ok(writer.into_inner())
            }
        }

        $(
            impl From<$ty> for Packet {
                fn from(packet: $ty) -> Self {
                    Self::$variant(packet)
                }
            }
        )+
    };
}

routable_packets! {
    Position(PositionData),
    Orientation(OrientationData),
    Input(InputData),
    Hit(HitPacket),
    SetHp(SetHp),
    Grenade(GrenadePacket),
    SetTool(SetTool),
    SetColor(SetColor),
    ExistingPlayer(ExistingPlayer),
    MoveObject(MoveObject),
    CreatePlayer(CreatePlayer),
    BlockAction(BlockAction),
    StateData(StateData),
    KillAction(KillAction),
    ChatMessage(ChatMessage),
    MapStart(MapStart),
    MapChunk(MapChunk),
    PlayerLeft(PlayerLeft),
    IntelCapture(IntelCapture),
    IntelPickup(IntelPickup),
    IntelDrop(IntelDrop),
    Restock(Restock),
    FogColor(FogColor),
    WeaponReload(WeaponReload),
    ChangeTeam(ChangeTeam),
    ChangeWeapon(ChangeWeapon),
}

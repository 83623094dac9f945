//! Concrete protocol messages and the id registry used to decode a packet
//! whose type is only known from its header.

pub mod crafting;
pub mod entity;
pub mod inventory;
pub mod movement;
pub mod offline;
pub mod social;
pub mod world;

use bytes::Bytes;
use serde::Serialize;

use crate::codec::PacketReader;
use crate::context::CodecContext;
use crate::error::{CodecError, Result};
use crate::packet::{decode_body_checked, encode_packet, read_header, DecodeReport, Framing, Packet};

pub use crafting::CraftingData;
pub use entity::{BossEventPacket, SetEntityLink, UpdateAbilities, UpdateAttributes};
pub use inventory::{
    CreativeContent, InventoryContent, InventorySlot, InventoryTransaction, ItemStackRequest,
    ItemStackResponse, PlayerEnchantOptions,
};
pub use movement::{MovePlayer, PlayerAuthInput};
pub use offline::{UnconnectedPing, UnconnectedPong};
pub use social::{GameRulesChanged, PlayerList, SetScore, SetScoreboardIdentity};
pub use world::{ClientboundMapItemData, LevelChunk, SubChunk, SubChunkRequest, UpdateSubChunkBlocks};

macro_rules! define_packets {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// Any game packet the registry knows, keyed by its varint id.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub enum GamePacket {
            $($variant($ty),)*
        }

        impl GamePacket {
            pub fn id(&self) -> u32 {
                match self {
                    $(GamePacket::$variant(_) => <$ty as Packet>::ID,)*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(GamePacket::$variant(_) => <$ty as Packet>::NAME,)*
                }
            }

            pub fn name_for_id(id: u32) -> Option<&'static str> {
                $(
                    if id == <$ty as Packet>::ID {
                        return Some(<$ty as Packet>::NAME);
                    }
                )*
                None
            }

            pub fn encode(&self, ctx: &CodecContext) -> Result<Bytes> {
                match self {
                    $(GamePacket::$variant(packet) => encode_packet(packet, ctx),)*
                }
            }

            fn decode_body_for(id: u32, r: &mut PacketReader<'_>) -> Result<(Self, DecodeReport)> {
                $(
                    if id == <$ty as Packet>::ID {
                        let mut packet = <$ty>::default();
                        let report = decode_body_checked(&mut packet, r)?;
                        return Ok((GamePacket::$variant(packet), report));
                    }
                )*
                Err(CodecError::UnknownPacketId(id))
            }
        }

        $(
            impl From<$ty> for GamePacket {
                fn from(packet: $ty) -> Self {
                    GamePacket::$variant(packet)
                }
            }
        )*
    };
}

define_packets! {
    MovePlayer(MovePlayer),
    UpdateAttributes(UpdateAttributes),
    InventoryTransaction(InventoryTransaction),
    SetEntityLink(SetEntityLink),
    InventoryContent(InventoryContent),
    InventorySlot(InventorySlot),
    CraftingData(CraftingData),
    LevelChunk(LevelChunk),
    PlayerList(PlayerList),
    ClientboundMapItemData(ClientboundMapItemData),
    GameRulesChanged(GameRulesChanged),
    BossEvent(BossEventPacket),
    SetScore(SetScore),
    SetScoreboardIdentity(SetScoreboardIdentity),
    PlayerAuthInput(PlayerAuthInput),
    CreativeContent(CreativeContent),
    PlayerEnchantOptions(PlayerEnchantOptions),
    ItemStackRequest(ItemStackRequest),
    ItemStackResponse(ItemStackResponse),
    UpdateSubChunkBlocks(UpdateSubChunkBlocks),
    SubChunk(SubChunk),
    SubChunkRequest(SubChunkRequest),
    UpdateAbilities(UpdateAbilities),
}

impl GamePacket {
    /// Reads the varint id from `bytes` and decodes the matching packet.
    ///
    /// Ids with no registered decoder are `CodecError::UnknownPacketId`.
    pub fn decode_any(bytes: &[u8], ctx: &CodecContext) -> Result<(Self, DecodeReport)> {
        let mut r = PacketReader::new(bytes, ctx);
        let id = read_header(&mut r, Framing::Mcpe)?;
        Self::decode_body_for(id, &mut r)
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        crate::diagnostics::to_json(self)
    }
}

//! Wire codec for the Minecraft Bedrock game protocol.
//!
//! Varint and primitive readers/writers, structured value codecs, the packet
//! envelope with its encode-once cache, reference-counted packet pools, the
//! compressed batch wrapper, and a capture log for offline inspection.

pub mod batch;
pub mod capture;
pub mod codec;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod nbt;
pub mod packet;
pub mod packets;
pub mod pool;
pub mod translation;
pub mod types;
pub mod varint;

pub use codec::{PacketReader, PacketWriter};
pub use config::CodecConfig;
pub use context::CodecContext;
pub use error::{CodecError, PoolError};
pub use packet::{DecodeReport, Envelope, Framing, Packet};
pub use packets::GamePacket;
pub use pool::{PacketPool, PoolRegistry, PooledPacket, ReleaseOutcome};

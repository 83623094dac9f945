// Batch wrapper: several encoded game packets, each prefixed with its
// varint length, deflated (raw, no zlib header) into one 0xfe frame.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::Serialize;
use tracing::debug;

use crate::codec::{PacketReader, PacketWriter};
use crate::context::CodecContext;
use crate::diagnostics::serialize_blob;
use crate::error::{CodecError, Result};
use crate::packet::{Envelope, Framing, Packet};
use crate::varint;

/// The compressed frame. `payload` is everything after the id byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Wrapper {
    #[serde(serialize_with = "serialize_blob")]
    pub payload: Bytes,
}

impl Packet for Wrapper {
    const ID: u32 = 0xfe;
    const NAME: &'static str = "Wrapper";
    const FRAMING: Framing = Framing::Legacy;

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_bytes(&self.payload);
        Ok(())
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.payload = Bytes::copy_from_slice(r.read_rest());
        Ok(())
    }
}

/// Frames and deflates `packets` (each already encoded, header included) at
/// the configured compression level.
pub fn create_batch(packets: &[Bytes], ctx: &CodecContext) -> Result<Envelope<Wrapper>> {
    let level = ctx.config().compression_level;
    let framed_len: usize = packets
        .iter()
        .map(|p| varint::encoded_len_u32(p.len() as u32) + p.len())
        .sum();
    let mut framed = Vec::with_capacity(framed_len);
    for packet in packets {
        let len = u32::try_from(packet.len()).map_err(|_| CodecError::LengthLimit {
            what: "batched packet",
            length: packet.len() as u64,
            limit: u32::MAX as u64,
        })?;
        varint::write_u32(&mut framed, len);
        framed.extend_from_slice(packet);
    }

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder.write_all(&framed)?;
    let compressed = encoder.finish()?;
    debug!(
        "Batched {} packets at level {}: {} bytes framed, {} compressed",
        packets.len(),
        level,
        framed.len(),
        compressed.len()
    );

    Ok(Envelope::new(Wrapper {
        payload: Bytes::from(compressed),
    }))
}

/// Inflates a wrapper and splits it back into encoded packets.
///
/// Inflation stops at `max_batch_size`; anything larger is
/// `CodecError::LengthLimit`. A length prefix that runs past the end is
/// `CodecError::Truncated`.
pub fn open_batch(wrapper: &Wrapper, max_batch_size: usize) -> Result<Vec<Bytes>> {
    let mut inflated = Vec::new();
    let limit = max_batch_size as u64 + 1;
    DeflateDecoder::new(&wrapper.payload[..])
        .take(limit)
        .read_to_end(&mut inflated)?;
    if inflated.len() > max_batch_size {
        return Err(CodecError::LengthLimit {
            what: "inflated batch",
            length: inflated.len() as u64,
            limit: max_batch_size as u64,
        });
    }

    let inflated = Bytes::from(inflated);
    let mut packets = Vec::new();
    let mut at = 0;
    while at < inflated.len() {
        let (len, read) = varint::read_u32(&inflated, at)?;
        at += read;
        let len = len as usize;
        let remaining = inflated.len() - at;
        if len > remaining {
            return Err(CodecError::Truncated {
                offset: at,
                needed: len,
                remaining,
            });
        }
        packets.push(inflated.slice(at..at + len));
        at += len;
    }
    debug!("Opened batch: {} packets, {} bytes", packets.len(), inflated.len());
    Ok(packets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::packet::encode_packet;
    use crate::packets::{GamePacket, MovePlayer, SetEntityLink};
    use crate::types::math::Vec3;

    #[test]
    fn test_batch_round_trip() {
        let ctx = CodecContext::default();
        let first = encode_packet(
            &MovePlayer {
                position: Vec3::new(0.5, 70.0, 0.5),
                ..Default::default()
            },
            &ctx,
        )
        .unwrap();
        let second = encode_packet(&SetEntityLink::default(), &ctx).unwrap();

        let envelope = create_batch(&[first.clone(), second.clone()], &ctx).unwrap();
        let bytes = envelope.encode(&ctx).unwrap();
        assert_eq!(bytes[0], 0xfe);

        let (decoded, _) = Envelope::<Wrapper>::decode(&bytes, &ctx).unwrap();
        let packets = open_batch(decoded.packet(), 1 << 20).unwrap();
        assert_eq!(packets, vec![first, second]);

        let (game, _) = GamePacket::decode_any(&packets[0], &ctx).unwrap();
        assert_eq!(game.name(), "MovePlayer");
    }

    #[test]
    fn test_empty_batch() {
        let envelope = create_batch(&[], &CodecContext::default()).unwrap();
        assert!(open_batch(envelope.packet(), 16).unwrap().is_empty());
    }

    #[test]
    fn test_inflate_cap() {
        let big = Bytes::from(vec![0u8; 4096]);
        let envelope = create_batch(&[big], &CodecContext::default()).unwrap();
        assert!(matches!(
            open_batch(envelope.packet(), 1024),
            Err(CodecError::LengthLimit { .. })
        ));
    }

    #[test]
    fn test_compression_level_from_config() {
        let packet = Bytes::from(vec![0x13; 2048]);
        let level = |compression_level| {
            let mut config = CodecConfig::default();
            config.compression_level = compression_level;
            let ctx = CodecContext::with_config(config);
            create_batch(&[packet.clone()], &ctx).unwrap().packet().payload.clone()
        };

        // Level 0 stores, so the payload is larger than the input.
        let stored = level(0);
        let best = level(9);
        assert!(stored.len() > packet.len());
        assert!(best.len() < packet.len() / 10);

        let wrapper = Wrapper { payload: stored };
        assert_eq!(open_batch(&wrapper, 1 << 20).unwrap(), vec![packet.clone()]);
    }

    #[test]
    fn test_truncated_frame() {
        // Claims 10 bytes, carries 3.
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(&[10, 1, 2, 3]).unwrap();
        let wrapper = Wrapper {
            payload: Bytes::from(encoder.finish().unwrap()),
        };
        assert!(matches!(
            open_batch(&wrapper, 1024),
            Err(CodecError::Truncated {
                needed: 10,
                remaining: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_corrupt_payload() {
        let wrapper = Wrapper {
            payload: Bytes::from_static(&[0xff, 0xff, 0xff, 0xff]),
        };
        assert!(matches!(
            open_batch(&wrapper, 1024),
            Err(CodecError::Compression(_))
        ));
    }
}

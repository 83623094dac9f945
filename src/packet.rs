// Packet trait, id framing, and the encode-once envelope.

use std::fmt;
use std::sync::OnceLock;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{PacketReader, PacketWriter};
use crate::context::CodecContext;
use crate::diagnostics::hex_dump;
use crate::error::{CodecError, Result};

/// How the packet id is written in front of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Framing {
    /// Unsigned varint id, used by every game packet.
    Mcpe,
    /// Single raw byte, used by the offline handshake and the batch wrapper.
    Legacy,
}

/// A protocol message with a fixed field layout.
///
/// `decode_body` fills `self` in place so that whatever was decoded before a
/// recoverable error is kept.
pub trait Packet: Default + Send + Sync + 'static {
    const ID: u32;
    const NAME: &'static str;
    const FRAMING: Framing = Framing::Mcpe;

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()>;

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()>;

    /// Clears every field back to its default.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What a decode left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeReport {
    /// Bytes read, header included.
    pub consumed: usize,
    /// Bytes after a successful body decode that nothing read.
    pub trailing: usize,
    /// Bytes abandoned after an unknown discriminator.
    pub skipped: usize,
    pub skip_reason: Option<String>,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.trailing == 0 && self.skipped == 0
    }
}

pub fn write_header(w: &mut PacketWriter<'_>, framing: Framing, id: u32) -> Result<()> {
    match framing {
        Framing::Mcpe => w.write_unsigned_var_int(id),
        Framing::Legacy => {
            let id = u8::try_from(id)
                .map_err(|_| CodecError::invalid("packet id", format!("0x{:x} does not fit a byte", id)))?;
            w.write_u8(id);
        }
    }
    Ok(())
}

pub fn read_header(r: &mut PacketReader<'_>, framing: Framing) -> Result<u32> {
    match framing {
        Framing::Mcpe => r.read_unsigned_var_int(),
        Framing::Legacy => Ok(r.read_u8()? as u32),
    }
}

/// Encodes `packet` with its id header into a fresh buffer.
pub fn encode_packet<P: Packet>(packet: &P, ctx: &CodecContext) -> Result<Bytes> {
    let mut w = match ctx.size_hint(P::ID) {
        Some(hint) => PacketWriter::with_capacity(ctx, hint),
        None => PacketWriter::new(ctx),
    };
    write_header(&mut w, P::FRAMING, P::ID)?;
    packet.encode_body(&mut w)?;
    ctx.record_encoded_size(P::ID, w.len());
    debug!("Encoded {} (0x{:02x}), {} bytes", P::NAME, P::ID, w.len());
    Ok(w.into_bytes())
}

/// Decodes one `P` from `bytes`, header included.
///
/// An unknown discriminator inside the body does not fail the decode: the
/// fields read so far are returned and the rest of the buffer is reported as
/// skipped. Any other error is returned.
pub fn decode_packet<P: Packet>(bytes: &[u8], ctx: &CodecContext) -> Result<(P, DecodeReport)> {
    let mut r = PacketReader::new(bytes, ctx);
    let mut packet = P::default();
    let report = decode_into(&mut packet, &mut r)?;
    Ok((packet, report))
}

pub(crate) fn decode_into<P: Packet>(packet: &mut P, r: &mut PacketReader<'_>) -> Result<DecodeReport> {
    let id = read_header(r, P::FRAMING)?;
    if id != P::ID {
        return Err(CodecError::UnexpectedPacketId {
            expected: P::ID,
            actual: id,
        });
    }
    decode_body_checked(packet, r)
}

/// Runs the body decoder and turns leftovers into a report.
pub(crate) fn decode_body_checked<P: Packet>(
    packet: &mut P,
    r: &mut PacketReader<'_>,
) -> Result<DecodeReport> {
    let mut report = DecodeReport::default();
    match packet.decode_body(r) {
        Ok(()) => {}
        Err(err) if err.is_recoverable() => {
            let rest = r.read_rest();
            warn!(
                "{}: {}; skipping {} remaining bytes",
                P::NAME,
                err,
                rest.len()
            );
            report.skipped = rest.len();
            report.skip_reason = Some(err.to_string());
        }
        Err(err) => return Err(err),
    }

    if r.has_remaining() {
        let start = r.position();
        let rest = r.read_rest();
        warn!(
            "{}: {} trailing bytes at offset {} (protocol mismatch?)\n{}",
            P::NAME,
            rest.len(),
            start,
            hex_dump(rest, 16)
        );
        report.trailing = rest.len();
    }
    report.consumed = r.position() - report.trailing - report.skipped;
    Ok(report)
}

/// A packet plus its cached encoding.
///
/// The first `encode` runs the body encoder under the per-instance lock and
/// caches the bytes; later calls, from any thread, get the same buffer.
/// Mutable access through `packet_mut` drops the cache.
pub struct Envelope<P: Packet> {
    packet: P,
    encoded: OnceLock<Bytes>,
    encode_lock: Mutex<()>,
}

impl<P: Packet> Envelope<P> {
    pub fn new(packet: P) -> Self {
        Self {
            packet,
            encoded: OnceLock::new(),
            encode_lock: Mutex::new(()),
        }
    }

    pub fn packet(&self) -> &P {
        &self.packet
    }

    pub fn packet_mut(&mut self) -> &mut P {
        self.encoded.take();
        &mut self.packet
    }

    pub fn into_packet(self) -> P {
        self.packet
    }

    pub fn is_encoded(&self) -> bool {
        self.encoded.get().is_some()
    }

    pub fn encode(&self, ctx: &CodecContext) -> Result<Bytes> {
        if let Some(bytes) = self.encoded.get() {
            return Ok(bytes.clone());
        }
        let _guard = self.encode_lock.lock();
        if let Some(bytes) = self.encoded.get() {
            return Ok(bytes.clone());
        }
        let bytes = encode_packet(&self.packet, ctx)?;
        Ok(self.encoded.get_or_init(|| bytes).clone())
    }

    pub fn decode(bytes: &[u8], ctx: &CodecContext) -> Result<(Self, DecodeReport)> {
        let (packet, report) = decode_packet::<P>(bytes, ctx)?;
        Ok((Self::new(packet), report))
    }

    /// Clears the fields and the cached encoding.
    pub fn reset(&mut self) {
        self.packet.reset();
        self.encoded.take();
    }
}

impl<P: Packet> Default for Envelope<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P: Packet> From<P> for Envelope<P> {
    fn from(packet: P) -> Self {
        Self::new(packet)
    }
}

impl<P: Packet + fmt::Debug> fmt::Debug for Envelope<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("packet", &self.packet)
            .field("encoded_len", &self.encoded.get().map(Bytes::len))
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use crate::config::CodecConfig;

    /// Counts body encodes so tests can tell a cache hit from a re-encode.
    #[derive(Debug, Default)]
    pub(crate) struct Counted {
        pub value: u32,
        pub encodes: Arc<AtomicUsize>,
    }

    impl Packet for Counted {
        const ID: u32 = 0x7f;
        const NAME: &'static str = "Counted";

        fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
            self.encodes.fetch_add(1, Ordering::SeqCst);
            w.write_unsigned_var_int(self.value);
            Ok(())
        }

        fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
            self.value = r.read_unsigned_var_int()?;
            Ok(())
        }

        fn reset(&mut self) {
            self.value = 0;
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct TwoFields {
        first: u8,
        second: u8,
    }

    impl Packet for TwoFields {
        const ID: u32 = 0x05;
        const NAME: &'static str = "TwoFields";
        const FRAMING: Framing = Framing::Legacy;

        fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
            w.write_u8(self.first);
            w.write_u8(self.second);
            Ok(())
        }

        fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
            self.first = r.read_u8()?;
            if self.first == 0xee {
                return Err(CodecError::unknown("two fields marker", self.first));
            }
            self.second = r.read_u8()?;
            Ok(())
        }
    }

    #[test]
    fn test_encode_is_cached() {
        let ctx = CodecContext::default();
        let packet = Counted {
            value: 300,
            ..Default::default()
        };
        let encodes = packet.encodes.clone();
        let envelope = Envelope::new(packet);
        let first = envelope.encode(&ctx).unwrap();
        let second = envelope.encode(&ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_ptr(), second.as_ptr());
        assert_eq!(encodes.load(Ordering::SeqCst), 1);
        assert_eq!(&first[..], &[0x7f, 0xac, 0x02]);
    }

    #[test]
    fn test_packet_mut_invalidates_cache() {
        let ctx = CodecContext::default();
        let mut envelope = Envelope::new(Counted {
            value: 1,
            ..Default::default()
        });
        let before = envelope.encode(&ctx).unwrap();
        envelope.packet_mut().value = 2;
        assert!(!envelope.is_encoded());
        let after = envelope.encode(&ctx).unwrap();
        assert_ne!(before, after);
        assert_eq!(envelope.packet().encodes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_encode_runs_body_once() {
        let ctx = Arc::new(CodecContext::default());
        let packet = Counted {
            value: 77,
            ..Default::default()
        };
        let encodes = packet.encodes.clone();
        let envelope = Arc::new(Envelope::new(packet));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let envelope = envelope.clone();
                let barrier = barrier.clone();
                let ctx = ctx.clone();
                thread::spawn(move || {
                    barrier.wait();
                    envelope.encode(&ctx).unwrap()
                })
            })
            .collect();
        let results: Vec<Bytes> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(encodes.load(Ordering::SeqCst), 1);
        for bytes in &results {
            assert_eq!(bytes.as_ptr(), results[0].as_ptr());
            assert_eq!(bytes, &results[0]);
        }
    }

    #[test]
    fn test_legacy_header_and_round_trip() {
        let ctx = CodecContext::default();
        let bytes = encode_packet(&TwoFields { first: 1, second: 2 }, &ctx).unwrap();
        assert_eq!(&bytes[..], &[0x05, 1, 2]);
        let (decoded, report) = decode_packet::<TwoFields>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, TwoFields { first: 1, second: 2 });
        assert_eq!(report.consumed, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn test_trailing_bytes_reported() {
        let ctx = CodecContext::default();
        let (decoded, report) = decode_packet::<TwoFields>(&[0x05, 1, 2, 9, 9], &ctx).unwrap();
        assert_eq!(decoded.second, 2);
        assert_eq!(report.consumed, 3);
        assert_eq!(report.trailing, 2);
    }

    #[test]
    fn test_unknown_discriminator_keeps_partial_fields() {
        let ctx = CodecContext::default();
        let (decoded, report) = decode_packet::<TwoFields>(&[0x05, 0xee, 4, 4], &ctx).unwrap();
        assert_eq!(decoded.first, 0xee);
        assert_eq!(decoded.second, 0);
        assert_eq!(report.consumed, 2);
        assert_eq!(report.skipped, 2);
        assert!(report.skip_reason.is_some());
    }

    #[test]
    fn test_truncated_body_is_an_error() {
        let ctx = CodecContext::default();
        assert!(matches!(
            decode_packet::<TwoFields>(&[0x05, 1], &ctx),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_wrong_id_rejected() {
        let ctx = CodecContext::default();
        assert!(matches!(
            decode_packet::<TwoFields>(&[0x06, 1, 2], &ctx),
            Err(CodecError::UnexpectedPacketId {
                expected: 0x05,
                actual: 0x06
            })
        ));
    }

    #[test]
    fn test_large_encodings_leave_a_size_hint() {
        let mut config = CodecConfig::default();
        config.large_packet_threshold = 2;
        let ctx = CodecContext::with_config(config);
        encode_packet(
            &Counted {
                value: 1 << 20,
                ..Default::default()
            },
            &ctx,
        )
        .unwrap();
        assert_eq!(ctx.size_hint(Counted::ID), Some(4));
    }
}

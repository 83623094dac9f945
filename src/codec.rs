// Primitive reader/writer for the Bedrock wire format.
//
// Endianness is part of every fixed-width method name because the protocol
// mixes them per field: shorts, ints and floats are little-endian, the legacy
// "long" is big-endian, and a handful of fields want big-endian shorts.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::config::CodecConfig;
use crate::context::CodecContext;
use crate::error::{CodecError, Result};
use crate::types::math::{BlockCoordinates, Vec2, Vec3};
use crate::varint;

/// Cursor over one packet's bytes.
///
/// Every read consumes exactly the bytes of the value it returns. Reading past
/// the end is always [`CodecError::Truncated`]; a failed primitive read leaves
/// the cursor where it was.
pub struct PacketReader<'a> {
    buf: &'a [u8],
    pos: usize,
    ctx: &'a CodecContext,
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8], ctx: &'a CodecContext) -> Self {
        Self { buf, pos: 0, ctx }
    }

    pub fn context(&self) -> &'a CodecContext {
        self.ctx
    }

    pub fn config(&self) -> &'a CodecConfig {
        self.ctx.config()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn has_remaining(&self) -> bool {
        self.pos < self.buf.len()
    }

    /// Takes the next `n` bytes as a borrowed slice.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Everything left in the buffer.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Any non-zero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn read_i16_be(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn read_i64_le(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    /// The protocol's "long": big-endian.
    pub fn read_i64_be(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    pub fn read_f32_le(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32_le()?))
    }

    pub fn read_f64_le(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64_le()?))
    }

    pub fn read_unsigned_var_int(&mut self) -> Result<u32> {
        let (value, used) = varint::read_u32(self.buf, self.pos)?;
        self.pos += used;
        Ok(value)
    }

    /// Unsigned encoding of the two's complement bits, no zig-zag.
    pub fn read_var_int(&mut self) -> Result<i32> {
        Ok(self.read_unsigned_var_int()? as i32)
    }

    pub fn read_signed_var_int(&mut self) -> Result<i32> {
        Ok(varint::zigzag_decode_32(self.read_unsigned_var_int()?))
    }

    pub fn read_unsigned_var_long(&mut self) -> Result<u64> {
        let (value, used) = varint::read_u64(self.buf, self.pos)?;
        self.pos += used;
        Ok(value)
    }

    pub fn read_var_long(&mut self) -> Result<i64> {
        Ok(self.read_unsigned_var_long()? as i64)
    }

    pub fn read_signed_var_long(&mut self) -> Result<i64> {
        Ok(varint::zigzag_decode_64(self.read_unsigned_var_long()?))
    }

    /// Validates a declared collection size against the configured cap and
    /// against the bytes actually left (every element takes at least one).
    pub fn check_count(&self, what: &'static str, count: i64) -> Result<usize> {
        if count < 0 {
            return Err(CodecError::invalid(what, format!("negative count {}", count)));
        }
        let limit = self.config().max_list_length as u64;
        if count as u64 > limit {
            return Err(CodecError::LengthLimit {
                what,
                length: count as u64,
                limit,
            });
        }
        let count = count as usize;
        if count > self.remaining() {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: count,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    /// Unsigned-varint count prefix, the most common list framing.
    pub fn read_count(&mut self, what: &'static str) -> Result<usize> {
        let count = self.read_unsigned_var_int()?;
        self.check_count(what, count as i64)
    }

    /// Reads a `read_count`-framed list, one element per call of `item`.
    pub fn read_list<T>(
        &mut self,
        what: &'static str,
        mut item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let count = self.read_count(what)?;
        let mut out = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            out.push(item(self)?);
        }
        Ok(out)
    }

    /// Unsigned-varint length followed by raw bytes.
    pub fn read_byte_array(&mut self) -> Result<&'a [u8]> {
        let len = self.read_unsigned_var_int()? as usize;
        self.take(len)
    }

    /// Unsigned-varint length followed by UTF-8.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_unsigned_var_int()? as u64;
        let limit = self.config().max_string_length as u64;
        if len > limit {
            return Err(CodecError::LengthLimit {
                what: "string",
                length: len,
                limit,
            });
        }
        let bytes = self.take(len as usize)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Legacy string with a big-endian i16 length prefix.
    pub fn read_fixed_string(&mut self) -> Result<String> {
        let len = self.read_i16_be()?;
        if len < 0 {
            return Err(CodecError::invalid("fixed string", format!("negative length {}", len)));
        }
        let bytes = self.take(len as usize)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// String with a little-endian i16 length, used inside item extra data.
    pub fn read_short_string(&mut self) -> Result<String> {
        let len = self.read_i16_le()?;
        if len < 0 {
            return Err(CodecError::invalid("short string", format!("negative length {}", len)));
        }
        let bytes = self.take(len as usize)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2 {
            x: self.read_f32_le()?,
            y: self.read_f32_le()?,
        })
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3 {
            x: self.read_f32_le()?,
            y: self.read_f32_le()?,
            z: self.read_f32_le()?,
        })
    }

    /// Signed x, unsigned y, signed z.
    pub fn read_block_coordinates(&mut self) -> Result<BlockCoordinates> {
        Ok(BlockCoordinates {
            x: self.read_signed_var_int()?,
            y: self.read_unsigned_var_int()? as i32,
            z: self.read_signed_var_int()?,
        })
    }

    /// Two little-endian u64 halves, most significant first.
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let high = self.read_u64_le()?;
        let low = self.read_u64_le()?;
        Ok(Uuid::from_u64_pair(high, low))
    }
}

/// Growable output buffer for one packet.
pub struct PacketWriter<'a> {
    buf: BytesMut,
    ctx: &'a CodecContext,
}

impl<'a> PacketWriter<'a> {
    pub fn new(ctx: &'a CodecContext) -> Self {
        Self::with_capacity(ctx, 64)
    }

    pub fn with_capacity(ctx: &'a CodecContext, capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            ctx,
        }
    }

    pub fn context(&self) -> &'a CodecContext {
        self.ctx
    }

    pub fn config(&self) -> &'a CodecConfig {
        self.ctx.config()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    pub fn write_i16_le(&mut self, value: i16) {
        self.buf.put_i16_le(value);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn write_i16_be(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    pub fn write_u16_be(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    pub fn write_i32_le(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn write_i64_le(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn write_u64_le(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    pub fn write_i64_be(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    pub fn write_f32_le(&mut self, value: f32) {
        self.buf.put_u32_le(value.to_bits());
    }

    pub fn write_f64_le(&mut self, value: f64) {
        self.buf.put_u64_le(value.to_bits());
    }

    pub fn write_unsigned_var_int(&mut self, value: u32) {
        varint::write_u32(&mut self.buf, value);
    }

    pub fn write_var_int(&mut self, value: i32) {
        varint::write_u32(&mut self.buf, value as u32);
    }

    pub fn write_signed_var_int(&mut self, value: i32) {
        varint::write_u32(&mut self.buf, varint::zigzag_encode_32(value));
    }

    pub fn write_unsigned_var_long(&mut self, value: u64) {
        varint::write_u64(&mut self.buf, value);
    }

    pub fn write_var_long(&mut self, value: i64) {
        varint::write_u64(&mut self.buf, value as u64);
    }

    pub fn write_signed_var_long(&mut self, value: i64) {
        varint::write_u64(&mut self.buf, varint::zigzag_encode_64(value));
    }

    /// Unsigned-varint count prefix for a collection of `len` elements.
    pub fn write_count(&mut self, what: &'static str, len: usize) -> Result<()> {
        let count = u32::try_from(len).map_err(|_| CodecError::LengthLimit {
            what,
            length: len as u64,
            limit: u32::MAX as u64,
        })?;
        self.write_unsigned_var_int(count);
        Ok(())
    }

    pub fn write_list<T>(
        &mut self,
        what: &'static str,
        items: &[T],
        mut item: impl FnMut(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        self.write_count(what, items.len())?;
        for value in items {
            item(self, value)?;
        }
        Ok(())
    }

    pub fn write_byte_array(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_count("byte array", bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_count("string", value.len())?;
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_fixed_string(&mut self, value: &str) -> Result<()> {
        let len = i16::try_from(value.len())
            .map_err(|_| CodecError::invalid("fixed string", format!("{} bytes", value.len())))?;
        self.write_i16_be(len);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_short_string(&mut self, value: &str) -> Result<()> {
        let len = i16::try_from(value.len())
            .map_err(|_| CodecError::invalid("short string", format!("{} bytes", value.len())))?;
        self.write_i16_le(len);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_vec2(&mut self, value: Vec2) {
        self.write_f32_le(value.x);
        self.write_f32_le(value.y);
    }

    pub fn write_vec3(&mut self, value: Vec3) {
        self.write_f32_le(value.x);
        self.write_f32_le(value.y);
        self.write_f32_le(value.z);
    }

    pub fn write_block_coordinates(&mut self, value: BlockCoordinates) {
        self.write_signed_var_int(value.x);
        self.write_unsigned_var_int(value.y as u32);
        self.write_signed_var_int(value.z);
    }

    pub fn write_uuid(&mut self, value: &Uuid) {
        let (high, low) = value.as_u64_pair();
        self.write_u64_le(high);
        self.write_u64_le(low);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_for<'a>(bytes: &'a [u8], ctx: &'a CodecContext) -> PacketReader<'a> {
        PacketReader::new(bytes, ctx)
    }

    #[test]
    fn test_fixed_width_endianness() {
        let ctx = CodecContext::default();
        let mut w = PacketWriter::new(&ctx);
        w.write_i16_le(0x0102);
        w.write_i16_be(0x0102);
        w.write_i32_le(0x01020304);
        w.write_i64_be(0x0102030405060708);
        w.write_u64_le(0x0102030405060708);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[0..2], &[0x02, 0x01]);
        assert_eq!(&bytes[2..4], &[0x01, 0x02]);
        assert_eq!(&bytes[4..8], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&bytes[16..24], &[8, 7, 6, 5, 4, 3, 2, 1]);

        let mut r = reader_for(&bytes, &ctx);
        assert_eq!(r.read_i16_le().unwrap(), 0x0102);
        assert_eq!(r.read_i16_be().unwrap(), 0x0102);
        assert_eq!(r.read_i32_le().unwrap(), 0x01020304);
        assert_eq!(r.read_i64_be().unwrap(), 0x0102030405060708);
        assert_eq!(r.read_u64_le().unwrap(), 0x0102030405060708);
        assert!(!r.has_remaining());
    }

    #[test]
    fn test_float_bit_patterns_survive() {
        let ctx = CodecContext::default();
        let quiet_nan_with_payload = f32::from_bits(0x7FC0_1234);
        let values = [0.0f32, -0.0, f32::INFINITY, f32::MIN_POSITIVE, quiet_nan_with_payload];

        let mut w = PacketWriter::new(&ctx);
        for v in values {
            w.write_f32_le(v);
        }
        let bytes = w.into_bytes();
        let mut r = reader_for(&bytes, &ctx);
        for v in values {
            assert_eq!(r.read_f32_le().unwrap().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_var_int_is_not_zigzag() {
        let ctx = CodecContext::default();
        let mut w = PacketWriter::new(&ctx);
        w.write_var_int(-1);
        w.write_signed_var_int(-1);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..], &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0x01]);

        let mut r = reader_for(&bytes, &ctx);
        assert_eq!(r.read_var_int().unwrap(), -1);
        assert_eq!(r.read_signed_var_int().unwrap(), -1);
    }

    #[test]
    fn test_strings() {
        let ctx = CodecContext::default();
        let samples = ["", "steve", "Grüße, 世界 🎮"];
        let mut w = PacketWriter::new(&ctx);
        for s in samples {
            w.write_string(s).unwrap();
        }
        w.write_fixed_string("MCPE;Dedicated").unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes[0], 0);

        let mut r = reader_for(&bytes, &ctx);
        for s in samples {
            let read = r.read_string().unwrap();
            assert_eq!(read, s);
            assert_eq!(read.len(), s.len());
        }
        assert_eq!(r.read_fixed_string().unwrap(), "MCPE;Dedicated");
        assert!(!r.has_remaining());
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let ctx = CodecContext::default();
        let bytes = [0x02, 0xC3, 0x28];
        let mut r = reader_for(&bytes, &ctx);
        assert!(matches!(r.read_string(), Err(CodecError::InvalidUtf8(_))));
    }

    #[test]
    fn test_truncated_reads_do_not_advance() {
        let ctx = CodecContext::default();
        let bytes = [0x01, 0x02, 0x03];
        let mut r = reader_for(&bytes, &ctx);
        assert!(matches!(
            r.read_i32_le(),
            Err(CodecError::Truncated { offset: 0, needed: 4, remaining: 3 })
        ));
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_u8().unwrap(), 1);

        // String whose declared length runs past the end.
        let bytes = [0x05, b'a', b'b'];
        let mut r = reader_for(&bytes, &ctx);
        assert!(matches!(r.read_string(), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_block_coordinates_and_uuid() {
        let ctx = CodecContext::default();
        let coords = BlockCoordinates { x: -12, y: 70, z: 300 };
        let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);

        let mut w = PacketWriter::new(&ctx);
        w.write_block_coordinates(coords);
        w.write_uuid(&id);
        let bytes = w.into_bytes();
        // x zigzag(-12) = 23, y plain 70, z zigzag(300) = 600 = [0xD8, 0x04]
        assert_eq!(&bytes[..4], &[23, 70, 0xD8, 0x04]);
        assert_eq!(bytes[4], 0x77);

        let mut r = reader_for(&bytes, &ctx);
        assert_eq!(r.read_block_coordinates().unwrap(), coords);
        assert_eq!(r.read_uuid().unwrap(), id);
    }

    #[test]
    fn test_list_count_limit() {
        let mut config = CodecConfig::default();
        config.max_list_length = 4;
        let ctx = CodecContext::with_config(config);
        let bytes = [0x05, 0, 0, 0, 0, 0];
        let mut r = reader_for(&bytes, &ctx);
        assert!(matches!(
            r.read_list("test entries", |r| r.read_u8()),
            Err(CodecError::LengthLimit { length: 5, limit: 4, .. })
        ));
    }

    #[test]
    fn test_list_count_beyond_remaining_bytes() {
        let ctx = CodecContext::default();
        // Declares 200 entries with two bytes behind the count.
        let bytes = [0xC8, 0x01, 7, 8];
        let mut r = reader_for(&bytes, &ctx);
        assert!(matches!(
            r.read_list("test entries", |r| r.read_u8()),
            Err(CodecError::Truncated { offset: 2, needed: 200, remaining: 2 })
        ));
    }
}

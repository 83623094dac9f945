// World data messages. Chunk payloads are opaque byte regions.

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::diagnostics::serialize_blob;
use crate::error::Result;
use crate::packet::Packet;
use crate::types::map::{read_map_info, write_map_info, MapInfo};
use crate::types::math::BlockCoordinates;
use crate::types::sub_chunk::{
    read_block_updates, read_offsets, read_sub_chunk_entries_into, write_block_updates,
    write_offsets, write_sub_chunk_entries, BlockUpdateEntry, SubChunkEntry, SubChunkOffset,
};

/// Sub-chunk count value meaning "client should request sub-chunks, up to
/// `highest_sub_chunk`".
pub const SUB_CHUNK_REQUEST_LIMITED: u32 = u32::MAX - 1;
/// Sub-chunk count value meaning "client should request every sub-chunk".
pub const SUB_CHUNK_REQUEST_UNLIMITED: u32 = u32::MAX;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelChunk {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub dimension: i32,
    pub sub_chunk_count: u32,
    /// Only sent with `SUB_CHUNK_REQUEST_LIMITED`.
    pub highest_sub_chunk: u16,
    pub cache_enabled: bool,
    /// Only sent when the cache is enabled.
    pub blob_ids: Vec<u64>,
    #[serde(serialize_with = "serialize_blob")]
    pub payload: Vec<u8>,
}

impl Packet for LevelChunk {
    const ID: u32 = 0x3a;
    const NAME: &'static str = "LevelChunk";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_signed_var_int(self.chunk_x);
        w.write_signed_var_int(self.chunk_z);
        w.write_signed_var_int(self.dimension);
        w.write_unsigned_var_int(self.sub_chunk_count);
        if self.sub_chunk_count == SUB_CHUNK_REQUEST_LIMITED {
            w.write_u16_le(self.highest_sub_chunk);
        }
        w.write_bool(self.cache_enabled);
        if self.cache_enabled {
            w.write_list("blob ids", &self.blob_ids, |w, id| {
                w.write_u64_le(*id);
                Ok(())
            })?;
        }
        w.write_byte_array(&self.payload)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.chunk_x = r.read_signed_var_int()?;
        self.chunk_z = r.read_signed_var_int()?;
        self.dimension = r.read_signed_var_int()?;
        self.sub_chunk_count = r.read_unsigned_var_int()?;
        if self.sub_chunk_count == SUB_CHUNK_REQUEST_LIMITED {
            self.highest_sub_chunk = r.read_u16_le()?;
        }
        self.cache_enabled = r.read_bool()?;
        if self.cache_enabled {
            self.blob_ids = r.read_list("blob ids", |r| r.read_u64_le())?;
        }
        self.payload = r.read_byte_array()?.to_vec();
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubChunk {
    pub cache_enabled: bool,
    pub dimension: i32,
    /// Sub-chunk position the entry offsets are relative to.
    pub position: BlockCoordinates,
    pub entries: Vec<SubChunkEntry>,
}

impl Packet for SubChunk {
    const ID: u32 = 0xae;
    const NAME: &'static str = "SubChunk";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_bool(self.cache_enabled);
        w.write_signed_var_int(self.dimension);
        w.write_signed_var_int(self.position.x);
        w.write_signed_var_int(self.position.y);
        w.write_signed_var_int(self.position.z);
        write_sub_chunk_entries(w, &self.entries, self.cache_enabled)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.cache_enabled = r.read_bool()?;
        self.dimension = r.read_signed_var_int()?;
        self.position = BlockCoordinates::new(
            r.read_signed_var_int()?,
            r.read_signed_var_int()?,
            r.read_signed_var_int()?,
        );
        read_sub_chunk_entries_into(r, &mut self.entries, self.cache_enabled)
    }
}

/// Client asks for the sub-chunks at `position + offset` for each offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubChunkRequest {
    pub dimension: i32,
    pub position: BlockCoordinates,
    pub offsets: Vec<SubChunkOffset>,
}

impl Packet for SubChunkRequest {
    const ID: u32 = 0xaf;
    const NAME: &'static str = "SubChunkRequest";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_signed_var_int(self.dimension);
        w.write_signed_var_int(self.position.x);
        w.write_signed_var_int(self.position.y);
        w.write_signed_var_int(self.position.z);
        write_offsets(w, &self.offsets)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.dimension = r.read_signed_var_int()?;
        self.position = BlockCoordinates::new(
            r.read_signed_var_int()?,
            r.read_signed_var_int()?,
            r.read_signed_var_int()?,
        );
        self.offsets = read_offsets(r)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateSubChunkBlocks {
    pub position: BlockCoordinates,
    pub standard: Vec<BlockUpdateEntry>,
    pub extra: Vec<BlockUpdateEntry>,
}

impl Packet for UpdateSubChunkBlocks {
    const ID: u32 = 0xac;
    const NAME: &'static str = "UpdateSubChunkBlocks";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_block_coordinates(self.position);
        write_block_updates(w, &self.standard)?;
        write_block_updates(w, &self.extra)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.position = r.read_block_coordinates()?;
        self.standard = read_block_updates(r)?;
        self.extra = read_block_updates(r)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientboundMapItemData {
    pub map: MapInfo,
}

impl Packet for ClientboundMapItemData {
    const ID: u32 = 0x43;
    const NAME: &'static str = "ClientboundMapItemData";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        write_map_info(w, &self.map)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.map = read_map_info(r)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::context::CodecContext;
    use crate::packet::{decode_packet, encode_packet, Envelope};
    use crate::types::map::FLAG_DECORATION;
    use crate::types::sub_chunk::{HeightMap, RESULT_SUCCESS};

    #[test]
    fn test_level_chunk_limited_request() {
        let ctx = CodecContext::default();
        let packet = LevelChunk {
            chunk_x: -3,
            chunk_z: 7,
            dimension: 0,
            sub_chunk_count: SUB_CHUNK_REQUEST_LIMITED,
            highest_sub_chunk: 20,
            cache_enabled: false,
            blob_ids: vec![],
            payload: vec![0; 3],
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, report) = decode_packet::<LevelChunk>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
        assert!(report.is_clean());
    }

    #[test]
    fn test_level_chunk_with_cache_blobs() {
        let ctx = CodecContext::default();
        let packet = LevelChunk {
            sub_chunk_count: 4,
            cache_enabled: true,
            blob_ids: vec![1, u64::MAX],
            payload: vec![1, 2, 3],
            ..Default::default()
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, _) = decode_packet::<LevelChunk>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_large_chunk_records_size_hint() {
        let mut config = CodecConfig::default();
        config.large_packet_threshold = 1024;
        let ctx = CodecContext::with_config(config);
        let envelope = Envelope::new(LevelChunk {
            sub_chunk_count: 1,
            payload: vec![0xaa; 4096],
            ..Default::default()
        });
        let bytes = envelope.encode(&ctx).unwrap();
        assert_eq!(ctx.size_hint(LevelChunk::ID), Some(bytes.len()));
    }

    #[test]
    fn test_sub_chunk_round_trip() {
        let ctx = CodecContext::default();
        let packet = SubChunk {
            cache_enabled: false,
            dimension: 1,
            position: BlockCoordinates::new(2, -4, 9),
            entries: vec![SubChunkEntry {
                offset: SubChunkOffset::new(0, 0, 1),
                result: RESULT_SUCCESS,
                payload: vec![8, 0],
                height_map: HeightMap::AllTooHigh,
                blob_id: 0,
            }],
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, report) = decode_packet::<SubChunk>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
        assert!(report.is_clean());
    }

    #[test]
    fn test_sub_chunk_request() {
        let ctx = CodecContext::default();
        let packet = SubChunkRequest {
            dimension: 0,
            position: BlockCoordinates::new(-3, 4, 7),
            offsets: vec![SubChunkOffset::new(0, 0, 0), SubChunkOffset::new(-1, 2, 1)],
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        // two-byte id, dimension, three coordinates, then an i32 LE count
        assert_eq!(&bytes[..2], &[0xaf, 0x01]);
        assert_eq!(&bytes[6..10], &[2, 0, 0, 0]);
        assert_eq!(&bytes[13..], &[0xff, 2, 1]);

        let (decoded, report) = decode_packet::<SubChunkRequest>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
        assert!(report.is_clean());
    }

    #[test]
    fn test_update_sub_chunk_blocks() {
        let ctx = CodecContext::default();
        let packet = UpdateSubChunkBlocks {
            position: BlockCoordinates::new(1, 4, 1),
            standard: vec![BlockUpdateEntry {
                position: BlockCoordinates::new(16, 70, 17),
                block_runtime_id: 42,
                flags: 3,
                ..Default::default()
            }],
            extra: vec![],
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, _) = decode_packet::<UpdateSubChunkBlocks>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_map_item_data() {
        let ctx = CodecContext::default();
        let packet = ClientboundMapItemData {
            map: MapInfo {
                map_id: 3,
                update_flags: FLAG_DECORATION,
                scale: 1,
                ..Default::default()
            },
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, _) = decode_packet::<ClientboundMapItemData>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
    }
}

// Sub-chunk request/response pieces and block updates.
//
// Block payloads are opaque here: the world layer produces them and the codec
// only frames them.

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::diagnostics::serialize_blob;
use crate::error::{CodecError, Result};
use crate::types::math::BlockCoordinates;

pub const HEIGHT_MAP_SIZE: usize = 256;

const HEIGHT_MAP_NO_DATA: u8 = 0;
const HEIGHT_MAP_DATA: u8 = 1;
const HEIGHT_MAP_ALL_TOO_HIGH: u8 = 2;
const HEIGHT_MAP_ALL_TOO_LOW: u8 = 3;

pub const RESULT_SUCCESS: u8 = 1;
pub const RESULT_SUCCESS_ALL_AIR: u8 = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum HeightMap {
    #[default]
    NoData,
    /// One height per column, relative to the sub-chunk.
    Data(#[serde(serialize_with = "serialize_blob")] Vec<u8>),
    AllTooHigh,
    AllTooLow,
}

pub fn write_height_map(w: &mut PacketWriter<'_>, map: &HeightMap) -> Result<()> {
    match map {
        HeightMap::NoData => w.write_u8(HEIGHT_MAP_NO_DATA),
        HeightMap::AllTooHigh => w.write_u8(HEIGHT_MAP_ALL_TOO_HIGH),
        HeightMap::AllTooLow => w.write_u8(HEIGHT_MAP_ALL_TOO_LOW),
        HeightMap::Data(heights) => {
            if heights.len() != HEIGHT_MAP_SIZE {
                return Err(CodecError::invalid(
                    "height map",
                    format!("expected {} heights, got {}", HEIGHT_MAP_SIZE, heights.len()),
                ));
            }
            w.write_u8(HEIGHT_MAP_DATA);
            w.write_bytes(heights);
        }
    }
    Ok(())
}

pub fn read_height_map(r: &mut PacketReader<'_>) -> Result<HeightMap> {
    match r.read_u8()? {
        HEIGHT_MAP_NO_DATA => Ok(HeightMap::NoData),
        HEIGHT_MAP_DATA => Ok(HeightMap::Data(r.take(HEIGHT_MAP_SIZE)?.to_vec())),
        HEIGHT_MAP_ALL_TOO_HIGH => Ok(HeightMap::AllTooHigh),
        HEIGHT_MAP_ALL_TOO_LOW => Ok(HeightMap::AllTooLow),
        other => Err(CodecError::unknown("height map type", other)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubChunkOffset {
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

impl SubChunkOffset {
    pub const fn new(x: i8, y: i8, z: i8) -> Self {
        Self { x, y, z }
    }
}

pub fn write_offset(w: &mut PacketWriter<'_>, offset: SubChunkOffset) {
    w.write_i8(offset.x);
    w.write_i8(offset.y);
    w.write_i8(offset.z);
}

pub fn read_offset(r: &mut PacketReader<'_>) -> Result<SubChunkOffset> {
    Ok(SubChunkOffset {
        x: r.read_i8()?,
        y: r.read_i8()?,
        z: r.read_i8()?,
    })
}

/// Offset lists are framed by an i32 LE count.
pub fn write_offsets(w: &mut PacketWriter<'_>, offsets: &[SubChunkOffset]) -> Result<()> {
    let count = i32::try_from(offsets.len()).map_err(|_| CodecError::LengthLimit {
        what: "sub-chunk offsets",
        length: offsets.len() as u64,
        limit: i32::MAX as u64,
    })?;
    w.write_i32_le(count);
    for offset in offsets {
        write_offset(w, *offset);
    }
    Ok(())
}

pub fn read_offsets(r: &mut PacketReader<'_>) -> Result<Vec<SubChunkOffset>> {
    let count = r.read_i32_le()?;
    let count = r.check_count("sub-chunk offsets", count as i64)?;
    (0..count).map(|_| read_offset(r)).collect()
}

/// One entry of a sub-chunk response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubChunkEntry {
    pub offset: SubChunkOffset,
    pub result: u8,
    /// Omitted on the wire when the cache is on and the result is all-air.
    #[serde(serialize_with = "serialize_blob")]
    pub payload: Vec<u8>,
    pub height_map: HeightMap,
    /// Only present when the cache is enabled.
    pub blob_id: u64,
}

fn payload_present(cache_enabled: bool, result: u8) -> bool {
    !cache_enabled || result != RESULT_SUCCESS_ALL_AIR
}

/// Entries are framed by a u32 LE count.
pub fn write_sub_chunk_entries(
    w: &mut PacketWriter<'_>,
    entries: &[SubChunkEntry],
    cache_enabled: bool,
) -> Result<()> {
    let count = u32::try_from(entries.len()).map_err(|_| CodecError::LengthLimit {
        what: "sub-chunk entries",
        length: entries.len() as u64,
        limit: u32::MAX as u64,
    })?;
    w.write_u32_le(count);
    for entry in entries {
        write_offset(w, entry.offset);
        w.write_u8(entry.result);
        if payload_present(cache_enabled, entry.result) {
            w.write_byte_array(&entry.payload)?;
        }
        write_height_map(w, &entry.height_map)?;
        if cache_enabled {
            w.write_u64_le(entry.blob_id);
        }
    }
    Ok(())
}

pub fn read_sub_chunk_entries_into(
    r: &mut PacketReader<'_>,
    entries: &mut Vec<SubChunkEntry>,
    cache_enabled: bool,
) -> Result<()> {
    let count = r.read_u32_le()?;
    let count = r.check_count("sub-chunk entries", count as i64)?;
    for _ in 0..count {
        let offset = read_offset(r)?;
        let result = r.read_u8()?;
        let payload = if payload_present(cache_enabled, result) {
            r.read_byte_array()?.to_vec()
        } else {
            Vec::new()
        };
        let height_map = read_height_map(r)?;
        let blob_id = if cache_enabled { r.read_u64_le()? } else { 0 };
        entries.push(SubChunkEntry {
            offset,
            result,
            payload,
            height_map,
            blob_id,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockUpdateEntry {
    pub position: BlockCoordinates,
    pub block_runtime_id: u32,
    pub flags: u32,
    pub synced_entity_unique_id: u64,
    pub synced_update_type: u32,
}

pub fn write_block_updates(w: &mut PacketWriter<'_>, entries: &[BlockUpdateEntry]) -> Result<()> {
    w.write_list("block updates", entries, |w, e| {
        w.write_block_coordinates(e.position);
        w.write_unsigned_var_int(e.block_runtime_id);
        w.write_unsigned_var_int(e.flags);
        w.write_unsigned_var_long(e.synced_entity_unique_id);
        w.write_unsigned_var_int(e.synced_update_type);
        Ok(())
    })
}

pub fn read_block_updates(r: &mut PacketReader<'_>) -> Result<Vec<BlockUpdateEntry>> {
    r.read_list("block updates", |r| {
        Ok(BlockUpdateEntry {
            position: r.read_block_coordinates()?,
            block_runtime_id: r.read_unsigned_var_int()?,
            flags: r.read_unsigned_var_int()?,
            synced_entity_unique_id: r.read_unsigned_var_long()?,
            synced_update_type: r.read_unsigned_var_int()?,
        })
    })
}

//! Named binary tag trees, as embedded in item extra data and block palettes.
//!
//! Two integer layouts exist on the wire. [`NbtMode::LittleEndian`] uses
//! fixed-width little-endian ints and u16 string lengths; [`NbtMode::Network`]
//! uses zig-zag varints for ints, longs and array/list lengths and an unsigned
//! varint for string lengths.

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;
const TAG_LONG_ARRAY: u8 = 12;

const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NbtMode {
    LittleEndian,
    Network,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtTag {
    pub fn type_id(&self) -> u8 {
        match self {
            NbtTag::Byte(_) => TAG_BYTE,
            NbtTag::Short(_) => TAG_SHORT,
            NbtTag::Int(_) => TAG_INT,
            NbtTag::Long(_) => TAG_LONG,
            NbtTag::Float(_) => TAG_FLOAT,
            NbtTag::Double(_) => TAG_DOUBLE,
            NbtTag::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtTag::String(_) => TAG_STRING,
            NbtTag::List(_) => TAG_LIST,
            NbtTag::Compound(_) => TAG_COMPOUND,
            NbtTag::IntArray(_) => TAG_INT_ARRAY,
            NbtTag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }
}

/// A list keeps its element type so that empty lists round-trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NbtList {
    pub element_type: u8,
    pub items: Vec<NbtTag>,
}

impl NbtList {
    pub fn empty() -> Self {
        Self {
            element_type: TAG_END,
            items: Vec::new(),
        }
    }
}

/// Compound entries in wire order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NbtCompound {
    entries: Vec<(String, NbtTag)>,
}

impl NbtCompound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces an existing entry in place or appends a new one.
    pub fn insert(&mut self, name: impl Into<String>, tag: NbtTag) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = tag,
            None => self.entries.push((name, tag)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, tag: NbtTag) -> Self {
        self.insert(name, tag);
        self
    }

    pub fn get(&self, name: &str) -> Option<&NbtTag> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, tag)| tag)
    }

    pub fn get_compound(&self, name: &str) -> Option<&NbtCompound> {
        match self.get(name) {
            Some(NbtTag::Compound(compound)) => Some(compound),
            _ => None,
        }
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(NbtTag::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NbtTag)> {
        self.entries.iter().map(|(key, tag)| (key.as_str(), tag))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads a root compound and its name.
pub fn read_named_compound(
    reader: &mut PacketReader<'_>,
    mode: NbtMode,
) -> Result<(String, NbtCompound)> {
    let tag_type = reader.read_u8()?;
    if tag_type != TAG_COMPOUND {
        return Err(CodecError::Nbt(format!(
            "root tag must be a compound, found type {}",
            tag_type
        )));
    }
    let name = read_nbt_string(reader, mode)?;
    let compound = read_compound_body(reader, mode, 0)?;
    Ok((name, compound))
}

/// Reads a root compound, discarding its (normally empty) name.
pub fn read_compound(reader: &mut PacketReader<'_>, mode: NbtMode) -> Result<NbtCompound> {
    read_named_compound(reader, mode).map(|(_, compound)| compound)
}

pub fn write_named_compound(
    writer: &mut PacketWriter<'_>,
    name: &str,
    compound: &NbtCompound,
    mode: NbtMode,
) -> Result<()> {
    writer.write_u8(TAG_COMPOUND);
    write_nbt_string(writer, name, mode)?;
    write_compound_body(writer, compound, mode, 0)
}

/// Writes a root compound with an empty name.
pub fn write_compound(
    writer: &mut PacketWriter<'_>,
    compound: &NbtCompound,
    mode: NbtMode,
) -> Result<()> {
    write_named_compound(writer, "", compound, mode)
}

fn read_nbt_string(reader: &mut PacketReader<'_>, mode: NbtMode) -> Result<String> {
    match mode {
        NbtMode::LittleEndian => {
            let len = reader.read_u16_le()? as usize;
            let bytes = reader.take(len)?;
            Ok(String::from_utf8(bytes.to_vec())?)
        }
        NbtMode::Network => reader.read_string(),
    }
}

fn write_nbt_string(writer: &mut PacketWriter<'_>, value: &str, mode: NbtMode) -> Result<()> {
    match mode {
        NbtMode::LittleEndian => {
            let len = u16::try_from(value.len())
                .map_err(|_| CodecError::Nbt(format!("string of {} bytes too long", value.len())))?;
            writer.write_u16_le(len);
            writer.write_bytes(value.as_bytes());
            Ok(())
        }
        NbtMode::Network => writer.write_string(value),
    }
}

fn read_int(reader: &mut PacketReader<'_>, mode: NbtMode) -> Result<i32> {
    match mode {
        NbtMode::LittleEndian => reader.read_i32_le(),
        NbtMode::Network => reader.read_signed_var_int(),
    }
}

fn write_int(writer: &mut PacketWriter<'_>, value: i32, mode: NbtMode) {
    match mode {
        NbtMode::LittleEndian => writer.write_i32_le(value),
        NbtMode::Network => writer.write_signed_var_int(value),
    }
}

fn read_long(reader: &mut PacketReader<'_>, mode: NbtMode) -> Result<i64> {
    match mode {
        NbtMode::LittleEndian => reader.read_i64_le(),
        NbtMode::Network => reader.read_signed_var_long(),
    }
}

fn write_long(writer: &mut PacketWriter<'_>, value: i64, mode: NbtMode) {
    match mode {
        NbtMode::LittleEndian => writer.write_i64_le(value),
        NbtMode::Network => writer.write_signed_var_long(value),
    }
}

fn read_len(reader: &mut PacketReader<'_>, mode: NbtMode, what: &'static str) -> Result<usize> {
    let len = read_int(reader, mode)?;
    reader.check_count(what, len as i64)
}

fn write_len(writer: &mut PacketWriter<'_>, len: usize, mode: NbtMode) -> Result<()> {
    let len = i32::try_from(len).map_err(|_| CodecError::Nbt(format!("{} elements", len)))?;
    write_int(writer, len, mode);
    Ok(())
}

fn read_compound_body(
    reader: &mut PacketReader<'_>,
    mode: NbtMode,
    depth: usize,
) -> Result<NbtCompound> {
    if depth > MAX_DEPTH {
        return Err(CodecError::Nbt("nesting too deep".to_string()));
    }
    let mut compound = NbtCompound::new();
    loop {
        let tag_type = reader.read_u8()?;
        if tag_type == TAG_END {
            return Ok(compound);
        }
        let name = read_nbt_string(reader, mode)?;
        let tag = read_payload(reader, tag_type, mode, depth + 1)?;
        compound.entries.push((name, tag));
    }
}

fn write_compound_body(
    writer: &mut PacketWriter<'_>,
    compound: &NbtCompound,
    mode: NbtMode,
    depth: usize,
) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(CodecError::Nbt("nesting too deep".to_string()));
    }
    for (name, tag) in &compound.entries {
        writer.write_u8(tag.type_id());
        write_nbt_string(writer, name, mode)?;
        write_payload(writer, tag, mode, depth + 1)?;
    }
    writer.write_u8(TAG_END);
    Ok(())
}

fn read_payload(
    reader: &mut PacketReader<'_>,
    tag_type: u8,
    mode: NbtMode,
    depth: usize,
) -> Result<NbtTag> {
    let tag = match tag_type {
        TAG_BYTE => NbtTag::Byte(reader.read_i8()?),
        TAG_SHORT => NbtTag::Short(reader.read_i16_le()?),
        TAG_INT => NbtTag::Int(read_int(reader, mode)?),
        TAG_LONG => NbtTag::Long(read_long(reader, mode)?),
        TAG_FLOAT => NbtTag::Float(reader.read_f32_le()?),
        TAG_DOUBLE => NbtTag::Double(reader.read_f64_le()?),
        TAG_BYTE_ARRAY => {
            let len = read_len(reader, mode, "nbt byte array")?;
            NbtTag::ByteArray(reader.take(len)?.to_vec())
        }
        TAG_STRING => NbtTag::String(read_nbt_string(reader, mode)?),
        TAG_LIST => {
            if depth > MAX_DEPTH {
                return Err(CodecError::Nbt("nesting too deep".to_string()));
            }
            let element_type = reader.read_u8()?;
            let len = read_len(reader, mode, "nbt list")?;
            let mut items = Vec::with_capacity(len.min(reader.remaining()));
            for _ in 0..len {
                items.push(read_payload(reader, element_type, mode, depth + 1)?);
            }
            NbtTag::List(NbtList {
                element_type,
                items,
            })
        }
        TAG_COMPOUND => NbtTag::Compound(read_compound_body(reader, mode, depth)?),
        TAG_INT_ARRAY => {
            let len = read_len(reader, mode, "nbt int array")?;
            let mut values = Vec::with_capacity(len.min(reader.remaining()));
            for _ in 0..len {
                values.push(read_int(reader, mode)?);
            }
            NbtTag::IntArray(values)
        }
        TAG_LONG_ARRAY => {
            let len = read_len(reader, mode, "nbt long array")?;
            let mut values = Vec::with_capacity(len.min(reader.remaining()));
            for _ in 0..len {
                values.push(read_long(reader, mode)?);
            }
            NbtTag::LongArray(values)
        }
        other => return Err(CodecError::Nbt(format!("unknown tag type {}", other))),
    };
    Ok(tag)
}

fn write_payload(
    writer: &mut PacketWriter<'_>,
    tag: &NbtTag,
    mode: NbtMode,
    depth: usize,
) -> Result<()> {
    match tag {
        NbtTag::Byte(v) => writer.write_i8(*v),
        NbtTag::Short(v) => writer.write_i16_le(*v),
        NbtTag::Int(v) => write_int(writer, *v, mode),
        NbtTag::Long(v) => write_long(writer, *v, mode),
        NbtTag::Float(v) => writer.write_f32_le(*v),
        NbtTag::Double(v) => writer.write_f64_le(*v),
        NbtTag::ByteArray(bytes) => {
            write_len(writer, bytes.len(), mode)?;
            writer.write_bytes(bytes);
        }
        NbtTag::String(v) => write_nbt_string(writer, v, mode)?,
        NbtTag::List(list) => {
            if depth > MAX_DEPTH {
                return Err(CodecError::Nbt("nesting too deep".to_string()));
            }
            if let Some(bad) = list.items.iter().find(|t| t.type_id() != list.element_type) {
                return Err(CodecError::Nbt(format!(
                    "list of type {} holds a tag of type {}",
                    list.element_type,
                    bad.type_id()
                )));
            }
            writer.write_u8(list.element_type);
            write_len(writer, list.items.len(), mode)?;
            for item in &list.items {
                write_payload(writer, item, mode, depth + 1)?;
            }
        }
        NbtTag::Compound(compound) => write_compound_body(writer, compound, mode, depth)?,
        NbtTag::IntArray(values) => {
            write_len(writer, values.len(), mode)?;
            for v in values {
                write_int(writer, *v, mode);
            }
        }
        NbtTag::LongArray(values) => {
            write_len(writer, values.len(), mode)?;
            for v in values {
                write_long(writer, *v, mode);
            }
        }
    }
    Ok(())
}

// Item stacks.
//
// Wire layout: signed varint network id (0 = air, nothing follows), i16 count,
// unsigned varint network meta, optional stack net id, signed varint block
// runtime id, then a length-prefixed extra-data blob with its own
// little-endian layout (nbt marker, can-place/can-break lists, shield tick).

use serde::Serialize;
use tracing::warn;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::nbt::{self, NbtCompound, NbtMode};

const NBT_MARKER: u16 = 0xffff;
const NBT_VERSION: u8 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemStack {
    /// Persistent item id. 0 is air.
    pub id: i32,
    pub meta: i16,
    pub count: i16,
    /// Server-assigned stack id, only present where the message carries one.
    pub stack_net_id: Option<i32>,
    pub block_runtime_id: i32,
    pub extra: Option<NbtCompound>,
    pub can_place_on: Vec<String>,
    pub can_destroy: Vec<String>,
    /// Only carried by shields.
    pub blocking_tick: i64,
}

impl ItemStack {
    pub fn new(id: i32, meta: i16, count: i16) -> Self {
        Self {
            id,
            meta,
            count,
            ..Default::default()
        }
    }

    /// The canonical empty slot.
    pub fn air() -> Self {
        Self::default()
    }

    pub fn is_air(&self) -> bool {
        self.id == 0 || self.count <= 0
    }

    pub fn with_extra(mut self, extra: NbtCompound) -> Self {
        self.extra = Some(extra);
        self
    }
}

pub fn write_item(w: &mut PacketWriter<'_>, item: &ItemStack, with_stack_id: bool) -> Result<()> {
    if item.is_air() {
        w.write_signed_var_int(0);
        return Ok(());
    }

    let Some((network_id, network_meta)) = w.context().translator().to_network(item.id, item.meta)
    else {
        warn!(
            "No network id for item {}:{}; writing air",
            item.id, item.meta
        );
        w.write_signed_var_int(0);
        return Ok(());
    };
    if network_id == 0 {
        w.write_signed_var_int(0);
        return Ok(());
    }

    w.write_signed_var_int(network_id);
    w.write_i16_le(item.count);
    w.write_unsigned_var_int(network_meta as u16 as u32);

    if with_stack_id {
        w.write_bool(item.stack_net_id.is_some());
        if let Some(stack_net_id) = item.stack_net_id {
            w.write_var_int(stack_net_id);
        }
    }

    w.write_signed_var_int(item.block_runtime_id);

    let mut extra = PacketWriter::new(w.context());
    match &item.extra {
        Some(compound) => {
            extra.write_u16_le(NBT_MARKER);
            extra.write_u8(NBT_VERSION);
            nbt::write_compound(&mut extra, compound, NbtMode::LittleEndian)?;
        }
        None => extra.write_u16_le(0),
    }
    write_short_string_list(&mut extra, &item.can_place_on)?;
    write_short_string_list(&mut extra, &item.can_destroy)?;
    if item.id == w.config().shield_item_id {
        extra.write_i64_le(item.blocking_tick);
    }
    w.write_byte_array(extra.as_slice())
}

pub fn read_item(r: &mut PacketReader<'_>, with_stack_id: bool) -> Result<ItemStack> {
    let network_id = r.read_signed_var_int()?;
    if network_id == 0 {
        return Ok(ItemStack::air());
    }

    let count = r.read_i16_le()?;
    let network_meta = r.read_unsigned_var_int()? as i16;

    let stack_net_id = if with_stack_id && r.read_bool()? {
        Some(r.read_var_int()?)
    } else {
        None
    };
    let block_runtime_id = r.read_signed_var_int()?;
    let blob = r.read_byte_array()?;
    if count <= 0 {
        return Ok(ItemStack::air());
    }

    let Some((id, meta)) = r
        .context()
        .translator()
        .from_network(network_id, network_meta)
    else {
        warn!(
            "Unknown network item {}:{}; reading as air",
            network_id, network_meta
        );
        return Ok(ItemStack::air());
    };

    let mut item = ItemStack {
        id,
        meta,
        count,
        stack_net_id,
        block_runtime_id,
        ..Default::default()
    };

    let mut extra = PacketReader::new(blob, r.context());
    match extra.read_u16_le()? {
        0 => {}
        NBT_MARKER => {
            let version = extra.read_u8()?;
            if version != NBT_VERSION {
                return Err(CodecError::invalid(
                    "item extra data",
                    format!("unsupported nbt version {}", version),
                ));
            }
            item.extra = Some(nbt::read_compound(&mut extra, NbtMode::LittleEndian)?);
        }
        other => {
            return Err(CodecError::invalid(
                "item extra data",
                format!("unexpected nbt marker 0x{:04x}", other),
            ))
        }
    }
    item.can_place_on = read_short_string_list(&mut extra, "can place on")?;
    item.can_destroy = read_short_string_list(&mut extra, "can destroy")?;
    if item.id == r.config().shield_item_id {
        item.blocking_tick = extra.read_i64_le()?;
    }
    Ok(item)
}

/// Unsigned-varint count followed by items.
pub fn write_items(w: &mut PacketWriter<'_>, items: &[ItemStack], with_stack_id: bool) -> Result<()> {
    w.write_list("items", items, |w, item| write_item(w, item, with_stack_id))
}

pub fn read_items(r: &mut PacketReader<'_>, with_stack_id: bool) -> Result<Vec<ItemStack>> {
    r.read_list("items", |r| read_item(r, with_stack_id))
}

fn write_short_string_list(w: &mut PacketWriter<'_>, values: &[String]) -> Result<()> {
    let count = i32::try_from(values.len())
        .map_err(|_| CodecError::invalid("item extra data", "too many entries"))?;
    w.write_i32_le(count);
    for value in values {
        w.write_short_string(value)?;
    }
    Ok(())
}

fn read_short_string_list(r: &mut PacketReader<'_>, what: &'static str) -> Result<Vec<String>> {
    let count = r.read_i32_le()?;
    let count = r.check_count(what, count as i64)?;
    let mut values = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        values.push(r.read_short_string()?);
    }
    Ok(values)
}

// Inventory transactions.
//
// Layout: legacy request id (+ request records when non-zero), transaction
// type, slot-change records (always present), then a trailer that only the
// item-use kinds carry.

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::types::item::{read_item, write_item, ItemStack};
use crate::types::math::{BlockCoordinates, Vec3};

const TYPE_NORMAL: u32 = 0;
const TYPE_MISMATCH: u32 = 1;
const TYPE_ITEM_USE: u32 = 2;
const TYPE_ITEM_USE_ON_ENTITY: u32 = 3;
const TYPE_ITEM_RELEASE: u32 = 4;

const SOURCE_CONTAINER: i32 = 0;
const SOURCE_GLOBAL: i32 = 1;
const SOURCE_WORLD_INTERACTION: i32 = 2;
const SOURCE_CREATIVE: i32 = 3;
const SOURCE_CRAFTING: i32 = 99999;

/// Slots the client asked about in the legacy request that preceded this
/// transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestRecord {
    pub container_id: u8,
    pub slots: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionSource {
    Container { inventory_id: i32 },
    Global,
    WorldInteraction { flags: i32 },
    Creative,
    Crafting { action: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub source: TransactionSource,
    pub slot: i32,
    pub old_item: ItemStack,
    pub new_item: ItemStack,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemUseData {
    pub action: u32,
    pub trigger: u32,
    pub position: BlockCoordinates,
    pub face: i32,
    pub slot: i32,
    pub item: ItemStack,
    pub from_position: Vec3,
    pub click_position: Vec3,
    pub block_runtime_id: u32,
    pub client_predicted_result: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemUseOnEntityData {
    pub entity_runtime_id: u64,
    pub action: u32,
    pub slot: i32,
    pub item: ItemStack,
    pub from_position: Vec3,
    pub click_position: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemReleaseData {
    pub action: u32,
    pub slot: i32,
    pub item: ItemStack,
    pub from_position: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum TransactionKind {
    #[default]
    Normal,
    Mismatch,
    ItemUse(ItemUseData),
    ItemUseOnEntity(ItemUseOnEntityData),
    ItemRelease(ItemReleaseData),
}

impl TransactionKind {
    fn type_id(&self) -> u32 {
        match self {
            TransactionKind::Normal => TYPE_NORMAL,
            TransactionKind::Mismatch => TYPE_MISMATCH,
            TransactionKind::ItemUse(_) => TYPE_ITEM_USE,
            TransactionKind::ItemUseOnEntity(_) => TYPE_ITEM_USE_ON_ENTITY,
            TransactionKind::ItemRelease(_) => TYPE_ITEM_RELEASE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transaction {
    pub request_id: i32,
    /// Only sent when `request_id` is non-zero.
    pub request_records: Vec<RequestRecord>,
    pub records: Vec<TransactionRecord>,
    pub kind: TransactionKind,
}

pub fn write_transaction(w: &mut PacketWriter<'_>, t: &Transaction) -> Result<()> {
    w.write_signed_var_int(t.request_id);
    if t.request_id != 0 {
        w.write_list("request records", &t.request_records, |w, record| {
            w.write_u8(record.container_id);
            w.write_count("request slots", record.slots.len())?;
            w.write_bytes(&record.slots);
            Ok(())
        })?;
    }

    w.write_unsigned_var_int(t.kind.type_id());
    w.write_list("transaction records", &t.records, write_record)?;

    match &t.kind {
        TransactionKind::Normal | TransactionKind::Mismatch => {}
        TransactionKind::ItemUse(data) => {
            w.write_unsigned_var_int(data.action);
            w.write_unsigned_var_int(data.trigger);
            w.write_block_coordinates(data.position);
            w.write_signed_var_int(data.face);
            w.write_signed_var_int(data.slot);
            write_item(w, &data.item, true)?;
            w.write_vec3(data.from_position);
            w.write_vec3(data.click_position);
            w.write_unsigned_var_int(data.block_runtime_id);
            w.write_unsigned_var_int(data.client_predicted_result);
        }
        TransactionKind::ItemUseOnEntity(data) => {
            w.write_unsigned_var_long(data.entity_runtime_id);
            w.write_unsigned_var_int(data.action);
            w.write_signed_var_int(data.slot);
            write_item(w, &data.item, true)?;
            w.write_vec3(data.from_position);
            w.write_vec3(data.click_position);
        }
        TransactionKind::ItemRelease(data) => {
            w.write_unsigned_var_int(data.action);
            w.write_signed_var_int(data.slot);
            write_item(w, &data.item, true)?;
            w.write_vec3(data.from_position);
        }
    }
    Ok(())
}

/// Decodes into `t` in place so that records read before an unknown source
/// type survive the error.
pub fn read_transaction_into(r: &mut PacketReader<'_>, t: &mut Transaction) -> Result<()> {
    t.request_id = r.read_signed_var_int()?;
    if t.request_id != 0 {
        t.request_records = r.read_list("request records", |r| {
            let container_id = r.read_u8()?;
            let count = r.read_count("request slots")?;
            Ok(RequestRecord {
                container_id,
                slots: r.take(count)?.to_vec(),
            })
        })?;
    }

    let type_id = r.read_unsigned_var_int()?;
    if type_id > TYPE_ITEM_RELEASE {
        return Err(CodecError::unknown("transaction type", type_id));
    }

    let count = r.read_count("transaction records")?;
    for _ in 0..count {
        t.records.push(read_record(r)?);
    }

    t.kind = match type_id {
        TYPE_NORMAL => TransactionKind::Normal,
        TYPE_MISMATCH => TransactionKind::Mismatch,
        TYPE_ITEM_USE => TransactionKind::ItemUse(ItemUseData {
            action: r.read_unsigned_var_int()?,
            trigger: r.read_unsigned_var_int()?,
            position: r.read_block_coordinates()?,
            face: r.read_signed_var_int()?,
            slot: r.read_signed_var_int()?,
            item: read_item(r, true)?,
            from_position: r.read_vec3()?,
            click_position: r.read_vec3()?,
            block_runtime_id: r.read_unsigned_var_int()?,
            client_predicted_result: r.read_unsigned_var_int()?,
        }),
        TYPE_ITEM_USE_ON_ENTITY => TransactionKind::ItemUseOnEntity(ItemUseOnEntityData {
            entity_runtime_id: r.read_unsigned_var_long()?,
            action: r.read_unsigned_var_int()?,
            slot: r.read_signed_var_int()?,
            item: read_item(r, true)?,
            from_position: r.read_vec3()?,
            click_position: r.read_vec3()?,
        }),
        _ => TransactionKind::ItemRelease(ItemReleaseData {
            action: r.read_unsigned_var_int()?,
            slot: r.read_signed_var_int()?,
            item: read_item(r, true)?,
            from_position: r.read_vec3()?,
        }),
    };
    Ok(())
}

pub fn read_transaction(r: &mut PacketReader<'_>) -> Result<Transaction> {
    let mut t = Transaction::default();
    read_transaction_into(r, &mut t)?;
    Ok(t)
}

fn write_record(w: &mut PacketWriter<'_>, record: &TransactionRecord) -> Result<()> {
    match record.source {
        TransactionSource::Container { inventory_id } => {
            w.write_var_int(SOURCE_CONTAINER);
            w.write_signed_var_int(inventory_id);
        }
        TransactionSource::Global => w.write_var_int(SOURCE_GLOBAL),
        TransactionSource::WorldInteraction { flags } => {
            w.write_var_int(SOURCE_WORLD_INTERACTION);
            w.write_var_int(flags);
        }
        TransactionSource::Creative => w.write_var_int(SOURCE_CREATIVE),
        TransactionSource::Crafting { action } => {
            w.write_var_int(SOURCE_CRAFTING);
            w.write_signed_var_int(action);
        }
    }
    w.write_var_int(record.slot);
    write_item(w, &record.old_item, true)?;
    write_item(w, &record.new_item, true)
}

fn read_record(r: &mut PacketReader<'_>) -> Result<TransactionRecord> {
    let source = match r.read_var_int()? {
        SOURCE_CONTAINER => TransactionSource::Container {
            inventory_id: r.read_signed_var_int()?,
        },
        SOURCE_GLOBAL => TransactionSource::Global,
        SOURCE_WORLD_INTERACTION => TransactionSource::WorldInteraction {
            flags: r.read_var_int()?,
        },
        SOURCE_CREATIVE => TransactionSource::Creative,
        SOURCE_CRAFTING => TransactionSource::Crafting {
            action: r.read_signed_var_int()?,
        },
        other => return Err(CodecError::unknown("inventory source", other)),
    };
    Ok(TransactionRecord {
        source,
        slot: r.read_var_int()?,
        old_item: read_item(r, true)?,
        new_item: read_item(r, true)?,
    })
}

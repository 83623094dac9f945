// Creative inventory content: the tab groups and the items filed under them.
// Neither carries stack net ids.

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::types::item::{read_item, write_item, ItemStack};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreativeGroup {
    pub category: i32,
    pub name: String,
    pub icon: ItemStack,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreativeItem {
    pub entry_id: u32,
    pub item: ItemStack,
    pub group_index: u32,
}

pub fn write_creative_groups(w: &mut PacketWriter<'_>, groups: &[CreativeGroup]) -> Result<()> {
    w.write_list("creative groups", groups, |w, group| {
        w.write_i32_le(group.category);
        w.write_string(&group.name)?;
        write_item(w, &group.icon, false)
    })
}

pub fn read_creative_groups(r: &mut PacketReader<'_>) -> Result<Vec<CreativeGroup>> {
    r.read_list("creative groups", |r| {
        Ok(CreativeGroup {
            category: r.read_i32_le()?,
            name: r.read_string()?,
            icon: read_item(r, false)?,
        })
    })
}

pub fn write_creative_items(w: &mut PacketWriter<'_>, items: &[CreativeItem]) -> Result<()> {
    w.write_list("creative items", items, |w, entry| {
        w.write_unsigned_var_int(entry.entry_id);
        write_item(w, &entry.item, false)?;
        w.write_unsigned_var_int(entry.group_index);
        Ok(())
    })
}

pub fn read_creative_items(r: &mut PacketReader<'_>) -> Result<Vec<CreativeItem>> {
    r.read_list("creative items", |r| {
        Ok(CreativeItem {
            entry_id: r.read_unsigned_var_int()?,
            item: read_item(r, false)?,
            group_index: r.read_unsigned_var_int()?,
        })
    })
}

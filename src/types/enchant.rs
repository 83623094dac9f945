use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Enchant {
    pub id: u8,
    pub level: u8,
}

/// One of the three choices shown by an enchanting table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnchantOption {
    pub cost: u32,
    pub flags: i32,
    pub equip_activated: Vec<Enchant>,
    pub held_activated: Vec<Enchant>,
    pub self_activated: Vec<Enchant>,
    pub name: String,
    pub option_id: i32,
}

fn write_enchants(w: &mut PacketWriter<'_>, enchants: &[Enchant]) -> Result<()> {
    w.write_list("enchants", enchants, |w, e| {
        w.write_u8(e.id);
        w.write_u8(e.level);
        Ok(())
    })
}

fn read_enchants(r: &mut PacketReader<'_>) -> Result<Vec<Enchant>> {
    r.read_list("enchants", |r| {
        Ok(Enchant {
            id: r.read_u8()?,
            level: r.read_u8()?,
        })
    })
}

pub fn write_enchant_options(w: &mut PacketWriter<'_>, options: &[EnchantOption]) -> Result<()> {
    w.write_list("enchant options", options, |w, option| {
        w.write_unsigned_var_int(option.cost);
        w.write_i32_le(option.flags);
        write_enchants(w, &option.equip_activated)?;
        write_enchants(w, &option.held_activated)?;
        write_enchants(w, &option.self_activated)?;
        w.write_string(&option.name)?;
        w.write_var_int(option.option_id);
        Ok(())
    })
}

pub fn read_enchant_options(r: &mut PacketReader<'_>) -> Result<Vec<EnchantOption>> {
    r.read_list("enchant options", |r| {
        Ok(EnchantOption {
            cost: r.read_unsigned_var_int()?,
            flags: r.read_i32_le()?,
            equip_activated: read_enchants(r)?,
            held_activated: read_enchants(r)?,
            self_activated: read_enchants(r)?,
            name: r.read_string()?,
            option_id: r.read_var_int()?,
        })
    })
}

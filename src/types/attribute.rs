use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeModifier {
    pub id: String,
    pub name: String,
    pub amount: f32,
    pub operation: i32,
    pub operand: i32,
    pub serializable: bool,
}

/// Attribute as sent to the owning player (movement speed, health, hunger...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerAttribute {
    pub name: String,
    pub min_value: f32,
    pub max_value: f32,
    pub value: f32,
    pub default_min_value: f32,
    pub default_max_value: f32,
    pub default_value: f32,
    pub modifiers: Vec<AttributeModifier>,
}

/// Reduced form used when spawning other entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityAttribute {
    pub name: String,
    pub min_value: f32,
    pub value: f32,
    pub max_value: f32,
}

pub fn write_player_attributes(w: &mut PacketWriter<'_>, attributes: &[PlayerAttribute]) -> Result<()> {
    w.write_list("player attributes", attributes, |w, a| {
        w.write_f32_le(a.min_value);
        w.write_f32_le(a.max_value);
        w.write_f32_le(a.value);
        w.write_f32_le(a.default_min_value);
        w.write_f32_le(a.default_max_value);
        w.write_f32_le(a.default_value);
        w.write_string(&a.name)?;
        w.write_list("attribute modifiers", &a.modifiers, |w, m| {
            w.write_string(&m.id)?;
            w.write_string(&m.name)?;
            w.write_f32_le(m.amount);
            w.write_i32_le(m.operation);
            w.write_i32_le(m.operand);
            w.write_bool(m.serializable);
            Ok(())
        })
    })
}

pub fn read_player_attributes(r: &mut PacketReader<'_>) -> Result<Vec<PlayerAttribute>> {
    r.read_list("player attributes", |r| {
        Ok(PlayerAttribute {
            min_value: r.read_f32_le()?,
            max_value: r.read_f32_le()?,
            value: r.read_f32_le()?,
            default_min_value: r.read_f32_le()?,
            default_max_value: r.read_f32_le()?,
            default_value: r.read_f32_le()?,
            name: r.read_string()?,
            modifiers: r.read_list("attribute modifiers", |r| {
                Ok(AttributeModifier {
                    id: r.read_string()?,
                    name: r.read_string()?,
                    amount: r.read_f32_le()?,
                    operation: r.read_i32_le()?,
                    operand: r.read_i32_le()?,
                    serializable: r.read_bool()?,
                })
            })?,
        })
    })
}

pub fn write_entity_attributes(w: &mut PacketWriter<'_>, attributes: &[EntityAttribute]) -> Result<()> {
    w.write_list("entity attributes", attributes, |w, a| {
        w.write_string(&a.name)?;
        w.write_f32_le(a.min_value);
        w.write_f32_le(a.value);
        w.write_f32_le(a.max_value);
        Ok(())
    })
}

pub fn read_entity_attributes(r: &mut PacketReader<'_>) -> Result<Vec<EntityAttribute>> {
    r.read_list("entity attributes", |r| {
        Ok(EntityAttribute {
            name: r.read_string()?,
            min_value: r.read_f32_le()?,
            value: r.read_f32_le()?,
            max_value: r.read_f32_le()?,
        })
    })
}

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GameRuleValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRule {
    pub name: String,
    pub player_modifiable: bool,
    pub value: GameRuleValue,
}

impl GameRule {
    pub fn new(name: impl Into<String>, value: GameRuleValue) -> Self {
        Self {
            name: name.into(),
            player_modifiable: false,
            value,
        }
    }
}

pub fn write_game_rules(w: &mut PacketWriter<'_>, rules: &[GameRule]) -> Result<()> {
    w.write_var_int(rules.len() as i32);
    for rule in rules {
        // Names always go out lower-cased.
        w.write_string(&rule.name.to_lowercase())?;
        w.write_bool(rule.player_modifiable);
        match rule.value {
            GameRuleValue::Bool(v) => {
                w.write_unsigned_var_int(1);
                w.write_bool(v);
            }
            GameRuleValue::Int(v) => {
                w.write_unsigned_var_int(2);
                w.write_var_int(v);
            }
            GameRuleValue::Float(v) => {
                w.write_unsigned_var_int(3);
                w.write_f32_le(v);
            }
        }
    }
    Ok(())
}

/// Rules decoded before an unknown value type are pushed into `rules`.
pub fn read_game_rules_into(r: &mut PacketReader<'_>, rules: &mut Vec<GameRule>) -> Result<()> {
    let count = r.read_var_int()?;
    let count = r.check_count("game rules", count as i64)?;
    for _ in 0..count {
        let name = r.read_string()?;
        let player_modifiable = r.read_bool()?;
        let value = match r.read_unsigned_var_int()? {
            1 => GameRuleValue::Bool(r.read_bool()?),
            2 => GameRuleValue::Int(r.read_var_int()?),
            3 => GameRuleValue::Float(r.read_f32_le()?),
            other => return Err(CodecError::unknown("game rule type", other)),
        };
        rules.push(GameRule {
            name,
            player_modifiable,
            value,
        });
    }
    Ok(())
}

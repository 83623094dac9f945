use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};

const EVENT_ADD_BOSS: u32 = 0;
const EVENT_ADD_PLAYER: u32 = 1;
const EVENT_REMOVE_BOSS: u32 = 2;
const EVENT_REMOVE_PLAYER: u32 = 3;
const EVENT_UPDATE_PROGRESS: u32 = 4;
const EVENT_UPDATE_NAME: u32 = 5;
const EVENT_UPDATE_OPTIONS: u32 = 6;
const EVENT_UPDATE_STYLE: u32 = 7;
const EVENT_QUERY: u32 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BossStyle {
    pub color: u32,
    pub overlay: u32,
}

/// Payload of a boss bar event, keyed by the event type.
///
/// `reserved` is a u16 of unknown meaning that clients send with option
/// updates; it is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum BossEvent {
    AddBoss {
        title: String,
        health_percent: f32,
        reserved: u16,
        style: BossStyle,
    },
    AddPlayer { player_id: i64 },
    #[default]
    RemoveBoss,
    RemovePlayer { player_id: i64 },
    UpdateProgress { health_percent: f32 },
    UpdateName { title: String },
    UpdateOptions { reserved: u16, style: BossStyle },
    UpdateStyle { style: BossStyle },
    Query { player_id: i64 },
}

impl BossEvent {
    pub fn type_id(&self) -> u32 {
        match self {
            BossEvent::AddBoss { .. } => EVENT_ADD_BOSS,
            BossEvent::AddPlayer { .. } => EVENT_ADD_PLAYER,
            BossEvent::RemoveBoss => EVENT_REMOVE_BOSS,
            BossEvent::RemovePlayer { .. } => EVENT_REMOVE_PLAYER,
            BossEvent::UpdateProgress { .. } => EVENT_UPDATE_PROGRESS,
            BossEvent::UpdateName { .. } => EVENT_UPDATE_NAME,
            BossEvent::UpdateOptions { .. } => EVENT_UPDATE_OPTIONS,
            BossEvent::UpdateStyle { .. } => EVENT_UPDATE_STYLE,
            BossEvent::Query { .. } => EVENT_QUERY,
        }
    }
}

fn write_style(w: &mut PacketWriter<'_>, style: &BossStyle) {
    w.write_unsigned_var_int(style.color);
    w.write_unsigned_var_int(style.overlay);
}

fn read_style(r: &mut PacketReader<'_>) -> Result<BossStyle> {
    Ok(BossStyle {
        color: r.read_unsigned_var_int()?,
        overlay: r.read_unsigned_var_int()?,
    })
}

/// Writes the event type followed by its payload.
pub fn write_boss_event(w: &mut PacketWriter<'_>, event: &BossEvent) -> Result<()> {
    w.write_unsigned_var_int(event.type_id());
    match event {
        BossEvent::AddBoss {
            title,
            health_percent,
            reserved,
            style,
        } => {
            w.write_string(title)?;
            w.write_f32_le(*health_percent);
            w.write_u16_le(*reserved);
            write_style(w, style);
        }
        BossEvent::AddPlayer { player_id }
        | BossEvent::RemovePlayer { player_id }
        | BossEvent::Query { player_id } => w.write_signed_var_long(*player_id),
        BossEvent::RemoveBoss => {}
        BossEvent::UpdateProgress { health_percent } => w.write_f32_le(*health_percent),
        BossEvent::UpdateName { title } => w.write_string(title)?,
        BossEvent::UpdateOptions { reserved, style } => {
            w.write_u16_le(*reserved);
            write_style(w, style);
        }
        BossEvent::UpdateStyle { style } => write_style(w, style),
    }
    Ok(())
}

pub fn read_boss_event(r: &mut PacketReader<'_>) -> Result<BossEvent> {
    Ok(match r.read_unsigned_var_int()? {
        EVENT_ADD_BOSS => BossEvent::AddBoss {
            title: r.read_string()?,
            health_percent: r.read_f32_le()?,
            reserved: r.read_u16_le()?,
            style: read_style(r)?,
        },
        EVENT_ADD_PLAYER => BossEvent::AddPlayer {
            player_id: r.read_signed_var_long()?,
        },
        EVENT_REMOVE_BOSS => BossEvent::RemoveBoss,
        EVENT_REMOVE_PLAYER => BossEvent::RemovePlayer {
            player_id: r.read_signed_var_long()?,
        },
        EVENT_UPDATE_PROGRESS => BossEvent::UpdateProgress {
            health_percent: r.read_f32_le()?,
        },
        EVENT_UPDATE_NAME => BossEvent::UpdateName {
            title: r.read_string()?,
        },
        EVENT_UPDATE_OPTIONS => BossEvent::UpdateOptions {
            reserved: r.read_u16_le()?,
            style: read_style(r)?,
        },
        EVENT_UPDATE_STYLE => BossEvent::UpdateStyle {
            style: read_style(r)?,
        },
        EVENT_QUERY => BossEvent::Query {
            player_id: r.read_signed_var_long()?,
        },
        other => return Err(CodecError::unknown("boss event type", other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodecContext;

    #[test]
    fn test_every_event_round_trips() {
        let ctx = CodecContext::default();
        let style = BossStyle {
            color: 0xff00ff00,
            overlay: 0xff00ff00,
        };
        let events = vec![
            BossEvent::AddBoss {
                title: "Wither".to_string(),
                health_percent: 1.0,
                reserved: 0xbeef,
                style,
            },
            BossEvent::AddPlayer { player_id: -9 },
            BossEvent::RemoveBoss,
            BossEvent::RemovePlayer { player_id: 9 },
            BossEvent::UpdateProgress {
                health_percent: 0.5,
            },
            BossEvent::UpdateName {
                title: "Ender Dragon".to_string(),
            },
            BossEvent::UpdateOptions { reserved: 1, style },
            BossEvent::UpdateStyle { style },
            BossEvent::Query { player_id: 1 },
        ];
        for (expected_type, event) in events.iter().enumerate() {
            let mut w = PacketWriter::new(&ctx);
            write_boss_event(&mut w, event).unwrap();
            let bytes = w.into_bytes();
            assert_eq!(bytes[0] as usize, expected_type);
            let mut r = PacketReader::new(&bytes, &ctx);
            assert_eq!(&read_boss_event(&mut r).unwrap(), event);
            assert!(!r.has_remaining());
        }
    }

    #[test]
    fn test_unknown_event_type() {
        let ctx = CodecContext::default();
        let bytes = [42];
        let mut r = PacketReader::new(&bytes, &ctx);
        assert!(read_boss_event(&mut r).unwrap_err().is_recoverable());
    }
}

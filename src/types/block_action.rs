use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::types::math::BlockCoordinates;

pub const ACTION_START_BREAK: i32 = 0;
pub const ACTION_ABORT_BREAK: i32 = 1;
pub const ACTION_STOP_BREAK: i32 = 2;
pub const ACTION_CRACK_BREAK: i32 = 18;
pub const ACTION_PREDICT_BREAK: i32 = 26;
pub const ACTION_CONTINUE_BREAK: i32 = 27;

/// A block interaction reported inside auth input. Only the break-related
/// actions carry a position and face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerBlockAction {
    pub action: i32,
    pub position: BlockCoordinates,
    pub face: i32,
}

impl PlayerBlockAction {
    pub fn has_position(&self) -> bool {
        action_has_position(self.action)
    }
}

fn action_has_position(action: i32) -> bool {
    matches!(
        action,
        ACTION_START_BREAK
            | ACTION_ABORT_BREAK
            | ACTION_STOP_BREAK
            | ACTION_CRACK_BREAK
            | ACTION_PREDICT_BREAK
            | ACTION_CONTINUE_BREAK
    )
}

/// Signed-varint count, then per action the signed-varint action id and, for
/// break actions, signed-varint x/y/z plus a varint face.
pub fn write_block_actions(w: &mut PacketWriter<'_>, actions: &[PlayerBlockAction]) -> Result<()> {
    let count = i32::try_from(actions.len()).map_err(|_| CodecError::LengthLimit {
        what: "block actions",
        length: actions.len() as u64,
        limit: i32::MAX as u64,
    })?;
    w.write_signed_var_int(count);
    for action in actions {
        w.write_signed_var_int(action.action);
        if action.has_position() {
            w.write_signed_var_int(action.position.x);
            w.write_signed_var_int(action.position.y);
            w.write_signed_var_int(action.position.z);
            w.write_var_int(action.face);
        }
    }
    Ok(())
}

pub fn read_block_actions(r: &mut PacketReader<'_>) -> Result<Vec<PlayerBlockAction>> {
    let count = r.read_signed_var_int()?;
    let count = r.check_count("block actions", count as i64)?;
    let mut actions = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        let action = r.read_signed_var_int()?;
        let mut entry = PlayerBlockAction {
            action,
            ..Default::default()
        };
        if action_has_position(action) {
            entry.position = BlockCoordinates::new(
                r.read_signed_var_int()?,
                r.read_signed_var_int()?,
                r.read_signed_var_int()?,
            );
            entry.face = r.read_var_int()?;
        }
        actions.push(entry);
    }
    Ok(actions)
}

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::packet::Packet;
use crate::types::block_action::{read_block_actions, write_block_actions, PlayerBlockAction};
use crate::types::math::{Vec2, Vec3};
use crate::types::stack_request::{read_request_into, write_request, StackRequest};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum MoveMode {
    #[default]
    Normal = 0,
    Reset = 1,
    Teleport = 2,
    Rotation = 3,
}

impl TryFrom<u8> for MoveMode {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MoveMode::Normal),
            1 => Ok(MoveMode::Reset),
            2 => Ok(MoveMode::Teleport),
            3 => Ok(MoveMode::Rotation),
            other => Err(CodecError::unknown("move mode", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeleportInfo {
    pub cause: i32,
    pub source_entity_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovePlayer {
    pub runtime_entity_id: u64,
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub head_yaw: f32,
    pub mode: MoveMode,
    pub on_ground: bool,
    pub riding_runtime_entity_id: u64,
    /// Sent only for `MoveMode::Teleport`.
    pub teleport: TeleportInfo,
    pub tick: u64,
}

impl Packet for MovePlayer {
    const ID: u32 = 0x13;
    const NAME: &'static str = "MovePlayer";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_unsigned_var_long(self.runtime_entity_id);
        w.write_vec3(self.position);
        w.write_f32_le(self.pitch);
        w.write_f32_le(self.yaw);
        w.write_f32_le(self.head_yaw);
        w.write_u8(self.mode as u8);
        w.write_bool(self.on_ground);
        w.write_unsigned_var_long(self.riding_runtime_entity_id);
        if self.mode == MoveMode::Teleport {
            w.write_i32_le(self.teleport.cause);
            w.write_i32_le(self.teleport.source_entity_type);
        }
        w.write_unsigned_var_long(self.tick);
        Ok(())
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.runtime_entity_id = r.read_unsigned_var_long()?;
        self.position = r.read_vec3()?;
        self.pitch = r.read_f32_le()?;
        self.yaw = r.read_f32_le()?;
        self.head_yaw = r.read_f32_le()?;
        self.mode = MoveMode::try_from(r.read_u8()?)?;
        self.on_ground = r.read_bool()?;
        self.riding_runtime_entity_id = r.read_unsigned_var_long()?;
        if self.mode == MoveMode::Teleport {
            self.teleport = TeleportInfo {
                cause: r.read_i32_le()?,
                source_entity_type: r.read_i32_le()?,
            };
        }
        self.tick = r.read_unsigned_var_long()?;
        Ok(())
    }
}

pub const INPUT_PERFORM_ITEM_INTERACTION: u64 = 1 << 34;
pub const INPUT_PERFORM_BLOCK_ACTIONS: u64 = 1 << 35;
pub const INPUT_PERFORM_ITEM_STACK_REQUEST: u64 = 1 << 36;

/// Per-tick client input. The stack request and block actions are present
/// only when their flag bit is set in `input_flags`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerAuthInput {
    pub pitch: f32,
    pub yaw: f32,
    pub position: Vec3,
    pub move_vector: Vec2,
    pub head_yaw: f32,
    pub input_flags: u64,
    pub input_mode: u32,
    pub play_mode: u32,
    pub interaction_model: u32,
    pub interact_rotation: Vec2,
    pub tick: u64,
    pub delta: Vec3,
    pub item_stack_request: Option<StackRequest>,
    pub block_actions: Vec<PlayerBlockAction>,
    pub analog_move_vector: Vec2,
    pub camera_orientation: Vec3,
    pub raw_move_vector: Vec2,
}

impl PlayerAuthInput {
    pub fn has_flag(&self, flag: u64) -> bool {
        self.input_flags & flag != 0
    }
}

impl Packet for PlayerAuthInput {
    const ID: u32 = 0x90;
    const NAME: &'static str = "PlayerAuthInput";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        let mut flags = self.input_flags & !(INPUT_PERFORM_ITEM_STACK_REQUEST | INPUT_PERFORM_BLOCK_ACTIONS);
        if self.item_stack_request.is_some() {
            flags |= INPUT_PERFORM_ITEM_STACK_REQUEST;
        }
        if !self.block_actions.is_empty() {
            flags |= INPUT_PERFORM_BLOCK_ACTIONS;
        }

        w.write_vec2(Vec2::new(self.pitch, self.yaw));
        w.write_vec3(self.position);
        w.write_vec2(self.move_vector);
        w.write_f32_le(self.head_yaw);
        w.write_unsigned_var_long(flags);
        w.write_unsigned_var_int(self.input_mode);
        w.write_unsigned_var_int(self.play_mode);
        w.write_unsigned_var_int(self.interaction_model);
        w.write_vec2(self.interact_rotation);
        w.write_unsigned_var_long(self.tick);
        w.write_vec3(self.delta);
        if let Some(request) = &self.item_stack_request {
            write_request(w, request)?;
        }
        if !self.block_actions.is_empty() {
            write_block_actions(w, &self.block_actions)?;
        }
        w.write_vec2(self.analog_move_vector);
        w.write_vec3(self.camera_orientation);
        w.write_vec2(self.raw_move_vector);
        Ok(())
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        let rotation = r.read_vec2()?;
        self.pitch = rotation.x;
        self.yaw = rotation.y;
        self.position = r.read_vec3()?;
        self.move_vector = r.read_vec2()?;
        self.head_yaw = r.read_f32_le()?;
        self.input_flags = r.read_unsigned_var_long()?;
        self.input_mode = r.read_unsigned_var_int()?;
        self.play_mode = r.read_unsigned_var_int()?;
        self.interaction_model = r.read_unsigned_var_int()?;
        self.interact_rotation = r.read_vec2()?;
        self.tick = r.read_unsigned_var_long()?;
        self.delta = r.read_vec3()?;
        if self.has_flag(INPUT_PERFORM_ITEM_STACK_REQUEST) {
            let request = self.item_stack_request.insert(StackRequest::default());
            read_request_into(r, request)?;
        }
        if self.has_flag(INPUT_PERFORM_BLOCK_ACTIONS) {
            self.block_actions = read_block_actions(r)?;
        }
        self.analog_move_vector = r.read_vec2()?;
        self.camera_orientation = r.read_vec3()?;
        self.raw_move_vector = r.read_vec2()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodecContext;
    use crate::packet::{decode_packet, encode_packet, Envelope};
    use crate::types::block_action::ACTION_START_BREAK;
    use crate::types::math::BlockCoordinates;
    use crate::types::stack_request::{StackRequestAction, StackRequestSlotInfo};

    #[test]
    fn test_move_player_end_to_end() {
        let ctx = CodecContext::default();
        let envelope = Envelope::new(MovePlayer {
            runtime_entity_id: 1,
            position: Vec3::new(12.5, 64.0, -8.25),
            yaw: 90.0,
            head_yaw: 90.0,
            on_ground: true,
            ..Default::default()
        });
        let bytes = envelope.encode(&ctx).unwrap();
        assert_eq!(bytes[0], 0x13);

        let (decoded, report) = Envelope::<MovePlayer>::decode(&bytes, &ctx).unwrap();
        let p = decoded.packet();
        assert!((p.position.x - 12.5).abs() < f32::EPSILON);
        assert!((p.position.y - 64.0).abs() < f32::EPSILON);
        assert!((p.position.z + 8.25).abs() < f32::EPSILON);
        assert!((p.yaw - 90.0).abs() < f32::EPSILON);
        assert_eq!(p, envelope.packet());
        assert_eq!(report.consumed, bytes.len());
        assert!(report.is_clean());
    }

    #[test]
    fn test_teleport_fields_only_in_teleport_mode() {
        let ctx = CodecContext::default();
        let normal = MovePlayer::default();
        let teleport = MovePlayer {
            mode: MoveMode::Teleport,
            teleport: TeleportInfo {
                cause: 2,
                source_entity_type: 0,
            },
            ..Default::default()
        };
        let normal_len = encode_packet(&normal, &ctx).unwrap().len();
        let bytes = encode_packet(&teleport, &ctx).unwrap();
        assert_eq!(bytes.len(), normal_len + 8);
        let (decoded, _) = decode_packet::<MovePlayer>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, teleport);
    }

    #[test]
    fn test_auth_input_optional_sections() {
        let ctx = CodecContext::default();
        let slot = StackRequestSlotInfo {
            container_id: 12,
            dynamic_id: 0,
            slot: 3,
            stack_net_id: 5,
        };
        let packet = PlayerAuthInput {
            pitch: 10.0,
            yaw: -45.0,
            position: Vec3::new(1.0, 2.0, 3.0),
            input_flags: INPUT_PERFORM_ITEM_STACK_REQUEST | INPUT_PERFORM_BLOCK_ACTIONS | 1,
            input_mode: 1,
            tick: 4000,
            item_stack_request: Some(StackRequest {
                request_id: -3,
                actions: vec![StackRequestAction::Swap {
                    source: slot,
                    destination: slot,
                }],
                ..Default::default()
            }),
            block_actions: vec![PlayerBlockAction {
                action: ACTION_START_BREAK,
                position: BlockCoordinates::new(4, 5, 6),
                face: 2,
            }],
            camera_orientation: Vec3::new(0.0, 0.0, 1.0),
            ..Default::default()
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, report) = decode_packet::<PlayerAuthInput>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
        assert!(report.is_clean());
    }

    #[test]
    fn test_auth_input_flags_follow_content() {
        let ctx = CodecContext::default();
        // Flag set but nothing to send: the bit is cleared on the wire.
        let packet = PlayerAuthInput {
            input_flags: INPUT_PERFORM_BLOCK_ACTIONS,
            ..Default::default()
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, report) = decode_packet::<PlayerAuthInput>(&bytes, &ctx).unwrap();
        assert_eq!(decoded.input_flags, 0);
        assert!(report.is_clean());
    }
}

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::packet::Packet;
use crate::types::attribute::{read_player_attributes, write_player_attributes, PlayerAttribute};
use crate::types::boss::{read_boss_event, write_boss_event, BossEvent};
use crate::types::entity::{
    read_ability_layers, read_entity_link, write_ability_layers, write_entity_link, AbilityLayer,
    EntityLink,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateAttributes {
    pub runtime_entity_id: u64,
    pub attributes: Vec<PlayerAttribute>,
    pub tick: u64,
}

impl Packet for UpdateAttributes {
    const ID: u32 = 0x1d;
    const NAME: &'static str = "UpdateAttributes";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_unsigned_var_long(self.runtime_entity_id);
        write_player_attributes(w, &self.attributes)?;
        w.write_unsigned_var_long(self.tick);
        Ok(())
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.runtime_entity_id = r.read_unsigned_var_long()?;
        self.attributes = read_player_attributes(r)?;
        self.tick = r.read_unsigned_var_long()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetEntityLink {
    pub link: EntityLink,
}

impl Packet for SetEntityLink {
    const ID: u32 = 0x29;
    const NAME: &'static str = "SetEntityLink";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        write_entity_link(w, &self.link);
        Ok(())
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.link = read_entity_link(r)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateAbilities {
    pub entity_unique_id: i64,
    pub permission_level: u8,
    pub command_permission_level: u8,
    pub layers: Vec<AbilityLayer>,
}

impl Packet for UpdateAbilities {
    const ID: u32 = 0xbb;
    const NAME: &'static str = "UpdateAbilities";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_i64_le(self.entity_unique_id);
        w.write_u8(self.permission_level);
        w.write_u8(self.command_permission_level);
        write_ability_layers(w, &self.layers)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.entity_unique_id = r.read_i64_le()?;
        self.permission_level = r.read_u8()?;
        self.command_permission_level = r.read_u8()?;
        self.layers = read_ability_layers(r)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BossEventPacket {
    pub boss_entity_id: i64,
    pub event: BossEvent,
}

impl Packet for BossEventPacket {
    const ID: u32 = 0x4a;
    const NAME: &'static str = "BossEvent";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_signed_var_long(self.boss_entity_id);
        write_boss_event(w, &self.event)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.boss_entity_id = r.read_signed_var_long()?;
        self.event = read_boss_event(r)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodecContext;
    use crate::packet::{decode_packet, encode_packet};
    use crate::types::attribute::AttributeModifier;
    use crate::types::boss::BossStyle;
    use crate::types::entity::EntityLinkType;

    #[test]
    fn test_update_attributes() {
        let ctx = CodecContext::default();
        let packet = UpdateAttributes {
            runtime_entity_id: 1,
            attributes: vec![PlayerAttribute {
                name: "minecraft:movement".to_string(),
                min_value: 0.0,
                max_value: f32::MAX,
                value: 0.1,
                default_min_value: 0.0,
                default_max_value: f32::MAX,
                default_value: 0.1,
                modifiers: vec![AttributeModifier {
                    id: "sprint".to_string(),
                    name: "Sprinting speed boost".to_string(),
                    amount: 0.3,
                    operation: 2,
                    operand: 2,
                    serializable: false,
                }],
            }],
            tick: 77,
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, report) = decode_packet::<UpdateAttributes>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
        assert!(report.is_clean());
    }

    #[test]
    fn test_set_entity_link() {
        let ctx = CodecContext::default();
        let packet = SetEntityLink {
            link: EntityLink {
                from_entity_id: 10,
                to_entity_id: -2,
                link_type: EntityLinkType::Rider,
                immediate: true,
                caused_by_rider: false,
                vehicle_angular_velocity: 0.5,
            },
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, _) = decode_packet::<SetEntityLink>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_update_abilities_unique_id_is_fixed_width() {
        let ctx = CodecContext::default();
        let packet = UpdateAbilities {
            entity_unique_id: -1,
            permission_level: 1,
            command_permission_level: 0,
            layers: vec![AbilityLayer {
                layer_type: 1,
                abilities: 0x3ffff,
                values: 0x1ff,
                fly_speed: 0.05,
                walk_speed: 0.1,
                vertical_fly_speed: 1.0,
            }],
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        // 0xbb needs a two-byte header.
        assert_eq!(&bytes[2..10], &[0xff; 8]);
        let (decoded, _) = decode_packet::<UpdateAbilities>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_boss_event_packet() {
        let ctx = CodecContext::default();
        let packet = BossEventPacket {
            boss_entity_id: 99,
            event: BossEvent::AddBoss {
                title: "Wither".to_string(),
                health_percent: 1.0,
                reserved: 1,
                style: BossStyle {
                    color: 5,
                    overlay: 0,
                },
            },
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, report) = decode_packet::<BossEventPacket>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
        assert!(report.is_clean());
    }
}

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum EntityLinkType {
    #[default]
    Remove = 0,
    Rider = 1,
    Passenger = 2,
}

impl TryFrom<u8> for EntityLinkType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(EntityLinkType::Remove),
            1 => Ok(EntityLinkType::Rider),
            2 => Ok(EntityLinkType::Passenger),
            other => Err(CodecError::unknown("entity link type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EntityLink {
    pub from_entity_id: i64,
    pub to_entity_id: i64,
    pub link_type: EntityLinkType,
    pub immediate: bool,
    pub caused_by_rider: bool,
    pub vehicle_angular_velocity: f32,
}

pub fn write_entity_link(w: &mut PacketWriter<'_>, link: &EntityLink) {
    w.write_var_long(link.from_entity_id);
    w.write_var_long(link.to_entity_id);
    w.write_u8(link.link_type as u8);
    w.write_bool(link.immediate);
    w.write_bool(link.caused_by_rider);
    w.write_f32_le(link.vehicle_angular_velocity);
}

pub fn read_entity_link(r: &mut PacketReader<'_>) -> Result<EntityLink> {
    Ok(EntityLink {
        from_entity_id: r.read_var_long()?,
        to_entity_id: r.read_var_long()?,
        link_type: EntityLinkType::try_from(r.read_u8()?)?,
        immediate: r.read_bool()?,
        caused_by_rider: r.read_bool()?,
        vehicle_angular_velocity: r.read_f32_le()?,
    })
}

pub fn write_entity_links(w: &mut PacketWriter<'_>, links: &[EntityLink]) -> Result<()> {
    w.write_list("entity links", links, |w, link| {
        write_entity_link(w, link);
        Ok(())
    })
}

pub fn read_entity_links(r: &mut PacketReader<'_>) -> Result<Vec<EntityLink>> {
    r.read_list("entity links", read_entity_link)
}

/// One layer of player abilities. `abilities` is the set mask and `values`
/// the per-ability values under it; both are 32-bit flag words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AbilityLayer {
    pub layer_type: u16,
    pub abilities: u32,
    pub values: u32,
    pub fly_speed: f32,
    pub walk_speed: f32,
    pub vertical_fly_speed: f32,
}

/// Layers go out behind a single-byte count.
pub fn write_ability_layers(w: &mut PacketWriter<'_>, layers: &[AbilityLayer]) -> Result<()> {
    let count = u8::try_from(layers.len()).map_err(|_| CodecError::LengthLimit {
        what: "ability layers",
        length: layers.len() as u64,
        limit: u8::MAX as u64,
    })?;
    w.write_u8(count);
    for layer in layers {
        w.write_u16_le(layer.layer_type);
        w.write_u32_le(layer.abilities);
        w.write_u32_le(layer.values);
        w.write_f32_le(layer.fly_speed);
        w.write_f32_le(layer.walk_speed);
        w.write_f32_le(layer.vertical_fly_speed);
    }
    Ok(())
}

pub fn read_ability_layers(r: &mut PacketReader<'_>) -> Result<Vec<AbilityLayer>> {
    let count = r.read_u8()?;
    (0..count)
        .map(|_| {
            Ok(AbilityLayer {
                layer_type: r.read_u16_le()?,
                abilities: r.read_u32_le()?,
                values: r.read_u32_le()?,
                fly_speed: r.read_f32_le()?,
                walk_speed: r.read_f32_le()?,
                vertical_fly_speed: r.read_f32_le()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodecContext;

    #[test]
    fn test_links_round_trip() {
        let ctx = CodecContext::default();
        let links = vec![
            EntityLink {
                from_entity_id: 1,
                to_entity_id: -2,
                link_type: EntityLinkType::Rider,
                immediate: true,
                caused_by_rider: false,
                vehicle_angular_velocity: 0.25,
            },
            EntityLink::default(),
        ];
        let mut w = PacketWriter::new(&ctx);
        write_entity_links(&mut w, &links).unwrap();
        let bytes = w.into_bytes();
        let mut r = PacketReader::new(&bytes, &ctx);
        assert_eq!(read_entity_links(&mut r).unwrap(), links);
        assert!(!r.has_remaining());
    }

    #[test]
    fn test_unknown_link_type() {
        let ctx = CodecContext::default();
        let bytes = [1, 1, 7, 0, 0, 0, 0, 0, 0];
        let mut r = PacketReader::new(&bytes, &ctx);
        let err = read_entity_link(&mut r).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_ability_layer_reserved_values_preserved() {
        let ctx = CodecContext::default();
        let layers = vec![AbilityLayer {
            layer_type: 1,
            abilities: 0x3_ffff,
            values: 0xdead_beef,
            fly_speed: 0.05,
            walk_speed: 0.1,
            vertical_fly_speed: 1.0,
        }];
        let mut w = PacketWriter::new(&ctx);
        write_ability_layers(&mut w, &layers).unwrap();
        assert_eq!(w.len(), 1 + 2 + 4 + 4 + 12);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[7..11], &0xdead_beefu32.to_le_bytes());
        let mut r = PacketReader::new(&bytes, &ctx);
        assert_eq!(read_ability_layers(&mut r).unwrap(), layers);
    }
}

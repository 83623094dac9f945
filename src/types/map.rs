// Map item data.
//
// Sections are gated on the update flags: initialisation carries the list of
// map ids this update covers, decoration carries tracked objects and icons,
// texture carries a window of ARGB pixels.

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::types::math::BlockCoordinates;

pub const FLAG_TEXTURE: u32 = 0x02;
pub const FLAG_DECORATION: u32 = 0x04;
pub const FLAG_INITIALISATION: u32 = 0x08;

const TRACKED_ENTITY: i32 = 0;
const TRACKED_BLOCK: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackedObject {
    Entity { unique_id: i64 },
    Block { position: BlockCoordinates },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapDecoration {
    pub icon: u8,
    pub rotation: u8,
    pub x: u8,
    pub z: u8,
    pub label: String,
    pub color: u32,
}

/// A rectangular pixel update. `pixels` is row-major, `width * height` long.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapTexture {
    pub width: i32,
    pub height: i32,
    pub x_offset: i32,
    pub z_offset: i32,
    pub pixels: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapInfo {
    pub map_id: i64,
    pub update_flags: u32,
    pub dimension: u8,
    pub locked: bool,
    pub origin: BlockCoordinates,
    pub included_map_ids: Vec<i64>,
    pub scale: u8,
    pub tracked_objects: Vec<TrackedObject>,
    pub decorations: Vec<MapDecoration>,
    pub texture: MapTexture,
}

impl MapInfo {
    fn has(&self, flag: u32) -> bool {
        self.update_flags & flag != 0
    }
}

fn scale_present(flags: u32) -> bool {
    flags & (FLAG_INITIALISATION | FLAG_DECORATION | FLAG_TEXTURE) != 0
}

pub fn write_map_info(w: &mut PacketWriter<'_>, map: &MapInfo) -> Result<()> {
    w.write_signed_var_long(map.map_id);
    w.write_unsigned_var_int(map.update_flags);
    w.write_u8(map.dimension);
    w.write_bool(map.locked);
    w.write_block_coordinates(map.origin);

    if map.has(FLAG_INITIALISATION) {
        w.write_list("included map ids", &map.included_map_ids, |w, id| {
            w.write_signed_var_long(*id);
            Ok(())
        })?;
    }
    if scale_present(map.update_flags) {
        w.write_u8(map.scale);
    }
    if map.has(FLAG_DECORATION) {
        w.write_list("tracked objects", &map.tracked_objects, |w, object| {
            match object {
                TrackedObject::Entity { unique_id } => {
                    w.write_i32_le(TRACKED_ENTITY);
                    w.write_signed_var_long(*unique_id);
                }
                TrackedObject::Block { position } => {
                    w.write_i32_le(TRACKED_BLOCK);
                    w.write_block_coordinates(*position);
                }
            }
            Ok(())
        })?;
        w.write_list("map decorations", &map.decorations, |w, d| {
            w.write_u8(d.icon);
            w.write_u8(d.rotation);
            w.write_u8(d.x);
            w.write_u8(d.z);
            w.write_string(&d.label)?;
            w.write_unsigned_var_int(d.color);
            Ok(())
        })?;
    }
    if map.has(FLAG_TEXTURE) {
        let t = &map.texture;
        let expected = (t.width.max(0) as usize).saturating_mul(t.height.max(0) as usize);
        if t.pixels.len() != expected {
            return Err(CodecError::invalid(
                "map texture",
                format!(
                    "{}x{} window needs {} pixels, got {}",
                    t.width,
                    t.height,
                    expected,
                    t.pixels.len()
                ),
            ));
        }
        w.write_signed_var_int(t.width);
        w.write_signed_var_int(t.height);
        w.write_signed_var_int(t.x_offset);
        w.write_signed_var_int(t.z_offset);
        w.write_list("map pixels", &t.pixels, |w, pixel| {
            w.write_unsigned_var_int(*pixel);
            Ok(())
        })?;
    }
    Ok(())
}

pub fn read_map_info(r: &mut PacketReader<'_>) -> Result<MapInfo> {
    let mut map = MapInfo {
        map_id: r.read_signed_var_long()?,
        update_flags: r.read_unsigned_var_int()?,
        dimension: r.read_u8()?,
        locked: r.read_bool()?,
        origin: r.read_block_coordinates()?,
        ..Default::default()
    };

    if map.has(FLAG_INITIALISATION) {
        map.included_map_ids = r.read_list("included map ids", |r| r.read_signed_var_long())?;
    }
    if scale_present(map.update_flags) {
        map.scale = r.read_u8()?;
    }
    if map.has(FLAG_DECORATION) {
        map.tracked_objects = r.read_list("tracked objects", |r| match r.read_i32_le()? {
            TRACKED_ENTITY => Ok(TrackedObject::Entity {
                unique_id: r.read_signed_var_long()?,
            }),
            TRACKED_BLOCK => Ok(TrackedObject::Block {
                position: r.read_block_coordinates()?,
            }),
            other => Err(CodecError::unknown("tracked map object", other)),
        })?;
        map.decorations = r.read_list("map decorations", |r| {
            Ok(MapDecoration {
                icon: r.read_u8()?,
                rotation: r.read_u8()?,
                x: r.read_u8()?,
                z: r.read_u8()?,
                label: r.read_string()?,
                color: r.read_unsigned_var_int()?,
            })
        })?;
    }
    if map.has(FLAG_TEXTURE) {
        let width = r.read_signed_var_int()?;
        let height = r.read_signed_var_int()?;
        let x_offset = r.read_signed_var_int()?;
        let z_offset = r.read_signed_var_int()?;
        let pixels = r.read_list("map pixels", |r| r.read_unsigned_var_int())?;
        if pixels.len() as i64 != width as i64 * height as i64 {
            return Err(CodecError::invalid(
                "map texture",
                format!("{}x{} window with {} pixels", width, height, pixels.len()),
            ));
        }
        map.texture = MapTexture {
            width,
            height,
            x_offset,
            z_offset,
            pixels,
        };
    }
    Ok(map)
}

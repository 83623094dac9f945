// Player list records and skins.

use serde::Serialize;
use uuid::Uuid;

use crate::codec::{PacketReader, PacketWriter};
use crate::diagnostics::serialize_blob;
use crate::error::{CodecError, Result};

const RECORD_ADD: u8 = 0;
const RECORD_REMOVE: u8 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkinImage {
    pub width: i32,
    pub height: i32,
    #[serde(serialize_with = "serialize_blob")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkinAnimation {
    pub image: SkinImage,
    pub animation_type: i32,
    pub frame_count: f32,
    pub expression: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonaPiece {
    pub piece_id: String,
    pub piece_type: String,
    pub pack_id: String,
    pub is_default: bool,
    pub product_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PieceTint {
    pub piece_type: String,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Skin {
    pub skin_id: String,
    pub playfab_id: String,
    pub resource_patch: String,
    pub image: SkinImage,
    pub animations: Vec<SkinAnimation>,
    pub cape: SkinImage,
    pub geometry_data: String,
    pub geometry_version: String,
    pub animation_data: String,
    pub cape_id: String,
    pub full_skin_id: String,
    pub arm_size: String,
    pub skin_color: String,
    pub persona_pieces: Vec<PersonaPiece>,
    pub piece_tints: Vec<PieceTint>,
    pub premium: bool,
    pub persona: bool,
    pub cape_on_classic: bool,
    pub primary_user: bool,
    pub overridden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerListEntry {
    pub uuid: Uuid,
    pub entity_unique_id: i64,
    pub name: String,
    pub xuid: String,
    pub platform_chat_id: String,
    pub device_os: i32,
    pub skin: Skin,
    pub is_teacher: bool,
    pub is_host: bool,
    pub is_subclient: bool,
    /// Sent in a block after all entries.
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlayerRecords {
    Add(Vec<PlayerListEntry>),
    Remove(Vec<Uuid>),
}

impl Default for PlayerRecords {
    fn default() -> Self {
        PlayerRecords::Add(Vec::new())
    }
}

// Counts inside a skin are little-endian i32, not varints.
fn write_i32_count(w: &mut PacketWriter<'_>, what: &'static str, len: usize) -> Result<()> {
    let count = i32::try_from(len).map_err(|_| CodecError::LengthLimit {
        what,
        length: len as u64,
        limit: i32::MAX as u64,
    })?;
    w.write_i32_le(count);
    Ok(())
}

fn read_i32_count(r: &mut PacketReader<'_>, what: &'static str) -> Result<usize> {
    let count = r.read_i32_le()?;
    r.check_count(what, count as i64)
}

fn write_image(w: &mut PacketWriter<'_>, image: &SkinImage) -> Result<()> {
    w.write_i32_le(image.width);
    w.write_i32_le(image.height);
    w.write_byte_array(&image.data)
}

fn read_image(r: &mut PacketReader<'_>) -> Result<SkinImage> {
    Ok(SkinImage {
        width: r.read_i32_le()?,
        height: r.read_i32_le()?,
        data: r.read_byte_array()?.to_vec(),
    })
}

pub fn write_skin(w: &mut PacketWriter<'_>, skin: &Skin) -> Result<()> {
    w.write_string(&skin.skin_id)?;
    w.write_string(&skin.playfab_id)?;
    w.write_string(&skin.resource_patch)?;
    write_image(w, &skin.image)?;

    write_i32_count(w, "skin animations", skin.animations.len())?;
    for animation in &skin.animations {
        write_image(w, &animation.image)?;
        w.write_i32_le(animation.animation_type);
        w.write_f32_le(animation.frame_count);
        w.write_i32_le(animation.expression);
    }

    write_image(w, &skin.cape)?;
    w.write_string(&skin.geometry_data)?;
    w.write_string(&skin.geometry_version)?;
    w.write_string(&skin.animation_data)?;
    w.write_string(&skin.cape_id)?;
    w.write_string(&skin.full_skin_id)?;
    w.write_string(&skin.arm_size)?;
    w.write_string(&skin.skin_color)?;

    write_i32_count(w, "persona pieces", skin.persona_pieces.len())?;
    for piece in &skin.persona_pieces {
        w.write_string(&piece.piece_id)?;
        w.write_string(&piece.piece_type)?;
        w.write_string(&piece.pack_id)?;
        w.write_bool(piece.is_default);
        w.write_string(&piece.product_id)?;
    }

    write_i32_count(w, "piece tints", skin.piece_tints.len())?;
    for tint in &skin.piece_tints {
        w.write_string(&tint.piece_type)?;
        write_i32_count(w, "tint colors", tint.colors.len())?;
        for color in &tint.colors {
            w.write_string(color)?;
        }
    }

    w.write_bool(skin.premium);
    w.write_bool(skin.persona);
    w.write_bool(skin.cape_on_classic);
    w.write_bool(skin.primary_user);
    w.write_bool(skin.overridden);
    Ok(())
}

pub fn read_skin(r: &mut PacketReader<'_>) -> Result<Skin> {
    let skin_id = r.read_string()?;
    let playfab_id = r.read_string()?;
    let resource_patch = r.read_string()?;
    let image = read_image(r)?;

    let count = read_i32_count(r, "skin animations")?;
    let mut animations = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        animations.push(SkinAnimation {
            image: read_image(r)?,
            animation_type: r.read_i32_le()?,
            frame_count: r.read_f32_le()?,
            expression: r.read_i32_le()?,
        });
    }

    let cape = read_image(r)?;
    let geometry_data = r.read_string()?;
    let geometry_version = r.read_string()?;
    let animation_data = r.read_string()?;
    let cape_id = r.read_string()?;
    let full_skin_id = r.read_string()?;
    let arm_size = r.read_string()?;
    let skin_color = r.read_string()?;

    let count = read_i32_count(r, "persona pieces")?;
    let mut persona_pieces = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        persona_pieces.push(PersonaPiece {
            piece_id: r.read_string()?,
            piece_type: r.read_string()?,
            pack_id: r.read_string()?,
            is_default: r.read_bool()?,
            product_id: r.read_string()?,
        });
    }

    let count = read_i32_count(r, "piece tints")?;
    let mut piece_tints = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        let piece_type = r.read_string()?;
        let colors_len = read_i32_count(r, "tint colors")?;
        let mut colors = Vec::with_capacity(colors_len.min(r.remaining()));
        for _ in 0..colors_len {
            colors.push(r.read_string()?);
        }
        piece_tints.push(PieceTint { piece_type, colors });
    }

    Ok(Skin {
        skin_id,
        playfab_id,
        resource_patch,
        image,
        animations,
        cape,
        geometry_data,
        geometry_version,
        animation_data,
        cape_id,
        full_skin_id,
        arm_size,
        skin_color,
        persona_pieces,
        piece_tints,
        premium: r.read_bool()?,
        persona: r.read_bool()?,
        cape_on_classic: r.read_bool()?,
        primary_user: r.read_bool()?,
        overridden: r.read_bool()?,
    })
}

pub fn write_player_records(w: &mut PacketWriter<'_>, records: &PlayerRecords) -> Result<()> {
    match records {
        PlayerRecords::Add(entries) => {
            w.write_u8(RECORD_ADD);
            w.write_list("player list entries", entries, |w, e| {
                w.write_uuid(&e.uuid);
                w.write_signed_var_long(e.entity_unique_id);
                w.write_string(&e.name)?;
                w.write_string(&e.xuid)?;
                w.write_string(&e.platform_chat_id)?;
                w.write_i32_le(e.device_os);
                write_skin(w, &e.skin)?;
                w.write_bool(e.is_teacher);
                w.write_bool(e.is_host);
                w.write_bool(e.is_subclient);
                Ok(())
            })?;
            for entry in entries {
                w.write_bool(entry.verified);
            }
        }
        PlayerRecords::Remove(uuids) => {
            w.write_u8(RECORD_REMOVE);
            w.write_list("player list removals", uuids, |w, uuid| {
                w.write_uuid(uuid);
                Ok(())
            })?;
        }
    }
    Ok(())
}

pub fn read_player_records(r: &mut PacketReader<'_>) -> Result<PlayerRecords> {
    match r.read_u8()? {
        RECORD_ADD => {
            let mut entries = r.read_list("player list entries", |r| {
                Ok(PlayerListEntry {
                    uuid: r.read_uuid()?,
                    entity_unique_id: r.read_signed_var_long()?,
                    name: r.read_string()?,
                    xuid: r.read_string()?,
                    platform_chat_id: r.read_string()?,
                    device_os: r.read_i32_le()?,
                    skin: read_skin(r)?,
                    is_teacher: r.read_bool()?,
                    is_host: r.read_bool()?,
                    is_subclient: r.read_bool()?,
                    verified: false,
                })
            })?;
            for entry in entries.iter_mut() {
                entry.verified = r.read_bool()?;
            }
            Ok(PlayerRecords::Add(entries))
        }
        RECORD_REMOVE => Ok(PlayerRecords::Remove(
            r.read_list("player list removals", |r| r.read_uuid())?,
        )),
        other => Err(CodecError::unknown("player list record", other)),
    }
}

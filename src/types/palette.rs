// Block palette.
//
// Each entry is a name plus a network-NBT compound whose "states" child holds
// the block's state values. Legacy ids are implicit: an entry's id is its
// index in the palette.

use serde::Serialize;
use tracing::debug;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::nbt::{self, NbtCompound, NbtMode, NbtTag};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlockStateValue {
    Byte(i8),
    Int(i32),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockState {
    pub name: String,
    pub value: BlockStateValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub legacy_id: u32,
    pub name: String,
    pub states: Vec<BlockState>,
}

impl PaletteEntry {
    pub fn state(&self, name: &str) -> Option<&BlockStateValue> {
        self.states.iter().find(|s| s.name == name).map(|s| &s.value)
    }

    fn to_compound(&self) -> NbtCompound {
        let mut states = NbtCompound::new();
        for state in &self.states {
            let tag = match &state.value {
                BlockStateValue::Byte(v) => NbtTag::Byte(*v),
                BlockStateValue::Int(v) => NbtTag::Int(*v),
                BlockStateValue::String(v) => NbtTag::String(v.clone()),
            };
            states.insert(state.name.clone(), tag);
        }
        NbtCompound::new().with("states", NbtTag::Compound(states))
    }
}

/// Flattens a states tree into typed entries. Nested lists and compounds are
/// walked; tags that are not byte, int or string are ignored.
fn collect_states(tag: &NbtTag, name: &str, out: &mut Vec<BlockState>) {
    let value = match tag {
        NbtTag::Byte(v) => BlockStateValue::Byte(*v),
        NbtTag::Int(v) => BlockStateValue::Int(*v),
        NbtTag::String(v) => BlockStateValue::String(v.clone()),
        NbtTag::Compound(compound) => {
            for (child_name, child) in compound.iter() {
                collect_states(child, child_name, out);
            }
            return;
        }
        NbtTag::List(list) => {
            for item in &list.items {
                collect_states(item, name, out);
            }
            return;
        }
        other => {
            debug!("Ignoring block state {} of tag type {}", name, other.type_id());
            return;
        }
    };
    out.push(BlockState {
        name: name.to_string(),
        value,
    });
}

pub fn write_palette(w: &mut PacketWriter<'_>, palette: &[PaletteEntry]) -> Result<()> {
    w.write_list("block palette", palette, |w, entry| {
        w.write_string(&entry.name)?;
        nbt::write_compound(w, &entry.to_compound(), NbtMode::Network)
    })
}

pub fn read_palette(r: &mut PacketReader<'_>) -> Result<Vec<PaletteEntry>> {
    let count = r.read_count("block palette")?;
    let mut palette = Vec::with_capacity(count.min(r.remaining()));
    for legacy_id in 0..count {
        let name = r.read_string()?;
        let root = nbt::read_compound(r, NbtMode::Network)?;
        let mut states = Vec::new();
        if let Some(tree) = root.get("states") {
            collect_states(tree, "states", &mut states);
        }
        palette.push(PaletteEntry {
            legacy_id: legacy_id as u32,
            name,
            states,
        });
    }
    Ok(palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodecContext;
    use crate::nbt::NbtList;

    #[test]
    fn test_palette_round_trip_assigns_indexes() {
        let ctx = CodecContext::default();
        let palette = vec![
            PaletteEntry {
                legacy_id: 0,
                name: "minecraft:air".to_string(),
                states: vec![],
            },
            PaletteEntry {
                legacy_id: 1,
                name: "minecraft:stone_slab".to_string(),
                states: vec![
                    BlockState {
                        name: "top_slot_bit".to_string(),
                        value: BlockStateValue::Byte(1),
                    },
                    BlockState {
                        name: "stone_slab_type".to_string(),
                        value: BlockStateValue::String("sandstone".to_string()),
                    },
                    BlockState {
                        name: "age".to_string(),
                        value: BlockStateValue::Int(7),
                    },
                ],
            },
        ];
        let mut w = PacketWriter::new(&ctx);
        write_palette(&mut w, &palette).unwrap();
        let bytes = w.into_bytes();
        let mut r = PacketReader::new(&bytes, &ctx);
        let decoded = read_palette(&mut r).unwrap();
        assert_eq!(decoded, palette);
        assert_eq!(decoded[1].state("age"), Some(&BlockStateValue::Int(7)));
        assert!(!r.has_remaining());
    }

    #[test]
    fn test_nested_states_are_flattened() {
        let ctx = CodecContext::default();
        let list = NbtList {
            element_type: 1,
            items: vec![NbtTag::Byte(3), NbtTag::Byte(4)],
        };
        let states = NbtCompound::new()
            .with("facing", NbtTag::List(list))
            .with("scale", NbtTag::Float(1.0));
        let root = NbtCompound::new().with("states", NbtTag::Compound(states));
        let mut w = PacketWriter::new(&ctx);
        w.write_unsigned_var_int(1);
        w.write_string("minecraft:ladder").unwrap();
        nbt::write_compound(&mut w, &root, NbtMode::Network).unwrap();
        let bytes = w.into_bytes();

        let mut r = PacketReader::new(&bytes, &ctx);
        let decoded = read_palette(&mut r).unwrap();
        let facing = BlockState {
            name: "facing".to_string(),
            value: BlockStateValue::Byte(3),
        };
        let facing_next = BlockState {
            name: "facing".to_string(),
            value: BlockStateValue::Byte(4),
        };
        assert_eq!(decoded[0].states, vec![facing, facing_next]);
    }
}

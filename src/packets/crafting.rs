use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::packet::Packet;
use crate::types::recipe::{
    read_material_reducers, read_potion_container_recipes, read_potion_type_recipes, read_recipe,
    write_material_reducers, write_potion_container_recipes, write_potion_type_recipes,
    write_recipe, MaterialReducerRecipe, PotionContainerChangeRecipe, PotionTypeRecipe, Recipe,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CraftingData {
    pub recipes: Vec<Recipe>,
    pub potion_type_recipes: Vec<PotionTypeRecipe>,
    pub potion_container_recipes: Vec<PotionContainerChangeRecipe>,
    pub material_reducers: Vec<MaterialReducerRecipe>,
    pub clear_recipes: bool,
}

impl Packet for CraftingData {
    const ID: u32 = 0x34;
    const NAME: &'static str = "CraftingData";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_list("recipes", &self.recipes, write_recipe)?;
        write_potion_type_recipes(w, &self.potion_type_recipes)?;
        write_potion_container_recipes(w, &self.potion_container_recipes)?;
        write_material_reducers(w, &self.material_reducers)?;
        w.write_bool(self.clear_recipes);
        Ok(())
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        let count = r.read_count("recipes")?;
        for _ in 0..count {
            self.recipes.push(read_recipe(r)?);
        }
        self.potion_type_recipes = read_potion_type_recipes(r)?;
        self.potion_container_recipes = read_potion_container_recipes(r)?;
        self.material_reducers = read_material_reducers(r)?;
        self.clear_recipes = r.read_bool()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodecContext;
    use crate::packet::{decode_packet, encode_packet};
    use crate::types::item::ItemStack;
    use crate::types::recipe::{FurnaceRecipe, Ingredient, MaterialReducerOutput, ShapelessRecipe};

    fn sample() -> CraftingData {
        CraftingData {
            recipes: vec![
                Recipe::Shapeless(ShapelessRecipe {
                    id: "minecraft:planks".to_string(),
                    input: vec![Ingredient::item(17, 0, 1)],
                    output: vec![ItemStack::new(5, 0, 4)],
                    block: "crafting_table".to_string(),
                    network_id: 1,
                    ..Default::default()
                }),
                Recipe::Furnace(FurnaceRecipe {
                    input_id: 15,
                    input_meta: 0,
                    output: ItemStack::new(265, 0, 1),
                    block: "furnace".to_string(),
                }),
            ],
            potion_type_recipes: vec![PotionTypeRecipe {
                input_id: 373,
                input_meta: 0,
                ingredient_id: 372,
                ingredient_meta: 0,
                output_id: 373,
                output_meta: 4,
            }],
            potion_container_recipes: vec![],
            material_reducers: vec![MaterialReducerRecipe {
                input_id: 1,
                input_meta: 3,
                outputs: vec![MaterialReducerOutput {
                    item_id: 2,
                    count: 8,
                }],
            }],
            clear_recipes: true,
        }
    }

    #[test]
    fn test_crafting_data_round_trip() {
        let ctx = CodecContext::default();
        let packet = sample();
        let bytes = encode_packet(&packet, &ctx).unwrap();
        let (decoded, report) = decode_packet::<CraftingData>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
        assert!(report.is_clean());
    }

    #[test]
    fn test_unknown_recipe_type_keeps_earlier_recipes() {
        let ctx = CodecContext::default();
        let packet = CraftingData {
            recipes: vec![sample().recipes[1].clone()],
            ..Default::default()
        };
        let mut bytes = encode_packet(&packet, &ctx).unwrap().to_vec();
        // Claim two recipes and append one with an unknown type.
        bytes[1] = 2;
        // potion, container and reducer counts plus the clear flag
        let tail = bytes.split_off(bytes.len() - 4);
        bytes.push(0x7e);
        bytes.extend_from_slice(&tail);

        let (decoded, report) = decode_packet::<CraftingData>(&bytes, &ctx).unwrap();
        assert_eq!(decoded.recipes, packet.recipes);
        assert!(report.skipped > 0);
        assert!(report.skip_reason.unwrap().contains("recipe"));
    }
}

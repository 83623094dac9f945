// Crafting recipes and the auxiliary tables sent alongside them.
//
// Each recipe starts with a signed varint type. Shaped grids are sent column
// by column (outer loop over width) even though they are stored row-major.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::types::item::{read_item, read_items, write_item, write_items, ItemStack};

pub const MAX_GRID_SIDE: i32 = 3;

const RECIPE_SHAPELESS: i32 = 0;
const RECIPE_SHAPED: i32 = 1;
const RECIPE_FURNACE: i32 = 2;
const RECIPE_FURNACE_DATA: i32 = 3;
const RECIPE_MULTI: i32 = 4;
const RECIPE_SHULKER_BOX: i32 = 5;
const RECIPE_SHAPELESS_CHEMISTRY: i32 = 6;
const RECIPE_SHAPED_CHEMISTRY: i32 = 7;
const RECIPE_SMITHING_TRANSFORM: i32 = 8;
const RECIPE_SMITHING_TRIM: i32 = 9;

/// What an ingredient slot accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum ItemDescriptor {
    #[default]
    Invalid,
    Default { id: i16, meta: i16 },
    Molang { expression: String, version: u8 },
    ItemTag { tag: String },
    Deferred { name: String, meta: i16 },
    ComplexAlias { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ingredient {
    pub descriptor: ItemDescriptor,
    pub count: i32,
}

impl Ingredient {
    pub fn item(id: i16, meta: i16, count: i32) -> Self {
        Self {
            descriptor: ItemDescriptor::Default { id, meta },
            count,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Recipe-book unlock condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UnlockRequirement {
    /// Unlocked once the player has held any of these.
    Ingredients(Vec<Ingredient>),
    /// Context byte other than 0 (1 = always unlocked).
    Context(u8),
}

impl Default for UnlockRequirement {
    fn default() -> Self {
        UnlockRequirement::Context(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShapelessRecipe {
    pub id: String,
    pub input: Vec<Ingredient>,
    pub output: Vec<ItemStack>,
    pub uuid: Uuid,
    pub block: String,
    pub priority: i32,
    /// Not sent for chemistry recipes.
    pub unlock: UnlockRequirement,
    pub network_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShapedRecipe {
    pub id: String,
    pub width: i32,
    pub height: i32,
    /// Row-major, `width * height` entries.
    pub input: Vec<Ingredient>,
    pub output: Vec<ItemStack>,
    pub uuid: Uuid,
    pub block: String,
    pub priority: i32,
    /// Not sent for chemistry recipes.
    pub symmetric: bool,
    /// Not sent for chemistry recipes.
    pub unlock: UnlockRequirement,
    pub network_id: i32,
}

impl ShapedRecipe {
    pub fn ingredient(&self, column: i32, row: i32) -> Option<&Ingredient> {
        if column < 0 || row < 0 || column >= self.width || row >= self.height {
            return None;
        }
        self.input.get((row * self.width + column) as usize)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FurnaceRecipe {
    pub input_id: i32,
    /// Only sent for the data-value variant.
    pub input_meta: i32,
    pub output: ItemStack,
    pub block: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MultiRecipe {
    pub uuid: Uuid,
    pub network_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SmithingTransformRecipe {
    pub id: String,
    pub template: Ingredient,
    pub base: Ingredient,
    pub addition: Ingredient,
    pub output: ItemStack,
    pub block: String,
    pub network_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SmithingTrimRecipe {
    pub id: String,
    pub template: Ingredient,
    pub base: Ingredient,
    pub addition: Ingredient,
    pub block: String,
    pub network_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Recipe {
    Shapeless(ShapelessRecipe),
    Shaped(ShapedRecipe),
    Furnace(FurnaceRecipe),
    FurnaceData(FurnaceRecipe),
    Multi(MultiRecipe),
    ShulkerBox(ShapelessRecipe),
    ShapelessChemistry(ShapelessRecipe),
    ShapedChemistry(ShapedRecipe),
    SmithingTransform(SmithingTransformRecipe),
    SmithingTrim(SmithingTrimRecipe),
}

impl Recipe {
    pub fn type_id(&self) -> i32 {
        match self {
            Recipe::Shapeless(_) => RECIPE_SHAPELESS,
            Recipe::Shaped(_) => RECIPE_SHAPED,
            Recipe::Furnace(_) => RECIPE_FURNACE,
            Recipe::FurnaceData(_) => RECIPE_FURNACE_DATA,
            Recipe::Multi(_) => RECIPE_MULTI,
            Recipe::ShulkerBox(_) => RECIPE_SHULKER_BOX,
            Recipe::ShapelessChemistry(_) => RECIPE_SHAPELESS_CHEMISTRY,
            Recipe::ShapedChemistry(_) => RECIPE_SHAPED_CHEMISTRY,
            Recipe::SmithingTransform(_) => RECIPE_SMITHING_TRANSFORM,
            Recipe::SmithingTrim(_) => RECIPE_SMITHING_TRIM,
        }
    }
}

pub fn write_recipe(w: &mut PacketWriter<'_>, recipe: &Recipe) -> Result<()> {
    w.write_signed_var_int(recipe.type_id());
    match recipe {
        Recipe::Shapeless(r) | Recipe::ShulkerBox(r) => write_shapeless(w, r, true),
        Recipe::ShapelessChemistry(r) => write_shapeless(w, r, false),
        Recipe::Shaped(r) => write_shaped(w, r, true),
        Recipe::ShapedChemistry(r) => write_shaped(w, r, false),
        Recipe::Furnace(r) => {
            let (input_id, _) = network_id_for(w, r.input_id, 0);
            w.write_signed_var_int(input_id);
            write_item(w, &r.output, false)?;
            w.write_string(&r.block)
        }
        Recipe::FurnaceData(r) => {
            let (input_id, input_meta) = network_id_for(w, r.input_id, r.input_meta as i16);
            w.write_signed_var_int(input_id);
            w.write_signed_var_int(input_meta as i32);
            write_item(w, &r.output, false)?;
            w.write_string(&r.block)
        }
        Recipe::Multi(r) => {
            w.write_uuid(&r.uuid);
            w.write_var_int(r.network_id);
            Ok(())
        }
        Recipe::SmithingTransform(r) => {
            w.write_string(&r.id)?;
            write_ingredient(w, &r.template)?;
            write_ingredient(w, &r.base)?;
            write_ingredient(w, &r.addition)?;
            write_item(w, &r.output, false)?;
            w.write_string(&r.block)?;
            w.write_var_int(r.network_id);
            Ok(())
        }
        Recipe::SmithingTrim(r) => {
            w.write_string(&r.id)?;
            write_ingredient(w, &r.template)?;
            write_ingredient(w, &r.base)?;
            write_ingredient(w, &r.addition)?;
            w.write_string(&r.block)?;
            w.write_var_int(r.network_id);
            Ok(())
        }
    }
}

pub fn read_recipe(r: &mut PacketReader<'_>) -> Result<Recipe> {
    let recipe_type = r.read_signed_var_int()?;
    let recipe = match recipe_type {
        RECIPE_SHAPELESS => Recipe::Shapeless(read_shapeless(r, true)?),
        RECIPE_SHULKER_BOX => Recipe::ShulkerBox(read_shapeless(r, true)?),
        RECIPE_SHAPELESS_CHEMISTRY => Recipe::ShapelessChemistry(read_shapeless(r, false)?),
        RECIPE_SHAPED => Recipe::Shaped(read_shaped(r, true)?),
        RECIPE_SHAPED_CHEMISTRY => Recipe::ShapedChemistry(read_shaped(r, false)?),
        RECIPE_FURNACE => {
            let network_id = r.read_signed_var_int()?;
            let (input_id, _) = persistent_id_for(r, network_id, 0);
            Recipe::Furnace(FurnaceRecipe {
                input_id,
                input_meta: 0,
                output: read_item(r, false)?,
                block: r.read_string()?,
            })
        }
        RECIPE_FURNACE_DATA => {
            let network_id = r.read_signed_var_int()?;
            let network_meta = r.read_signed_var_int()?;
            let (input_id, input_meta) = persistent_id_for(r, network_id, network_meta as i16);
            Recipe::FurnaceData(FurnaceRecipe {
                input_id,
                input_meta: input_meta as i32,
                output: read_item(r, false)?,
                block: r.read_string()?,
            })
        }
        RECIPE_MULTI => Recipe::Multi(MultiRecipe {
            uuid: r.read_uuid()?,
            network_id: r.read_var_int()?,
        }),
        RECIPE_SMITHING_TRANSFORM => Recipe::SmithingTransform(SmithingTransformRecipe {
            id: r.read_string()?,
            template: read_ingredient(r)?,
            base: read_ingredient(r)?,
            addition: read_ingredient(r)?,
            output: read_item(r, false)?,
            block: r.read_string()?,
            network_id: r.read_var_int()?,
        }),
        RECIPE_SMITHING_TRIM => Recipe::SmithingTrim(SmithingTrimRecipe {
            id: r.read_string()?,
            template: read_ingredient(r)?,
            base: read_ingredient(r)?,
            addition: read_ingredient(r)?,
            block: r.read_string()?,
            network_id: r.read_var_int()?,
        }),
        other => return Err(CodecError::unknown("recipe", other)),
    };
    Ok(recipe)
}

fn write_shapeless(w: &mut PacketWriter<'_>, r: &ShapelessRecipe, with_unlock: bool) -> Result<()> {
    w.write_string(&r.id)?;
    write_ingredient_list(w, &r.input)?;
    write_output(w, &r.output)?;
    w.write_uuid(&r.uuid);
    w.write_string(&r.block)?;
    w.write_signed_var_int(r.priority);
    if with_unlock {
        write_unlock(w, &r.unlock)?;
    }
    w.write_var_int(r.network_id);
    Ok(())
}

fn read_shapeless(r: &mut PacketReader<'_>, with_unlock: bool) -> Result<ShapelessRecipe> {
    Ok(ShapelessRecipe {
        id: r.read_string()?,
        input: read_ingredient_list(r)?,
        output: read_output(r)?,
        uuid: r.read_uuid()?,
        block: r.read_string()?,
        priority: r.read_signed_var_int()?,
        unlock: if with_unlock {
            read_unlock(r)?
        } else {
            UnlockRequirement::default()
        },
        network_id: r.read_var_int()?,
    })
}

fn check_grid(width: i32, height: i32) -> Result<()> {
    if !(0..=MAX_GRID_SIDE).contains(&width) || !(0..=MAX_GRID_SIDE).contains(&height) {
        return Err(CodecError::invalid(
            "shaped recipe",
            format!("grid {}x{} exceeds {}x{}", width, height, MAX_GRID_SIDE, MAX_GRID_SIDE),
        ));
    }
    Ok(())
}

fn write_shaped(w: &mut PacketWriter<'_>, r: &ShapedRecipe, full: bool) -> Result<()> {
    check_grid(r.width, r.height)?;
    if r.input.len() != (r.width * r.height) as usize {
        return Err(CodecError::invalid(
            "shaped recipe",
            format!("{} ingredients for a {}x{} grid", r.input.len(), r.width, r.height),
        ));
    }

    w.write_string(&r.id)?;
    w.write_signed_var_int(r.width);
    w.write_signed_var_int(r.height);
    for column in 0..r.width {
        for row in 0..r.height {
            write_ingredient(w, &r.input[(row * r.width + column) as usize])?;
        }
    }
    write_output(w, &r.output)?;
    w.write_uuid(&r.uuid);
    w.write_string(&r.block)?;
    w.write_signed_var_int(r.priority);
    if full {
        w.write_bool(r.symmetric);
        write_unlock(w, &r.unlock)?;
    }
    w.write_var_int(r.network_id);
    Ok(())
}

fn read_shaped(r: &mut PacketReader<'_>, full: bool) -> Result<ShapedRecipe> {
    let id = r.read_string()?;
    let width = r.read_signed_var_int()?;
    let height = r.read_signed_var_int()?;
    check_grid(width, height)?;

    let mut input = vec![Ingredient::empty(); (width * height) as usize];
    for column in 0..width {
        for row in 0..height {
            input[(row * width + column) as usize] = read_ingredient(r)?;
        }
    }
    let output = read_output(r)?;
    let uuid = r.read_uuid()?;
    let block = r.read_string()?;
    let priority = r.read_signed_var_int()?;
    let (symmetric, unlock) = if full {
        (r.read_bool()?, read_unlock(r)?)
    } else {
        (false, UnlockRequirement::default())
    };
    Ok(ShapedRecipe {
        id,
        width,
        height,
        input,
        output,
        uuid,
        block,
        priority,
        symmetric,
        unlock,
        network_id: r.read_var_int()?,
    })
}

fn write_unlock(w: &mut PacketWriter<'_>, unlock: &UnlockRequirement) -> Result<()> {
    match unlock {
        UnlockRequirement::Ingredients(ingredients) => {
            w.write_u8(0);
            write_ingredient_list(w, ingredients)
        }
        UnlockRequirement::Context(0) => Err(CodecError::invalid(
            "unlock requirement",
            "context 0 is reserved for the ingredient list",
        )),
        UnlockRequirement::Context(context) => {
            w.write_u8(*context);
            Ok(())
        }
    }
}

fn read_unlock(r: &mut PacketReader<'_>) -> Result<UnlockRequirement> {
    match r.read_u8()? {
        0 => Ok(UnlockRequirement::Ingredients(read_ingredient_list(r)?)),
        context => Ok(UnlockRequirement::Context(context)),
    }
}

// Recipe lists are framed with a var_int count, not the usual unsigned one.
fn write_ingredient_list(w: &mut PacketWriter<'_>, ingredients: &[Ingredient]) -> Result<()> {
    w.write_var_int(ingredients.len() as i32);
    for ingredient in ingredients {
        write_ingredient(w, ingredient)?;
    }
    Ok(())
}

fn read_ingredient_list(r: &mut PacketReader<'_>) -> Result<Vec<Ingredient>> {
    let count = r.read_var_int()?;
    let count = r.check_count("recipe ingredients", count as i64)?;
    let mut ingredients = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        ingredients.push(read_ingredient(r)?);
    }
    Ok(ingredients)
}

fn write_output(w: &mut PacketWriter<'_>, output: &[ItemStack]) -> Result<()> {
    w.write_var_int(output.len() as i32);
    for item in output {
        write_item(w, item, false)?;
    }
    Ok(())
}

fn read_output(r: &mut PacketReader<'_>) -> Result<Vec<ItemStack>> {
    let count = r.read_var_int()?;
    let count = r.check_count("recipe output", count as i64)?;
    let mut output = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        output.push(read_item(r, false)?);
    }
    Ok(output)
}

pub fn write_ingredient(w: &mut PacketWriter<'_>, ingredient: &Ingredient) -> Result<()> {
    match &ingredient.descriptor {
        ItemDescriptor::Invalid => w.write_u8(0),
        ItemDescriptor::Default { id, meta } => {
            let (network_id, network_meta) = network_id_for(w, *id as i32, *meta);
            if network_id == 0 {
                w.write_u8(0);
            } else {
                w.write_u8(1);
                w.write_i16_le(network_id as i16);
                w.write_i16_le(network_meta);
            }
        }
        ItemDescriptor::Molang {
            expression,
            version,
        } => {
            w.write_u8(2);
            w.write_string(expression)?;
            w.write_u8(*version);
        }
        ItemDescriptor::ItemTag { tag } => {
            w.write_u8(3);
            w.write_string(tag)?;
        }
        ItemDescriptor::Deferred { name, meta } => {
            w.write_u8(4);
            w.write_string(name)?;
            w.write_i16_le(*meta);
        }
        ItemDescriptor::ComplexAlias { name } => {
            w.write_u8(5);
            w.write_string(name)?;
        }
    }
    w.write_signed_var_int(ingredient.count);
    Ok(())
}

pub fn read_ingredient(r: &mut PacketReader<'_>) -> Result<Ingredient> {
    let descriptor = match r.read_u8()? {
        0 => ItemDescriptor::Invalid,
        1 => {
            let network_id = r.read_i16_le()?;
            let network_meta = r.read_i16_le()?;
            match persistent_id_for(r, network_id as i32, network_meta) {
                (0, _) => ItemDescriptor::Invalid,
                (id, meta) => ItemDescriptor::Default {
                    id: id as i16,
                    meta,
                },
            }
        }
        2 => ItemDescriptor::Molang {
            expression: r.read_string()?,
            version: r.read_u8()?,
        },
        3 => ItemDescriptor::ItemTag {
            tag: r.read_string()?,
        },
        4 => ItemDescriptor::Deferred {
            name: r.read_string()?,
            meta: r.read_i16_le()?,
        },
        5 => ItemDescriptor::ComplexAlias {
            name: r.read_string()?,
        },
        other => return Err(CodecError::unknown("item descriptor", other)),
    };
    Ok(Ingredient {
        descriptor,
        count: r.read_signed_var_int()?,
    })
}

// Failed lookups collapse to id 0, which every caller treats as "nothing".
fn network_id_for(w: &PacketWriter<'_>, id: i32, meta: i16) -> (i32, i16) {
    if id == 0 {
        return (0, 0);
    }
    w.context().translator().to_network(id, meta).unwrap_or_else(|| {
        warn!("No network id for recipe item {}:{}", id, meta);
        (0, 0)
    })
}

fn persistent_id_for(r: &PacketReader<'_>, network_id: i32, network_meta: i16) -> (i32, i16) {
    if network_id == 0 {
        return (0, 0);
    }
    r.context()
        .translator()
        .from_network(network_id, network_meta)
        .unwrap_or_else(|| {
            warn!("Unknown network recipe item {}:{}", network_id, network_meta);
            (0, 0)
        })
}

/// Brewing recipe: input potion + reagent -> output potion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PotionTypeRecipe {
    pub input_id: i32,
    pub input_meta: i32,
    pub ingredient_id: i32,
    pub ingredient_meta: i32,
    pub output_id: i32,
    pub output_meta: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PotionContainerChangeRecipe {
    pub input_id: i32,
    pub ingredient_id: i32,
    pub output_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialReducerOutput {
    pub item_id: i32,
    pub count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialReducerRecipe {
    pub input_id: i32,
    /// 15 bits on the wire.
    pub input_meta: i32,
    pub outputs: Vec<MaterialReducerOutput>,
}

pub fn write_potion_type_recipes(w: &mut PacketWriter<'_>, recipes: &[PotionTypeRecipe]) -> Result<()> {
    w.write_list("potion type recipes", recipes, |w, p| {
        w.write_var_int(p.input_id);
        w.write_var_int(p.input_meta);
        w.write_var_int(p.ingredient_id);
        w.write_var_int(p.ingredient_meta);
        w.write_var_int(p.output_id);
        w.write_var_int(p.output_meta);
        Ok(())
    })
}

pub fn read_potion_type_recipes(r: &mut PacketReader<'_>) -> Result<Vec<PotionTypeRecipe>> {
    r.read_list("potion type recipes", |r| {
        Ok(PotionTypeRecipe {
            input_id: r.read_var_int()?,
            input_meta: r.read_var_int()?,
            ingredient_id: r.read_var_int()?,
            ingredient_meta: r.read_var_int()?,
            output_id: r.read_var_int()?,
            output_meta: r.read_var_int()?,
        })
    })
}

pub fn write_potion_container_recipes(
    w: &mut PacketWriter<'_>,
    recipes: &[PotionContainerChangeRecipe],
) -> Result<()> {
    w.write_list("potion container recipes", recipes, |w, p| {
        w.write_var_int(p.input_id);
        w.write_var_int(p.ingredient_id);
        w.write_var_int(p.output_id);
        Ok(())
    })
}

pub fn read_potion_container_recipes(
    r: &mut PacketReader<'_>,
) -> Result<Vec<PotionContainerChangeRecipe>> {
    r.read_list("potion container recipes", |r| {
        Ok(PotionContainerChangeRecipe {
            input_id: r.read_var_int()?,
            ingredient_id: r.read_var_int()?,
            output_id: r.read_var_int()?,
        })
    })
}

pub fn write_material_reducers(
    w: &mut PacketWriter<'_>,
    recipes: &[MaterialReducerRecipe],
) -> Result<()> {
    w.write_list("material reducer recipes", recipes, |w, m| {
        w.write_var_int((m.input_id << 16) | (m.input_meta & 0x7fff));
        w.write_list("material reducer outputs", &m.outputs, |w, o| {
            w.write_var_int(o.item_id);
            w.write_var_int(o.count);
            Ok(())
        })
    })
}

pub fn read_material_reducers(r: &mut PacketReader<'_>) -> Result<Vec<MaterialReducerRecipe>> {
    r.read_list("material reducer recipes", |r| {
        let packed = r.read_var_int()?;
        Ok(MaterialReducerRecipe {
            input_id: packed >> 16,
            input_meta: packed & 0x7fff,
            outputs: r.read_list("material reducer outputs", |r| {
                Ok(MaterialReducerOutput {
                    item_id: r.read_var_int()?,
                    count: r.read_var_int()?,
                })
            })?,
        })
    })
}

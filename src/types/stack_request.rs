// Item stack requests (client -> server) and their responses.
//
// Every action starts with a one-byte discriminator. The numbering is fixed
// by the protocol; new actions get new numbers, existing ones never move.

use std::num::NonZeroU8;

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::types::item::{read_items, write_items, ItemStack};
use crate::types::recipe::{read_ingredient, write_ingredient, Ingredient};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StackRequestSlotInfo {
    pub container_id: u8,
    pub dynamic_id: u8,
    pub slot: u8,
    pub stack_net_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StackRequestAction {
    Take {
        count: u8,
        source: StackRequestSlotInfo,
        destination: StackRequestSlotInfo,
    },
    Place {
        count: u8,
        source: StackRequestSlotInfo,
        destination: StackRequestSlotInfo,
    },
    Swap {
        source: StackRequestSlotInfo,
        destination: StackRequestSlotInfo,
    },
    Drop {
        count: u8,
        source: StackRequestSlotInfo,
        randomly: bool,
    },
    Destroy {
        count: u8,
        source: StackRequestSlotInfo,
    },
    Consume {
        count: u8,
        source: StackRequestSlotInfo,
    },
    Create {
        result_slot: u8,
    },
    PlaceIntoBundleDeprecated,
    TakeFromBundleDeprecated,
    LabTableCombine,
    BeaconPayment {
        primary_effect: i32,
        secondary_effect: i32,
    },
    MineBlock {
        slot: i32,
        durability: i32,
        stack_net_id: i32,
    },
    CraftRecipe {
        recipe_network_id: u32,
        times_crafted: u8,
    },
    CraftRecipeAuto {
        recipe_network_id: u32,
        times_crafted_client: u8,
        times_crafted: u8,
        ingredients: Vec<Ingredient>,
    },
    CraftCreative {
        creative_item_network_id: u32,
        client_predicted_result: u8,
    },
    CraftRecipeOptional {
        recipe_network_id: u32,
        filtered_string_index: i32,
    },
    CraftGrindstone {
        recipe_network_id: u32,
        repair_cost: i32,
        times_crafted: u8,
    },
    CraftLoom {
        pattern: String,
        times_crafted: u8,
    },
    CraftNotImplementedDeprecated,
    CraftResultsDeprecated {
        result_items: Vec<ItemStack>,
        times_crafted: u8,
    },
}

impl StackRequestAction {
    pub fn type_id(&self) -> u8 {
        match self {
            StackRequestAction::Take { .. } => 0,
            StackRequestAction::Place { .. } => 1,
            StackRequestAction::Swap { .. } => 2,
            StackRequestAction::Drop { .. } => 3,
            StackRequestAction::Destroy { .. } => 4,
            StackRequestAction::Consume { .. } => 5,
            StackRequestAction::Create { .. } => 6,
            StackRequestAction::PlaceIntoBundleDeprecated => 7,
            StackRequestAction::TakeFromBundleDeprecated => 8,
            StackRequestAction::LabTableCombine => 9,
            StackRequestAction::BeaconPayment { .. } => 10,
            StackRequestAction::MineBlock { .. } => 11,
            StackRequestAction::CraftRecipe { .. } => 12,
            StackRequestAction::CraftRecipeAuto { .. } => 13,
            StackRequestAction::CraftCreative { .. } => 14,
            StackRequestAction::CraftRecipeOptional { .. } => 15,
            StackRequestAction::CraftGrindstone { .. } => 16,
            StackRequestAction::CraftLoom { .. } => 17,
            StackRequestAction::CraftNotImplementedDeprecated => 18,
            StackRequestAction::CraftResultsDeprecated { .. } => 19,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StackRequest {
    pub request_id: i32,
    pub actions: Vec<StackRequestAction>,
    pub filtered_strings: Vec<String>,
    pub filter_cause: u32,
}

pub fn write_slot_info(w: &mut PacketWriter<'_>, info: &StackRequestSlotInfo) {
    w.write_u8(info.container_id);
    w.write_u8(info.dynamic_id);
    w.write_u8(info.slot);
    w.write_signed_var_int(info.stack_net_id);
}

pub fn read_slot_info(r: &mut PacketReader<'_>) -> Result<StackRequestSlotInfo> {
    Ok(StackRequestSlotInfo {
        container_id: r.read_u8()?,
        dynamic_id: r.read_u8()?,
        slot: r.read_u8()?,
        stack_net_id: r.read_signed_var_int()?,
    })
}

pub fn write_action(w: &mut PacketWriter<'_>, action: &StackRequestAction) -> Result<()> {
    w.write_u8(action.type_id());
    match action {
        StackRequestAction::Take {
            count,
            source,
            destination,
        }
        | StackRequestAction::Place {
            count,
            source,
            destination,
        } => {
            w.write_u8(*count);
            write_slot_info(w, source);
            write_slot_info(w, destination);
        }
        StackRequestAction::Swap {
            source,
            destination,
        } => {
            write_slot_info(w, source);
            write_slot_info(w, destination);
        }
        StackRequestAction::Drop {
            count,
            source,
            randomly,
        } => {
            w.write_u8(*count);
            write_slot_info(w, source);
            w.write_bool(*randomly);
        }
        StackRequestAction::Destroy { count, source }
        | StackRequestAction::Consume { count, source } => {
            w.write_u8(*count);
            write_slot_info(w, source);
        }
        StackRequestAction::Create { result_slot } => w.write_u8(*result_slot),
        StackRequestAction::PlaceIntoBundleDeprecated
        | StackRequestAction::TakeFromBundleDeprecated
        | StackRequestAction::LabTableCombine
        | StackRequestAction::CraftNotImplementedDeprecated => {}
        StackRequestAction::BeaconPayment {
            primary_effect,
            secondary_effect,
        } => {
            w.write_signed_var_int(*primary_effect);
            w.write_signed_var_int(*secondary_effect);
        }
        StackRequestAction::MineBlock {
            slot,
            durability,
            stack_net_id,
        } => {
            w.write_var_int(*slot);
            w.write_var_int(*durability);
            w.write_signed_var_int(*stack_net_id);
        }
        StackRequestAction::CraftRecipe {
            recipe_network_id,
            times_crafted,
        } => {
            w.write_unsigned_var_int(*recipe_network_id);
            w.write_u8(*times_crafted);
        }
        StackRequestAction::CraftRecipeAuto {
            recipe_network_id,
            times_crafted_client,
            times_crafted,
            ingredients,
        } => {
            let count = u8::try_from(ingredients.len()).map_err(|_| {
                CodecError::invalid("auto craft", format!("{} ingredients", ingredients.len()))
            })?;
            w.write_unsigned_var_int(*recipe_network_id);
            w.write_u8(*times_crafted_client);
            w.write_u8(*times_crafted);
            w.write_u8(count);
            for ingredient in ingredients {
                write_ingredient(w, ingredient)?;
            }
        }
        StackRequestAction::CraftCreative {
            creative_item_network_id,
            client_predicted_result,
        } => {
            w.write_unsigned_var_int(*creative_item_network_id);
            w.write_u8(*client_predicted_result);
        }
        StackRequestAction::CraftRecipeOptional {
            recipe_network_id,
            filtered_string_index,
        } => {
            w.write_unsigned_var_int(*recipe_network_id);
            w.write_i32_le(*filtered_string_index);
        }
        StackRequestAction::CraftGrindstone {
            recipe_network_id,
            repair_cost,
            times_crafted,
        } => {
            w.write_unsigned_var_int(*recipe_network_id);
            w.write_var_int(*repair_cost);
            w.write_u8(*times_crafted);
        }
        StackRequestAction::CraftLoom {
            pattern,
            times_crafted,
        } => {
            w.write_string(pattern)?;
            w.write_u8(*times_crafted);
        }
        StackRequestAction::CraftResultsDeprecated {
            result_items,
            times_crafted,
        } => {
            write_items(w, result_items, false)?;
            w.write_u8(*times_crafted);
        }
    }
    Ok(())
}

pub fn read_action(r: &mut PacketReader<'_>) -> Result<StackRequestAction> {
    let action = match r.read_u8()? {
        0 => StackRequestAction::Take {
            count: r.read_u8()?,
            source: read_slot_info(r)?,
            destination: read_slot_info(r)?,
        },
        1 => StackRequestAction::Place {
            count: r.read_u8()?,
            source: read_slot_info(r)?,
            destination: read_slot_info(r)?,
        },
        2 => StackRequestAction::Swap {
            source: read_slot_info(r)?,
            destination: read_slot_info(r)?,
        },
        3 => StackRequestAction::Drop {
            count: r.read_u8()?,
            source: read_slot_info(r)?,
            randomly: r.read_bool()?,
        },
        4 => StackRequestAction::Destroy {
            count: r.read_u8()?,
            source: read_slot_info(r)?,
        },
        5 => StackRequestAction::Consume {
            count: r.read_u8()?,
            source: read_slot_info(r)?,
        },
        6 => StackRequestAction::Create {
            result_slot: r.read_u8()?,
        },
        7 => StackRequestAction::PlaceIntoBundleDeprecated,
        8 => StackRequestAction::TakeFromBundleDeprecated,
        9 => StackRequestAction::LabTableCombine,
        10 => StackRequestAction::BeaconPayment {
            primary_effect: r.read_signed_var_int()?,
            secondary_effect: r.read_signed_var_int()?,
        },
        11 => StackRequestAction::MineBlock {
            slot: r.read_var_int()?,
            durability: r.read_var_int()?,
            stack_net_id: r.read_signed_var_int()?,
        },
        12 => StackRequestAction::CraftRecipe {
            recipe_network_id: r.read_unsigned_var_int()?,
            times_crafted: r.read_u8()?,
        },
        13 => {
            let recipe_network_id = r.read_unsigned_var_int()?;
            let times_crafted_client = r.read_u8()?;
            let times_crafted = r.read_u8()?;
            let count = r.read_u8()?;
            let mut ingredients = Vec::with_capacity(count as usize);
            for _ in 0..count {
                ingredients.push(read_ingredient(r)?);
            }
            StackRequestAction::CraftRecipeAuto {
                recipe_network_id,
                times_crafted_client,
                times_crafted,
                ingredients,
            }
        }
        14 => StackRequestAction::CraftCreative {
            creative_item_network_id: r.read_unsigned_var_int()?,
            client_predicted_result: r.read_u8()?,
        },
        15 => StackRequestAction::CraftRecipeOptional {
            recipe_network_id: r.read_unsigned_var_int()?,
            filtered_string_index: r.read_i32_le()?,
        },
        16 => StackRequestAction::CraftGrindstone {
            recipe_network_id: r.read_unsigned_var_int()?,
            repair_cost: r.read_var_int()?,
            times_crafted: r.read_u8()?,
        },
        17 => StackRequestAction::CraftLoom {
            pattern: r.read_string()?,
            times_crafted: r.read_u8()?,
        },
        18 => StackRequestAction::CraftNotImplementedDeprecated,
        19 => StackRequestAction::CraftResultsDeprecated {
            result_items: read_items(r, false)?,
            times_crafted: r.read_u8()?,
        },
        other => return Err(CodecError::unknown("stack request action", other)),
    };
    Ok(action)
}

pub fn write_request(w: &mut PacketWriter<'_>, request: &StackRequest) -> Result<()> {
    w.write_signed_var_int(request.request_id);
    w.write_list("stack request actions", &request.actions, write_action)?;
    w.write_list("filtered strings", &request.filtered_strings, |w, s| {
        w.write_string(s)
    })?;
    w.write_u32_le(request.filter_cause);
    Ok(())
}

/// Reads one request into `request`; actions decoded before an unknown
/// action type are kept.
pub fn read_request_into(r: &mut PacketReader<'_>, request: &mut StackRequest) -> Result<()> {
    request.request_id = r.read_signed_var_int()?;
    let count = r.read_count("stack request actions")?;
    for _ in 0..count {
        request.actions.push(read_action(r)?);
    }
    request.filtered_strings = r.read_list("filtered strings", |r| r.read_string())?;
    request.filter_cause = r.read_u32_le()?;
    Ok(())
}

pub fn read_request(r: &mut PacketReader<'_>) -> Result<StackRequest> {
    let mut request = StackRequest::default();
    read_request_into(r, &mut request)?;
    Ok(request)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum StackResponseStatus {
    #[default]
    Ok,
    /// 0 on the wire is success, so error codes start at 1.
    Error(NonZeroU8),
}

impl StackResponseStatus {
    pub fn to_byte(self) -> u8 {
        match self {
            StackResponseStatus::Ok => 0,
            StackResponseStatus::Error(code) => code.get(),
        }
    }

    pub fn from_byte(byte: u8) -> Self {
        match NonZeroU8::new(byte) {
            None => StackResponseStatus::Ok,
            Some(code) => StackResponseStatus::Error(code),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StackResponseSlotInfo {
    pub slot: u8,
    pub hotbar_slot: u8,
    pub count: u8,
    pub stack_net_id: i32,
    pub custom_name: String,
    pub filtered_custom_name: String,
    pub durability_correction: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StackResponseContainerInfo {
    pub container_id: u8,
    pub dynamic_id: u8,
    pub slots: Vec<StackResponseSlotInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StackResponse {
    pub status: StackResponseStatus,
    pub request_id: i32,
    /// Only sent when the status is `Ok`.
    pub containers: Vec<StackResponseContainerInfo>,
}

pub fn write_response(w: &mut PacketWriter<'_>, response: &StackResponse) -> Result<()> {
    w.write_u8(response.status.to_byte());
    w.write_signed_var_int(response.request_id);
    if response.status != StackResponseStatus::Ok {
        return Ok(());
    }
    w.write_list("response containers", &response.containers, |w, container| {
        w.write_u8(container.container_id);
        w.write_u8(container.dynamic_id);
        w.write_list("response slots", &container.slots, |w, slot| {
            w.write_u8(slot.slot);
            w.write_u8(slot.hotbar_slot);
            w.write_u8(slot.count);
            w.write_signed_var_int(slot.stack_net_id);
            w.write_string(&slot.custom_name)?;
            w.write_string(&slot.filtered_custom_name)?;
            w.write_signed_var_int(slot.durability_correction);
            Ok(())
        })
    })
}

pub fn read_response(r: &mut PacketReader<'_>) -> Result<StackResponse> {
    let status = StackResponseStatus::from_byte(r.read_u8()?);
    let request_id = r.read_signed_var_int()?;
    if status != StackResponseStatus::Ok {
        return Ok(StackResponse {
            status,
            request_id,
            containers: Vec::new(),
        });
    }
    let containers = r.read_list("response containers", |r| {
        Ok(StackResponseContainerInfo {
            container_id: r.read_u8()?,
            dynamic_id: r.read_u8()?,
            slots: r.read_list("response slots", |r| {
                Ok(StackResponseSlotInfo {
                    slot: r.read_u8()?,
                    hotbar_slot: r.read_u8()?,
                    count: r.read_u8()?,
                    stack_net_id: r.read_signed_var_int()?,
                    custom_name: r.read_string()?,
                    filtered_custom_name: r.read_string()?,
                    durability_correction: r.read_signed_var_int()?,
                })
            })?,
        })
    })?;
    Ok(StackResponse {
        status,
        request_id,
        containers,
    })
}

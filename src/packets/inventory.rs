use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::packet::Packet;
use crate::types::creative::{
    read_creative_groups, read_creative_items, write_creative_groups, write_creative_items,
    CreativeGroup, CreativeItem,
};
use crate::types::enchant::{read_enchant_options, write_enchant_options, EnchantOption};
use crate::types::item::{read_item, read_items, write_item, write_items, ItemStack};
use crate::types::stack_request::{
    read_request_into, read_response, write_request, write_response, StackRequest, StackResponse,
};
use crate::types::transaction::{read_transaction_into, write_transaction, Transaction};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryTransaction {
    pub transaction: Transaction,
}

impl Packet for InventoryTransaction {
    const ID: u32 = 0x1e;
    const NAME: &'static str = "InventoryTransaction";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        write_transaction(w, &self.transaction)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        read_transaction_into(r, &mut self.transaction)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryContent {
    pub inventory_id: u32,
    pub items: Vec<ItemStack>,
    pub dynamic_container_id: u32,
}

impl Packet for InventoryContent {
    const ID: u32 = 0x31;
    const NAME: &'static str = "InventoryContent";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_unsigned_var_int(self.inventory_id);
        write_items(w, &self.items, true)?;
        w.write_unsigned_var_int(self.dynamic_container_id);
        Ok(())
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.inventory_id = r.read_unsigned_var_int()?;
        self.items = read_items(r, true)?;
        self.dynamic_container_id = r.read_unsigned_var_int()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventorySlot {
    pub inventory_id: u32,
    pub slot: u32,
    pub dynamic_container_id: u32,
    pub item: ItemStack,
}

impl Packet for InventorySlot {
    const ID: u32 = 0x32;
    const NAME: &'static str = "InventorySlot";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_unsigned_var_int(self.inventory_id);
        w.write_unsigned_var_int(self.slot);
        w.write_unsigned_var_int(self.dynamic_container_id);
        write_item(w, &self.item, true)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.inventory_id = r.read_unsigned_var_int()?;
        self.slot = r.read_unsigned_var_int()?;
        self.dynamic_container_id = r.read_unsigned_var_int()?;
        self.item = read_item(r, true)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemStackRequest {
    pub requests: Vec<StackRequest>,
}

impl Packet for ItemStackRequest {
    const ID: u32 = 0x93;
    const NAME: &'static str = "ItemStackRequest";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_list("stack requests", &self.requests, write_request)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        let count = r.read_count("stack requests")?;
        for _ in 0..count {
            // A request cut short by an unknown action is still kept.
            let mut request = StackRequest::default();
            let result = read_request_into(r, &mut request);
            self.requests.push(request);
            result?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemStackResponse {
    pub responses: Vec<StackResponse>,
}

impl Packet for ItemStackResponse {
    const ID: u32 = 0x94;
    const NAME: &'static str = "ItemStackResponse";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_list("stack responses", &self.responses, write_response)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.responses = r.read_list("stack responses", read_response)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreativeContent {
    pub groups: Vec<CreativeGroup>,
    pub items: Vec<CreativeItem>,
}

impl Packet for CreativeContent {
    const ID: u32 = 0x91;
    const NAME: &'static str = "CreativeContent";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        write_creative_groups(w, &self.groups)?;
        write_creative_items(w, &self.items)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.groups = read_creative_groups(r)?;
        self.items = read_creative_items(r)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerEnchantOptions {
    pub options: Vec<EnchantOption>,
}

impl Packet for PlayerEnchantOptions {
    const ID: u32 = 0x92;
    const NAME: &'static str = "PlayerEnchantOptions";

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        write_enchant_options(w, &self.options)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.options = read_enchant_options(r)?;
        Ok(())
    }
}

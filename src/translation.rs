//! Persistent item identity <-> session-local network id.
//!
//! The tables themselves come from game data loaded at startup; the codec only
//! consumes them through [`ItemTranslator`], which makes it easy to run the
//! codec against a fake table in tests.

use std::collections::HashMap;

/// Lookup used by the item codec on both paths. `None` means the pair is
/// unknown and the item is written/read as air.
pub trait ItemTranslator: Send + Sync {
    fn to_network(&self, id: i32, meta: i16) -> Option<(i32, i16)>;
    fn from_network(&self, network_id: i32, network_meta: i16) -> Option<(i32, i16)>;
}

/// Passes ids through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl ItemTranslator for IdentityTranslator {
    fn to_network(&self, id: i32, meta: i16) -> Option<(i32, i16)> {
        Some((id, meta))
    }

    fn from_network(&self, network_id: i32, network_meta: i16) -> Option<(i32, i16)> {
        Some((network_id, network_meta))
    }
}

/// In-memory table. Exact `(id, meta)` variants take precedence over plain
/// id mappings, which carry the metadata through untouched.
#[derive(Debug, Default, Clone)]
pub struct TranslationTable {
    items: HashMap<i32, i32>,
    items_rev: HashMap<i32, i32>,
    variants: HashMap<(i32, i16), (i32, i16)>,
    variants_rev: HashMap<(i32, i16), (i32, i16)>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_item(&mut self, id: i32, network_id: i32) -> &mut Self {
        self.items.insert(id, network_id);
        self.items_rev.insert(network_id, id);
        self
    }

    pub fn register_variant(
        &mut self,
        id: i32,
        meta: i16,
        network_id: i32,
        network_meta: i16,
    ) -> &mut Self {
        self.variants.insert((id, meta), (network_id, network_meta));
        self.variants_rev.insert((network_id, network_meta), (id, meta));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len() + self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.variants.is_empty()
    }
}

impl ItemTranslator for TranslationTable {
    fn to_network(&self, id: i32, meta: i16) -> Option<(i32, i16)> {
        if let Some(pair) = self.variants.get(&(id, meta)) {
            return Some(*pair);
        }
        self.items.get(&id).map(|network_id| (*network_id, meta))
    }

    fn from_network(&self, network_id: i32, network_meta: i16) -> Option<(i32, i16)> {
        if let Some(pair) = self.variants_rev.get(&(network_id, network_meta)) {
            return Some(*pair);
        }
        self.items_rev.get(&network_id).map(|id| (*id, network_meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_beats_plain_mapping() {
        let mut table = TranslationTable::new();
        table.register_item(35, 1035).register_variant(35, 14, 2000, 0);

        assert_eq!(table.to_network(35, 3), Some((1035, 3)));
        assert_eq!(table.to_network(35, 14), Some((2000, 0)));
        assert_eq!(table.from_network(2000, 0), Some((35, 14)));
        assert_eq!(table.from_network(1035, 3), Some((35, 3)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_unknown_pairs_miss() {
        let table = TranslationTable::new();
        assert!(table.is_empty());
        assert_eq!(table.to_network(1, 0), None);
        assert_eq!(table.from_network(1, 0), None);
        assert_eq!(IdentityTranslator.to_network(7, 2), Some((7, 2)));
    }
}

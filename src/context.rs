use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::CodecConfig;
use crate::translation::{IdentityTranslator, ItemTranslator};

/// Process-scoped state every encode/decode call borrows: configuration, the
/// item translation tables, and the per-packet-id size hints.
///
/// Built once at startup and shared behind an `Arc`; the only mutable part is
/// the size-hint map.
pub struct CodecContext {
    config: CodecConfig,
    translator: Arc<dyn ItemTranslator>,
    size_hints: RwLock<HashMap<u32, usize>>,
}

impl CodecContext {
    pub fn new(config: CodecConfig, translator: Arc<dyn ItemTranslator>) -> Self {
        Self {
            config,
            translator,
            size_hints: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self::new(config, Arc::new(IdentityTranslator))
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn translator(&self) -> &dyn ItemTranslator {
        self.translator.as_ref()
    }

    /// Initial buffer size for encoding packet `id`, if one of its encodings
    /// has crossed the large-packet threshold before.
    pub fn size_hint(&self, id: u32) -> Option<usize> {
        self.size_hints.read().get(&id).copied()
    }

    pub(crate) fn record_encoded_size(&self, id: u32, len: usize) {
        if len < self.config.large_packet_threshold {
            return;
        }
        if self.size_hint(id).is_some_and(|known| known >= len) {
            return;
        }
        let mut hints = self.size_hints.write();
        let entry = hints.entry(id).or_insert(0);
        if len > *entry {
            debug!("Packet 0x{:02x} encoded to {} bytes; remembering size", id, len);
            *entry = len;
        }
    }
}

impl Default for CodecContext {
    fn default() -> Self {
        Self::with_config(CodecConfig::default())
    }
}

impl fmt::Debug for CodecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecContext")
            .field("config", &self.config)
            .field("size_hints", &self.size_hints)
            .finish_non_exhaustive()
    }
}

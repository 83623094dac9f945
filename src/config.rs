// Codec configuration.
//
// Loaded from YAML (every field optional), then overridden from
// BEDROCK_CODEC_* environment variables. A `.env` file in the working
// directory is read first, like the proxy does for its database settings.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ENV_PREFIX: &str = "BEDROCK_CODEC_";

fn d_protocol_version() -> i32 {
    712
}
fn d_large_packet_threshold() -> usize {
    85_000
}
fn d_compression_level() -> u32 {
    1
}
fn d_max_batch_size() -> usize {
    16 * 1024 * 1024
}
fn d_max_list_length() -> usize {
    1 << 20
}
fn d_max_string_length() -> usize {
    1 << 20
}
fn d_shield_item_id() -> i32 {
    513
}
fn d_pool_max_idle() -> usize {
    1024
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Protocol version stamped into capture logs.
    #[serde(default = "d_protocol_version")]
    pub protocol_version: i32,
    /// Encodings at or above this size are remembered per packet id so later
    /// encodes of that id start with a buffer large enough to hold them.
    #[serde(default = "d_large_packet_threshold")]
    pub large_packet_threshold: usize,
    /// Deflate level for batch wrappers (0-9).
    #[serde(default = "d_compression_level")]
    pub compression_level: u32,
    /// Cap on the inflated size of one batch.
    #[serde(default = "d_max_batch_size")]
    pub max_batch_size: usize,
    /// Cap on any declared collection count.
    #[serde(default = "d_max_list_length")]
    pub max_list_length: usize,
    #[serde(default = "d_max_string_length")]
    pub max_string_length: usize,
    /// Persistent item id whose extra data carries a blocking tick.
    #[serde(default = "d_shield_item_id")]
    pub shield_item_id: i32,
    /// Idle instances kept per packet type.
    #[serde(default = "d_pool_max_idle")]
    pub pool_max_idle: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            protocol_version: d_protocol_version(),
            large_packet_threshold: d_large_packet_threshold(),
            compression_level: d_compression_level(),
            max_batch_size: d_max_batch_size(),
            max_list_length: d_max_list_length(),
            max_string_length: d_max_string_length(),
            shield_item_id: d_shield_item_id(),
            pool_max_idle: d_pool_max_idle(),
        }
    }
}

impl CodecConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse codec config YAML")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read codec config: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid codec config in {}", path.display()))
    }

    /// File (if any), then `.env`, then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenv::dotenv();

        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(env::vars())?;
        Ok(config)
    }

    /// Applies `BEDROCK_CODEC_<FIELD>` overrides from `vars`. Unknown keys
    /// under the prefix are ignored with a warning.
    pub fn apply_env_overrides(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<()> {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.trim();
            match field {
                "PROTOCOL_VERSION" => self.protocol_version = parse_env(&key, value)?,
                "LARGE_PACKET_THRESHOLD" => self.large_packet_threshold = parse_env(&key, value)?,
                "COMPRESSION_LEVEL" => self.compression_level = parse_env(&key, value)?,
                "MAX_BATCH_SIZE" => self.max_batch_size = parse_env(&key, value)?,
                "MAX_LIST_LENGTH" => self.max_list_length = parse_env(&key, value)?,
                "MAX_STRING_LENGTH" => self.max_string_length = parse_env(&key, value)?,
                "SHIELD_ITEM_ID" => self.shield_item_id = parse_env(&key, value)?,
                "POOL_MAX_IDLE" => self.pool_max_idle = parse_env(&key, value)?,
                _ => {
                    warn!("Ignoring unknown codec setting {}", key);
                    continue;
                }
            }
            debug!("Codec setting {} overridden from environment", key);
        }

        if self.compression_level > 9 {
            warn!(
                "Compression level {} out of range, clamping to 9",
                self.compression_level
            );
            self.compression_level = 9;
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("Invalid value {:?} for {}", value, key))
}

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Per-message dispatch settings
///
/// Names (`operation`, `transcoder`, `mode`) are kept as strings here and
/// resolved by the processor at construction, where unknown values become
/// [`crate::ConfigurationError`]s.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProcessorConfig {
    /// Interpolated document key
    #[serde(default = "default_key")]
    pub key: String,

    /// Value mapping, required by insert, replace and upsert
    #[serde(default)]
    pub value: Option<String>,

    /// get, insert, remove, replace or upsert; get when unset
    #[serde(default)]
    pub operation: Option<String>,

    /// raw, rawjson, rawstring, json or legacy; raw when unset
    #[serde(default)]
    pub transcoder: Option<String>,

    /// bulk or concurrent
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Concurrent mode only: calls in flight per batch, 0 for unbounded
    #[serde(default)]
    pub max_in_flight: usize,

    /// Messages grouped into one round trip by the binary
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            value: None,
            operation: None,
            transcoder: None,
            mode: default_mode(),
            max_in_flight: 0,
            batch_size: default_batch_size(),
        }
    }
}

impl ProcessorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "processor.key cannot be empty".into(),
            )));
        }

        if self.batch_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "processor.batch_size must be greater than 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_key() -> String {
    "${! content() }".to_string()
}
fn default_mode() -> String {
    "bulk".to_string()
}
fn default_batch_size() -> usize {
    64
}

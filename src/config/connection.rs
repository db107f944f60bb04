use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Store connection parameters
///
/// Owned by the connection layer; the processor only reads `bucket`,
/// `collection` and `timeout`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectionConfig {
    /// Cluster address
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Named collection inside the bucket, default collection when unset
    #[serde(default)]
    pub collection: Option<String>,

    /// Applied uniformly to the readiness wait and to every operation
    #[serde(default)]
    pub timeout_in_ms: Option<u64>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            username: String::new(),
            password: String::new(),
            bucket: default_bucket(),
            collection: None,
            timeout_in_ms: None,
        }
    }
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_in_ms.unwrap_or(DEFAULT_TIMEOUT_IN_MS))
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "connection.server cannot be empty".into(),
            )));
        }

        if self.bucket.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "connection.bucket cannot be empty".into(),
            )));
        }

        if let Some(collection) = &self.collection {
            if collection.trim().is_empty() {
                return Err(Error::Config(ConfigError::Message(
                    "connection.collection cannot be blank when set".into(),
                )));
            }
        }

        if self.timeout_in_ms == Some(0) {
            return Err(Error::Config(ConfigError::Message(
                "connection.timeout_in_ms must be at least 1ms".into(),
            )));
        }

        Ok(())
    }
}

/// Default per-operation budget (2.5s)
const DEFAULT_TIMEOUT_IN_MS: u64 = 2500;

fn default_server() -> String {
    "memory://localhost".to_string()
}
fn default_bucket() -> String {
    "default".to_string()
}

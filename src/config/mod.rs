//! Configuration management for the document processor.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod connection;
mod processor;
pub use connection::*;
pub use processor::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

const ENV_PREFIX: &str = "DOCSTORE";

/// Top-level configuration container
///
/// Sources are merged with increasing priority:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables prefixed with `DOCSTORE__`
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct DocstoreConfig {
    /// Store connection parameters, consumed by the connection layer
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Per-message dispatch settings
    #[serde(default)]
    pub processor: ProcessorConfig,
}

impl Debug for DocstoreConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        // password stays out of logs
        f.debug_struct("DocstoreConfig")
            .field("server", &self.connection.server)
            .field("bucket", &self.connection.bucket)
            .field("processor", &self.processor)
            .finish()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

impl DocstoreConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Note
    /// Validation is deferred so that further overrides can be applied with
    /// [`with_override_config`](Self::with_override_config). Callers must call
    /// [`validate`](Self::validate) before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/processor.toml");
    /// std::env::set_var("DOCSTORE__PROCESSOR__OPERATION", "upsert");
    /// let cfg = DocstoreConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        let config: Self = builder.add_source(environment()).build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.connection.validate()?;
        self.processor.validate()?;
        Ok(self)
    }
}

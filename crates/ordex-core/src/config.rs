use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use serde::Deserialize;
use thiserror::Error as ThisError;

/// Default ceiling for a single serialized entity payload (4 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: u32 = 4 * 1024 * 1024;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Config, err.to_string())
    }
}

///
/// DbConfig
///
/// Runtime knobs for a [`Db`](crate::db::Db) handle. Every field has a
/// default, so an empty TOML document is a valid config.
///
/// ```toml
/// debug = true
/// metrics = false
/// max_payload_bytes = 65536
/// ```
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Emit `tracing` debug events for every executor call.
    pub debug: bool,

    /// Route executor events through the metrics sink.
    pub metrics: bool,

    /// Largest payload accepted on write or decoded on read.
    pub max_payload_bytes: u32,
}

impl DbConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_payload_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub const fn metrics(mut self, metrics: bool) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub const fn max_payload_bytes(mut self, max_payload_bytes: u32) -> Self {
        self.max_payload_bytes = max_payload_bytes;
        self
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            debug: false,
            metrics: true,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

///
/// TESTS
///

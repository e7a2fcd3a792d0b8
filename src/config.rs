// In: src/config.rs

//! The single source of truth for bulk-copy configuration.
//!
//! `LoaderConfig` is resolved once at the application boundary (from the
//! `ARROW_BULKCOPY_CONFIG` environment variable for foreign callers, or built
//! directly by in-process callers) and then passed down by reference. Every field
//! has a default, so an empty JSON object is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BulkCopyError;

/// Environment variable holding a JSON-encoded [`LoaderConfig`].
pub const CONFIG_ENV_VAR: &str = "ARROW_BULKCOPY_CONFIG";

//==================================================================================
// I. Batch Policy
//==================================================================================

/// What to do with an IPC stream that carries more than one record batch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// **Default:** load the first batch and ignore the rest (a warning is logged).
    #[default]
    FirstOnly,

    /// Load every batch in the stream as one contiguous row source.
    All,

    /// Reject a stream with more than one batch as a decode error.
    RejectMultiple,
}

//==================================================================================
// II. The Unified LoaderConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct LoaderConfig {
    /// Bulk-write timeout used when the caller passes a timeout of zero.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Encoded bytes buffered before a `CopyData` frame is sent to the server.
    #[serde(default = "default_copy_buffer_bytes")]
    pub copy_buffer_bytes: usize,

    #[serde(default)]
    pub batch_policy: BatchPolicy,

    /// Worker threads for the process-wide runtime. Only read when the runtime
    /// is first started; `None` lets tokio pick.
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            copy_buffer_bytes: default_copy_buffer_bytes(),
            batch_policy: BatchPolicy::default(),
            worker_threads: None,
        }
    }
}

impl LoaderConfig {
    pub fn from_json(json: &str) -> Result<Self, BulkCopyError> {
        let config: LoaderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from [`CONFIG_ENV_VAR`], falling back to defaults
    /// when the variable is unset or blank.
    pub fn from_env() -> Result<Self, BulkCopyError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(json) if !json.trim().is_empty() => Self::from_json(&json),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    fn validate(&self) -> Result<(), BulkCopyError> {
        if self.default_timeout_secs == 0 {
            return Err(BulkCopyError::invalid_argument(
                "default_timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.copy_buffer_bytes == 0 {
            return Err(BulkCopyError::invalid_argument(
                "copy_buffer_bytes",
                "must be greater than zero",
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(BulkCopyError::invalid_argument(
                "worker_threads",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Matches the default bulk-copy timeout of common SQL drivers.
fn default_timeout_secs() -> u64 {
    30
}

fn default_copy_buffer_bytes() -> usize {
    1 << 20
}

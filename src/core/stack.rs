//! Prerequisite stack outputs.
//!
//! The infra stack is referenced by a JSON file holding its exported outputs (a flat
//! object of output name to value). Secrets come from the config's `[secrets]` table
//! and can be overridden per key through `BERTH_SECRET_*` environment variables.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::core::constants;
use crate::core::deferred::Resolve;
use crate::error::{ConfigError, Result};

/// Resolver backed by exported stack outputs and configured secrets.
#[derive(Debug, Clone, Default)]
pub struct StackOutputs {
    outputs: BTreeMap<String, serde_json::Value>,
    secrets: BTreeMap<String, String>,
    env_overrides: bool,
}

impl StackOutputs {
    /// Load outputs from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::StackOutputsRead` if the file cannot be read, or
    /// `ConfigError::StackOutputsParse` if it is not a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading stack outputs");

        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::StackOutputsRead {
                path: path.to_path_buf(),
                source,
            })?;
        let outputs: BTreeMap<String, serde_json::Value> = serde_json::from_str(&contents)
            .map_err(|source| ConfigError::StackOutputsParse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(outputs = outputs.len(), "stack outputs loaded");
        Ok(Self {
            outputs,
            secrets: BTreeMap::new(),
            env_overrides: true,
        })
    }

    /// Add or replace an output.
    pub fn with_output(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.outputs.insert(key.into(), value);
        self
    }

    /// Use these configured secrets.
    pub fn with_secrets(mut self, secrets: BTreeMap<String, String>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Add or replace one secret.
    pub fn with_secret(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(key.into(), value.into());
        self
    }

    pub fn outputs(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.outputs
    }
}

/// Environment variable overriding a secret key.
///
/// `checkout-database-password` → `BERTH_SECRET_CHECKOUT_DATABASE_PASSWORD`
pub fn secret_env_var(key: &str) -> String {
    let suffix: String = key
        .chars()
        .map(|c| match c {
            '-' | '.' | ':' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    format!("{}{}", constants::SECRET_ENV_PREFIX, suffix)
}

impl Resolve for StackOutputs {
    fn stack_output(&self, key: &str) -> Option<serde_json::Value> {
        self.outputs.get(key).cloned()
    }

    fn secret(&self, key: &str) -> Option<String> {
        if self.env_overrides {
            if let Ok(value) = std::env::var(secret_env_var(key)) {
                return Some(value);
            }
        }
        self.secrets.get(key).cloned()
    }
}

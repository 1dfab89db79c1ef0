//! Stack configuration.
//!
//! Reads and validates `berth.toml`:
//!
//! ```toml
//! infra-stack = "stacks/infra.json"
//! environment = "DEV"
//! account-id = "123456789012"
//! enabled-applications = """
//! - name: checkout
//!   tag: v1.2.0
//! """
//!
//! [secrets]
//! checkout-database-password = "..."
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::application::EnabledApplication;
use crate::core::constants;
use crate::core::environment::Environment;
use crate::core::stack::StackOutputs;
use crate::core::validation::validate_account_id;
use crate::error::{ConfigError, Result};

/// `berth.toml` as written.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    infra_stack: Option<String>,
    environment: Option<String>,
    account_id: Option<String>,
    enabled_applications: Option<String>,
    #[serde(default)]
    secrets: BTreeMap<String, String>,
}

/// Validated stack configuration.
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// The file this configuration was read from
    pub path: PathBuf,
    /// Exported outputs of the prerequisite stack, resolved against the config's directory
    pub infra_stack: PathBuf,
    pub environment: Environment,
    /// AWS account owning the cluster and its IAM resources
    pub account_id: String,
    /// Applications to deploy, in configured order
    pub applications: Vec<EnabledApplication>,
    /// Configured secrets, keyed like `<app>-database-password`
    pub secrets: BTreeMap<String, String>,
}

impl StackConfig {
    /// Default configuration path in the current directory
    pub fn default_path() -> PathBuf {
        PathBuf::from(constants::CONFIG_FILE)
    }

    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file doesn't exist, `ConfigError::Parse`
    /// if the TOML is malformed, or a validation error.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let mut config = Self::from_toml_str(&contents, base_dir)?;
        config.path = path.to_path_buf();
        Ok(config)
    }

    /// Parse configuration text. A relative `infra-stack` is resolved against
    /// `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML, `ConfigError::MissingField` for
    /// an absent required key, or the error of the first invalid value.
    pub fn from_toml_str(contents: &str, base_dir: &Path) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents).map_err(ConfigError::Parse)?;

        let infra_stack = required(raw.infra_stack, "infra-stack")?;
        let environment: Environment = required(raw.environment, "environment")?.parse()?;
        let account_id = required(raw.account_id, "account-id")?;
        validate_account_id(&account_id)?;
        let applications = EnabledApplication::read(raw.enabled_applications.as_deref())?;

        let config = Self {
            path: base_dir.join(constants::CONFIG_FILE),
            infra_stack: base_dir.join(infra_stack),
            environment,
            account_id,
            applications,
            secrets: raw.secrets,
        };

        debug!(
            environment = %config.environment,
            applications = config.applications.len(),
            secrets = config.secrets.len(),
            "config loaded"
        );
        Ok(config)
    }

    /// Resolver for this configuration's stack outputs and secrets.
    ///
    /// # Errors
    ///
    /// Returns an error if the infra stack outputs cannot be read.
    pub fn resolver(&self) -> Result<StackOutputs> {
        Ok(StackOutputs::load(&self.infra_stack)?.with_secrets(self.secrets.clone()))
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingField { field }.into()),
    }
}

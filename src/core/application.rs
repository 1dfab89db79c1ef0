//! Enabled applications.
//!
//! Parses the `enabled-applications` config value: a YAML sequence of
//! `{name, tag}` mappings.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// One application to deploy, and the image tag to deploy it at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledApplication {
    pub name: String,
    pub tag: String,
}

impl EnabledApplication {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }

    /// Parse the configured application list.
    ///
    /// An absent or blank value yields no applications.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ApplicationsParse` if the value is not a sequence of
    /// mappings with scalar `name` and `tag` entries. Plain scalars such as `42` or
    /// `true` are taken verbatim as text.
    pub fn read(yaml: Option<&str>) -> Result<Vec<EnabledApplication>> {
        let yaml = match yaml.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => return Ok(Vec::new()),
        };

        let applications: Vec<EnabledApplication> =
            serde_yaml::from_str(yaml).map_err(ConfigError::ApplicationsParse)?;

        debug!(count = applications.len(), "enabled applications parsed");
        Ok(applications)
    }
}

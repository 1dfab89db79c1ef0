//! Helm release type.

use serde::{Deserialize, Serialize};

/// A Helm chart release.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelmRelease {
    pub name: String,
    pub chart: String,
    pub version: String,
    pub namespace: String,
    pub repository_opts: RepositoryOpts,
    /// Chart values
    pub values: serde_json::Value,
}

/// Chart repository
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RepositoryOpts {
    pub repo: String,
}

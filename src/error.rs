//! Error types.
//!
//! Every error aborts the current declarative pass. Errors raised while resolving or
//! applying a descriptor are wrapped with the descriptor's URN so the operator can see
//! which resource failed and why.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A descriptor body could not be resolved.
    #[error("{descriptor}: {source}")]
    Descriptor {
        descriptor: String,
        #[source]
        source: Box<Error>,
    },

    /// The reconciliation engine rejected a descriptor.
    #[error("failed to apply {descriptor}: {source}")]
    Reconcile {
        descriptor: String,
        #[source]
        source: ReconcileError,
    },

    #[error("failed to serialize output: {0}")]
    Serialize(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading and parsing errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("missing required config key: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown environment '{0}' (expected DEV, STAGING or PROD)")]
    UnknownEnvironment(String),

    /// `enabled-applications` is not a sequence of `{name, tag}` mappings.
    #[error("malformed enabled-applications: {0}")]
    ApplicationsParse(#[source] serde_yaml::Error),

    #[error("failed to read stack outputs from {}: {source}", path.display())]
    StackOutputsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed stack outputs in {}: {source}", path.display())]
    StackOutputsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while composing descriptors.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("malformed OIDC issuer URL '{url}': expected an https:// URL")]
    MalformedIssuerUrl { url: String },

    #[error("invalid application '{application}': {reason}")]
    InvalidApplicationSpec { application: String, reason: String },

    #[error("descriptor already emitted: {0}")]
    DuplicateDescriptor(String),

    #[error("{descriptor} depends on {dependency}, which has not been emitted")]
    UnknownDependency {
        descriptor: String,
        dependency: String,
    },
}

/// Errors raised while resolving deferred values.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("stack output not found: {0}")]
    MissingStackOutput(String),

    #[error("stack output {0} is not a string")]
    NotAString(String),

    #[error("failed to fingerprint resource: {0}")]
    Fingerprint(#[source] serde_json::Error),
}

/// Opaque failure surfaced by the reconciliation engine.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("{engine} rejected the descriptor: {message}")]
    Rejected {
        engine: &'static str,
        message: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, Error>;

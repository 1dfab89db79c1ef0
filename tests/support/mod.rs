//! Test support utilities for berth integration tests.
//!
//! Provides an isolated stack directory and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;
use tempfile::TempDir;

/// Test environment holding a `berth.toml` and an infra stack outputs file.
///
/// Child processes use `.current_dir()` so tests can run in parallel.
pub struct Test {
    /// Temporary stack directory
    pub dir: TempDir,
}

impl Test {
    /// Create an empty stack directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Create a stack directory with the given config and the standard infra outputs.
    pub fn with_config(config: &str) -> Self {
        let t = Self::new();
        t.write("berth.toml", config);
        t.write("infra.json", INFRA_OUTPUTS);
        t
    }

    /// Standard stack: `checkout` with a password, `catalog` without.
    pub fn standard() -> Self {
        Self::with_config(STANDARD_CONFIG)
    }

    /// Write a file relative to the stack directory.
    pub fn write(&self, name: &str, contents: &str) {
        std::fs::write(self.path(name), contents).expect("failed to write file");
    }

    /// Path relative to the stack directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a berth command running in the stack directory.
    ///
    /// Inherited `BERTH_*` variables and colors are cleared.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("berth").expect("failed to find berth binary");
        cmd.env_remove("BERTH_CONFIG");
        cmd.env_remove("BERTH_LOG");
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `berth render`.
    pub fn render(&self, args: &[&str]) -> Output {
        self.cmd()
            .arg("render")
            .args(args)
            .output()
            .expect("failed to run berth render")
    }

    /// Shortcut for `berth apply --out-dir <dir>`.
    pub fn apply(&self, out_dir: &str) -> Output {
        self.cmd()
            .args(["apply", "--out-dir", out_dir])
            .output()
            .expect("failed to run berth apply")
    }

    /// Shortcut for `berth check`.
    pub fn check(&self) -> Output {
        self.cmd()
            .arg("check")
            .output()
            .expect("failed to run berth check")
    }

    /// Shortcut for `berth graph`.
    pub fn graph(&self) -> Output {
        self.cmd()
            .arg("graph")
            .output()
            .expect("failed to run berth graph")
    }
}

//! Apply command.

use std::path::Path;

use crate::cli::output;
use crate::core::compose::compose_stack;
use crate::core::config::StackConfig;
use crate::core::engine::{ManifestWriter, PLAN_INDEX_FILE};
use crate::error::Result;

/// Resolve the stack and write it out with [`ManifestWriter`].
pub fn execute(config: &StackConfig, out_dir: &Path) -> Result<()> {
    let plan = compose_stack(config)?;
    let resolved = plan.resolve(&config.resolver()?)?;

    let mut writer = ManifestWriter::new(out_dir);
    let applied = resolved.apply(&mut writer)?;

    output::success(&format!(
        "wrote {} manifests to {}",
        applied,
        output::path(out_dir.display())
    ));
    output::kv(
        "index:",
        out_dir.join(PLAN_INDEX_FILE).display().to_string(),
    );
    Ok(())
}

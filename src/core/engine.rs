//! Reconciliation engines.
//!
//! An [`Engine`] receives resolved descriptors in dependency order and makes them
//! real. Diffing against live state, retries and rollback belong to the engine; a
//! failure it reports aborts the pass verbatim.
//!
//! ## Engines
//!
//! - [`ManifestWriter`]: writes one manifest per descriptor plus a `plan.json` index
//!   for an external reconciler to consume.
//! - [`DryRun`]: records what would be applied. Can be told to reject a descriptor.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::core::plan::{ResolvedDescriptor, Urn};
use crate::error::ReconcileError;

/// Index file written next to the manifests.
pub const PLAN_INDEX_FILE: &str = "plan.json";

/// Receives resolved descriptors in dependency order.
pub trait Engine {
    /// Engine name for logs and errors.
    fn name(&self) -> &'static str;

    /// Apply one descriptor. Dependencies have already been applied.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError` if the engine could not apply the descriptor.
    fn apply(&mut self, descriptor: &ResolvedDescriptor) -> Result<(), ReconcileError>;

    /// Called once after every descriptor was applied.
    fn finish(&mut self) -> Result<(), ReconcileError> {
        Ok(())
    }
}

/// One entry of `plan.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexEntry {
    urn: Urn,
    #[serde(rename = "type")]
    type_token: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    file: String,
    depends_on: Vec<Urn>,
    secret: bool,
    fingerprint: String,
}

#[derive(Debug, Serialize)]
struct PlanIndex<'a> {
    descriptors: &'a [IndexEntry],
}

/// Writes `NN-<kind>-<name>.yaml` per descriptor into an output directory.
///
/// The directory always mirrors the last applied plan: manifests and the index left
/// by an earlier run are removed before the first write. Manifests derived from
/// secret values are written with mode 0600 on Unix.
#[derive(Debug)]
pub struct ManifestWriter {
    out_dir: PathBuf,
    entries: Vec<IndexEntry>,
    prepared: bool,
}

impl ManifestWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            entries: Vec::new(),
            prepared: false,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// File name for the `seq`-th descriptor (1-based).
    pub fn manifest_name(seq: usize, descriptor: &ResolvedDescriptor) -> String {
        format!("{:02}-{}-{}.yaml", seq, descriptor.kind.slug(), descriptor.name)
    }

    /// Create the output directory and remove what an earlier run wrote there.
    fn prepare(&mut self) -> Result<(), ReconcileError> {
        if self.prepared {
            return Ok(());
        }
        fs::create_dir_all(&self.out_dir)?;

        let mut removed = 0usize;
        for entry in fs::read_dir(&self.out_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if is_written_file(&name.to_string_lossy()) {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }

        debug!(out_dir = %self.out_dir.display(), removed, "cleared previous plan");
        self.prepared = true;
        Ok(())
    }
}

/// `plan.json` or a `NN-<kind>-<name>.yaml` manifest.
fn is_written_file(name: &str) -> bool {
    if name == PLAN_INDEX_FILE {
        return true;
    }
    let digits = name.bytes().take_while(|b| b.is_ascii_digit()).count();
    digits >= 2 && name.as_bytes().get(digits) == Some(&b'-') && name.ends_with(".yaml")
}

impl Engine for ManifestWriter {
    fn name(&self) -> &'static str {
        "manifest-writer"
    }

    fn apply(&mut self, descriptor: &ResolvedDescriptor) -> Result<(), ReconcileError> {
        self.prepare()?;

        let file = Self::manifest_name(self.entries.len() + 1, descriptor);
        let contents = serde_yaml::to_string(&descriptor.resource)
            .map_err(|e| ReconcileError::Serialize(e.to_string()))?;
        write_file(&self.out_dir.join(&file), &contents, descriptor.secret)?;
        debug!(urn = %descriptor.urn, file = %file, "wrote manifest");

        self.entries.push(IndexEntry {
            urn: descriptor.urn.clone(),
            type_token: descriptor.kind.type_token(),
            parent: descriptor.parent.clone(),
            file,
            depends_on: descriptor.depends_on.clone(),
            secret: descriptor.secret,
            fingerprint: descriptor.fingerprint.clone(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReconcileError> {
        self.prepare()?;
        let index = serde_json::to_string_pretty(&PlanIndex {
            descriptors: &self.entries,
        })
        .map_err(|e| ReconcileError::Serialize(e.to_string()))?;
        write_file(&self.out_dir.join(PLAN_INDEX_FILE), &index, false)?;

        info!(
            out_dir = %self.out_dir.display(),
            manifests = self.entries.len(),
            "wrote plan"
        );
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str, private: bool) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mode = if private { 0o600 } else { 0o644 };
        let mut file = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .mode(mode)
            .open(path)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;

        // Mode only applies on create; tighten existing files too.
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }

    #[cfg(not(unix))]
    {
        let _ = private;
        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;
    }

    Ok(())
}

/// Records descriptors instead of applying them.
#[derive(Debug, Default)]
pub struct DryRun {
    applied: Vec<ResolvedDescriptor>,
    reject: Option<Urn>,
    finished: bool,
}

impl DryRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dry run that rejects the given descriptor.
    pub fn rejecting(urn: Urn) -> Self {
        Self {
            reject: Some(urn),
            ..Self::default()
        }
    }

    /// URNs applied so far, in order.
    pub fn applied(&self) -> Vec<&Urn> {
        self.applied.iter().map(|d| &d.urn).collect()
    }

    pub fn descriptors(&self) -> &[ResolvedDescriptor] {
        &self.applied
    }

    pub fn finished(&self) -> bool {
        self.finished
    }
}

impl Engine for DryRun {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn apply(&mut self, descriptor: &ResolvedDescriptor) -> Result<(), ReconcileError> {
        if self.reject.as_ref() == Some(&descriptor.urn) {
            return Err(ReconcileError::Rejected {
                engine: "dry-run",
                message: format!("{} refused", descriptor.urn),
            });
        }
        self.applied.push(descriptor.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReconcileError> {
        self.finished = true;
        Ok(())
    }
}

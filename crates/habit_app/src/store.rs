use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use habit_core::{Snapshot, SnapshotStore};
use tracing::debug;

/// Keeps the snapshot as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no snapshot on disk yet");
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("unable to read {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("unable to parse {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("unable to create {}", parent.display()))?;
            }
        }
        let payload =
            serde_json::to_string_pretty(snapshot).context("unable to encode habit snapshot")?;
        // Staged beside the target, then renamed over it.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload)
            .with_context(|| format!("unable to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("unable to replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), "snapshot written");
        Ok(())
    }
}

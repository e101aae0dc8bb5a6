//! Persistence of the deployment-state document
//!
//! The teardown calls [`StateStore::dump`] after every single deletion, so an
//! implementation must have the write on disk by the time it returns.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{DeploymentState, Error, Result};

/// Sink for deployment-state snapshots
pub trait StateStore: Send {
    /// Persist the current state
    fn dump(&mut self, state: &DeploymentState) -> Result<()>;

    /// Drop the state together with its backing storage
    fn discard(&mut self) -> Result<()>;
}

/// JSON file backed store
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored state, `None` when nothing is stored
    pub fn load(&self) -> Result<Option<DeploymentState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&content).map_err(|e| {
            Error::Persistence(format!("failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(state))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Flush the directory entry of `path` so a completed rename survives a crash
#[cfg(unix)]
fn sync_parent(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> Result<()> {
    Ok(())
}

impl StateStore for FileStateStore {
    fn dump(&mut self, state: &DeploymentState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // write aside, sync, then swap in
        let temp = self.temp_path();
        let mut file = fs::File::create(&temp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp, &self.path).map_err(|e| {
            Error::Persistence(format!("failed to replace {}: {}", self.path.display(), e))
        })?;
        sync_parent(&self.path)?;
        debug!("Persisted deployment state to {}", self.path.display());
        Ok(())
    }

    fn discard(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Discarded deployment state {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store remembering every snapshot; `None` marks a discard
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    pub snapshots: Vec<Option<DeploymentState>>,
    fail_after: Option<usize>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every dump after `count` successful ones
    pub fn failing_after(count: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            fail_after: Some(count),
        }
    }

    /// Latest snapshot, `None` when nothing was stored or the state was discarded
    pub fn latest(&self) -> Option<&DeploymentState> {
        self.snapshots.last().and_then(Option::as_ref)
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self.snapshots.last(), Some(None))
    }
}

impl StateStore for MemoryStateStore {
    fn dump(&mut self, state: &DeploymentState) -> Result<()> {
        if self.fail_after.is_some_and(|n| self.snapshots.len() >= n) {
            return Err(Error::Persistence("disk full".to_string()));
        }
        self.snapshots.push(Some(state.clone()));
        Ok(())
    }

    fn discard(&mut self) -> Result<()> {
        self.snapshots.push(None);
        Ok(())
    }
}

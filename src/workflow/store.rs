//! Snapshot persistence for [`WorkflowState`].
//!
//! The store holds exactly one snapshot. `save` replaces it whole; `load`
//! never fails and falls back to the canonical empty state.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::state::WorkflowState;

/// Errors raised while persisting a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("state store I/O failed at {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Snapshot could not be serialized.
    #[error("failed to serialize workflow state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable home of the single workflow snapshot.
pub trait StateStore: Send + Sync {
    /// Last persisted snapshot, or the canonical empty state.
    fn load(&self) -> WorkflowState;

    /// Overwrite the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the snapshot cannot be written.
    fn save(&self, state: &WorkflowState) -> Result<(), StoreError>;
}

/// Overwrite the snapshot with the canonical empty state.
///
/// The log and counters are discarded; the storage location itself is kept.
///
/// # Errors
///
/// Returns [`StoreError`] when the snapshot cannot be written.
pub fn reset_snapshot(store: &dyn StateStore) -> Result<WorkflowState, StoreError> {
    let state = WorkflowState::default();
    store.save(&state)?;
    Ok(state)
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`. Nothing is touched until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> WorkflowState {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot yet, starting empty");
                return WorkflowState::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable snapshot, starting empty");
                return WorkflowState::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed snapshot, starting empty");
                WorkflowState::default()
            }
        }
    }

    fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(parent, e))?;
        }

        let body = serde_json::to_string_pretty(state)?;
        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, body).map_err(|e| self.io_err(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_err(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            step = %state.current_step,
            log_len = state.execution_log.len(),
            "snapshot saved"
        );
        Ok(())
    }
}

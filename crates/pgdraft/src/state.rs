//! Import state persistence for resumable runs.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{PgDraftError, Result};

/// Phases of an import run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Sampling,
    Sampled,
    Inferring,
    Inferred,
    Generating,
    Generated,
    Importing,
    Completed,
    Failed,
}

impl ImportPhase {
    fn key(&self) -> &'static str {
        match self {
            ImportPhase::Sampling => "sampling",
            ImportPhase::Sampled => "sampled",
            ImportPhase::Inferring => "inferring",
            ImportPhase::Inferred => "inferred",
            ImportPhase::Generating => "generating",
            ImportPhase::Generated => "generated",
            ImportPhase::Importing => "importing",
            ImportPhase::Completed => "completed",
            ImportPhase::Failed => "failed",
        }
    }
}

/// Overall import status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Persisted state of one import operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportState {
    /// State format version.
    pub version: String,
    /// Source CSV path.
    pub csv_path: PathBuf,
    /// SHA-256 checksum of the CSV file (`sha256:<hex>`).
    pub csv_checksum: String,
    /// Target table name.
    pub table_name: String,
    /// Overall status.
    pub status: ImportStatus,
    /// Last completed or current phase.
    pub phase: ImportPhase,
    /// Phase completion timestamps.
    #[serde(default)]
    pub timestamps: BTreeMap<String, DateTime<Utc>>,
    /// Failure message, if failed.
    #[serde(default)]
    pub error: Option<String>,
}

impl ImportState {
    /// Mark a phase as reached.
    pub fn mark_phase(&mut self, phase: ImportPhase) {
        self.phase = phase;
        self.status = ImportStatus::InProgress;
        self.timestamps.insert(phase.key().to_string(), Utc::now());
    }

    /// Mark the import as failed.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = ImportStatus::Failed;
        self.phase = ImportPhase::Failed;
        self.error = Some(error.into());
        self.timestamps.insert("failed".to_string(), Utc::now());
    }

    /// Mark the import as completed.
    pub fn mark_completed(&mut self) {
        self.status = ImportStatus::Completed;
        self.phase = ImportPhase::Completed;
        self.timestamps.insert("completed".to_string(), Utc::now());
    }
}

/// Compute the SHA-256 checksum of a file, streaming.
pub fn compute_file_checksum(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| PgDraftError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer).map_err(|e| PgDraftError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("sha256:{:x}", hasher.finalize()))
}

/// Manages state persistence and resume checks.
pub struct StateManager {
    state_file: PathBuf,
}

impl StateManager {
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
        }
    }

    /// Path of the managed state file.
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Atomically save state: write to a temp file, then rename.
    pub fn save_state(&self, state: &ImportState) -> Result<()> {
        if let Some(parent) = self.state_file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PgDraftError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp_path = self.state_file.with_extension("json.tmp");

        std::fs::write(&tmp_path, json).map_err(|e| PgDraftError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &self.state_file).map_err(|e| PgDraftError::Io {
            path: self.state_file.clone(),
            source: e,
        })?;

        debug!(file = %self.state_file.display(), "saved import state");
        Ok(())
    }

    /// Load and validate state from the managed file.
    pub fn load_state(&self) -> Result<ImportState> {
        let contents = std::fs::read_to_string(&self.state_file).map_err(|e| PgDraftError::Io {
            path: self.state_file.clone(),
            source: e,
        })?;

        let state: ImportState = serde_json::from_str(&contents)
            .map_err(|e| PgDraftError::State(format!("invalid state file: {e}")))?;

        debug!(file = %self.state_file.display(), "loaded import state");
        Ok(state)
    }

    /// Check whether an import can be resumed against the given CSV.
    ///
    /// Returns the decision plus a human-readable reason.
    pub fn can_resume(&self, state: &ImportState, csv_path: &Path) -> (bool, String) {
        if state.status == ImportStatus::Completed {
            return (false, "import already completed".to_string());
        }

        if state.csv_path != csv_path {
            return (
                false,
                format!(
                    "CSV path mismatch: {} != {}",
                    state.csv_path.display(),
                    csv_path.display()
                ),
            );
        }

        match compute_file_checksum(csv_path) {
            Ok(checksum) if checksum != state.csv_checksum => {
                (false, "CSV file has changed (checksum mismatch)".to_string())
            }
            Err(e) => (false, format!("failed to verify CSV: {e}")),
            Ok(_) => match state.status {
                ImportStatus::Failed => (
                    true,
                    format!("can resume from failed state (phase: {:?})", state.phase),
                ),
                ImportStatus::InProgress => (
                    true,
                    format!("can resume from in-progress state (phase: {:?})", state.phase),
                ),
                ImportStatus::Pending => (true, "import has not started".to_string()),
                ImportStatus::Completed => unreachable!(),
            },
        }
    }

    /// Create and persist the initial state for a new import.
    pub fn create_initial_state(
        &self,
        csv_path: &Path,
        table_name: impl Into<String>,
    ) -> Result<ImportState> {
        let checksum = compute_file_checksum(csv_path)?;

        let mut state = ImportState {
            version: "1.0".to_string(),
            csv_path: csv_path.to_path_buf(),
            csv_checksum: checksum,
            table_name: table_name.into(),
            status: ImportStatus::Pending,
            phase: ImportPhase::Sampling,
            timestamps: BTreeMap::new(),
            error: None,
        };
        state.timestamps.insert("started".to_string(), Utc::now());

        self.save_state(&state)?;
        Ok(state)
    }

    /// Mark a phase complete and persist.
    pub fn mark_phase_complete(&self, state: &mut ImportState, phase: ImportPhase) -> Result<()> {
        state.mark_phase(phase);
        self.save_state(state)
    }

    /// Mark the import failed and persist.
    pub fn mark_failed(&self, state: &mut ImportState, error: impl Into<String>) -> Result<()> {
        state.mark_failed(error);
        self.save_state(state)
    }

    /// Mark the import completed and persist.
    pub fn mark_completed(&self, state: &mut ImportState) -> Result<()> {
        state.mark_completed();
        self.save_state(state)
    }
}

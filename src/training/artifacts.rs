use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::launcher::{ARTIFACTS_FILE, CHECKPOINTS_DIR, LATEST_CHECKPOINT};
use crate::errors::TrainError;
use crate::training::scale::ScaleConfig;

/// Record of a finished run, written next to its checkpoints directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingArtifacts {
    /// Scale preset name.
    pub scale: String,
    /// Final checkpoint written by the trainer.
    pub checkpoint: PathBuf,
    /// Settings the run used.
    pub scale_config: ScaleConfig,
    /// Data location exactly as the caller passed it.
    pub data_dir: String,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

/// `<output_dir>/<exp_name>/checkpoints/epoch_latest.pt`
pub fn final_checkpoint_path(output_dir: &Path, exp_name: &str) -> PathBuf {
    output_dir
        .join(exp_name)
        .join(CHECKPOINTS_DIR)
        .join(LATEST_CHECKPOINT)
}

/// Fail unless the trainer left a checkpoint at `checkpoint`.
pub fn ensure_checkpoint_exists(checkpoint: &Path) -> Result<(), TrainError> {
    if checkpoint.is_file() {
        Ok(())
    } else {
        Err(TrainError::MissingCheckpoint(
            checkpoint.display().to_string(),
        ))
    }
}

impl TrainingArtifacts {
    /// Where the record for `self.checkpoint` is stored: two levels above it.
    pub fn record_path(&self) -> PathBuf {
        let experiment_dir = self
            .checkpoint
            .parent()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new("."));
        experiment_dir.join(ARTIFACTS_FILE)
    }

    /// Write the record as pretty JSON and return its path.
    pub fn persist(&self) -> Result<PathBuf, TrainError> {
        let path = self.record_path();
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(&path, payload)?;
        info!(path = %path.display(), "saved training artifacts");
        Ok(path)
    }

    /// Read a record written by `persist`.
    pub fn load(path: &Path) -> Result<Self, TrainError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

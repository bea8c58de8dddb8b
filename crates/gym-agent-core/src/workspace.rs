//! On-disk layout of a Gym Agent home directory.
//!
//! ```text
//! <home>/
//!   memory/workout_history.json   append-only workout history
//!   data/equipments_db.json       static equipment table (read-only)
//!   logs/decision_trace_*.log     one decision trace per process
//!   logs/last_run_outputs.json    outputs of the most recent pipeline run
//! ```

use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub const MEMORY_DIR: &str = "memory";
pub const LOG_DIR: &str = "logs";
pub const DATA_DIR: &str = "data";

pub const WORKOUT_HISTORY_FILE: &str = "workout_history.json";
pub const EQUIPMENT_DB_FILE: &str = "equipments_db.json";
pub const LAST_RUN_OUTPUTS_FILE: &str = "last_run_outputs.json";

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Open the workspace rooted at `root`, creating the three working
    /// directories if they do not exist yet.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let ws = Self::new(root);
        ws.ensure_dirs()?;
        Ok(ws)
    }

    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        for dir in [self.memory_dir(), self.logs_dir(), self.data_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.root.join(MEMORY_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn history_path(&self) -> PathBuf {
        self.memory_dir().join(WORKOUT_HISTORY_FILE)
    }

    pub fn equipment_db_path(&self) -> PathBuf {
        self.data_dir().join(EQUIPMENT_DB_FILE)
    }

    pub fn last_run_outputs_path(&self) -> PathBuf {
        self.logs_dir().join(LAST_RUN_OUTPUTS_FILE)
    }
}

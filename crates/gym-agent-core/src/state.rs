//! Shared state for one gym-agent home directory.

use std::path::Path;
use std::sync::Arc;

use crate::decision_log::DecisionLog;
use crate::error::StoreError;
use crate::store::HistoryStore;
use crate::workflow::{AgentCaller, PipelineExecutor};
use crate::workspace::Workspace;

pub struct AppStateInner {
    pub workspace: Workspace,
    pub log: DecisionLog,
    pub history: HistoryStore,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    /// Open the home directory, creating `memory/`, `logs/` and `data/`.
    /// With `trace` set, a new decision trace file is started in `logs/`.
    pub fn open(root: impl AsRef<Path>, trace: bool) -> Result<AppState, StoreError> {
        let workspace = Workspace::open(root)?;
        let log = if trace {
            DecisionLog::create(workspace.logs_dir())?
        } else {
            DecisionLog::disabled()
        };
        Ok(Arc::new(Self {
            history: HistoryStore::new(workspace.history_path()),
            workspace,
            log,
        }))
    }

    pub fn executor(&self, caller: Arc<dyn AgentCaller>) -> PipelineExecutor {
        PipelineExecutor::new(self.workspace.clone(), caller, self.log.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_layout_and_trace() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppStateInner::open(tmp.path(), true).unwrap();
        assert!(state.workspace.memory_dir().is_dir());
        assert!(state.workspace.data_dir().is_dir());
        let trace = state.log.path().unwrap();
        assert!(trace.starts_with(state.workspace.logs_dir()));
        assert_eq!(state.history.path(), state.workspace.history_path().as_path());
    }

    #[test]
    fn open_without_trace_writes_no_log() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppStateInner::open(tmp.path(), false).unwrap();
        assert!(state.log.path().is_none());
        assert_eq!(std::fs::read_dir(state.workspace.logs_dir()).unwrap().count(), 0);
    }
}

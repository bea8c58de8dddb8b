//! Core error types for the Gym Agent platform.
//!
//! Nothing in the core silently swallows a failure: loaders return these
//! errors and the call site decides whether to substitute a default value
//! (see `JsonListStore::load_or_empty` and `equipment::lookup`).

use std::path::PathBuf;

/// Errors from the flat JSON files (history, equipment table, run outputs).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Malformed content in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("IO error on {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.into())
        } else {
            StoreError::Io {
                path: path.into(),
                reason: err.to_string(),
            }
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        StoreError::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors from the LLM boundary.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown adapter type: '{0}'")]
    UnknownAdapter(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    #[error("Tool loop exceeded {0} rounds")]
    ToolLoopExceeded(usize),

    #[error("User input unavailable: {0}")]
    Input(String),
}

/// Errors from loading, validating, or running a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("Failed to read '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid pipeline: {0}")]
    Invalid(String),

    #[error("Unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("Step '{step}' timed out after {secs}s")]
    Timeout { step: String, secs: u64 },

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(StoreError::io("x.json", err), StoreError::NotFound(_)));
    }

    #[test]
    fn error_display() {
        let err = StoreError::malformed("memory/workout_history.json", "expected a JSON array");
        assert!(err.to_string().contains("workout_history.json"));
        assert!(err.to_string().contains("expected a JSON array"));

        let err = PipelineError::Timeout {
            step: "workout_planner".into(),
            secs: 30,
        };
        assert!(err.to_string().contains("workout_planner"));
    }
}

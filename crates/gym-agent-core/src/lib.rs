//! Gym Agent Core: domain logic for the workout-planning agent pipeline.
//!
//! Contains the equipment lookup, the workout history store and its
//! "exercises to avoid" filter, the decision trace log, and the YAML-driven
//! pipeline engine that calls LLM agents. The CLI in `gym-agent-cli` is a
//! thin layer over this crate.

pub mod decision_log;
pub mod equipment;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
pub mod tools;
pub mod workflow;
pub mod workspace;

// Convenience re-exports
pub use decision_log::{DecisionLog, LogLevel};
pub use error::{AgentError, PipelineError, StoreError};
pub use state::{AppState, AppStateInner};
pub use workspace::Workspace;

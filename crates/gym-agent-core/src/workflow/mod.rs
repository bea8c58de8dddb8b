//! Workflow engine: YAML-driven multi-agent workout pipeline.
//!
//! A pipeline is a list of steps, each bound to an agent (a named system
//! prompt). Steps pass their outputs to later steps through template
//! substitution, and consecutive steps sharing a `parallel_group` run
//! concurrently.
//!
//! # Architecture
//!
//! ```text
//! pipeline.yaml ──► PipelineDefinition ──► PipelineExecutor ──► HistoryStore
//!                                              │                 (persist hook)
//!                   agents/*.yaml ─────────► AgentDef
//!                                              │
//!                                         AgentCaller ──► ToolRegistry
//!                                              │           (equipment_selector)
//!                                   OpenAI-compatible / Anthropic
//! ```

pub mod agent;
pub mod agent_caller;
pub mod executor;
pub mod output;
pub mod schema;

pub use agent::{builtin_agents, AgentDef, AgentLoader};
pub use agent_caller::{AgentCallConfig, AgentCaller, AgentRequest, AgentResponse, HttpAgentCaller, LlmSettings};
pub use executor::{PipelineExecutor, PipelineResult, StepResult, StepStatus, UserChannel};
pub use output::{extract_json_object, missing_fields};
pub use schema::{OnFailure, PipelineDefinition, PipelineStep, StepConfig, StepHook};

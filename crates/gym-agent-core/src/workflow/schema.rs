//! YAML schema types for pipeline definitions.
//!
//! A pipeline YAML defines the multi-agent workout flow:
//!
//! ```yaml
//! name: "FullWorkoutPipeline"
//! description: "Decode, plan, validate, persist, recommend, aggregate"
//! version: "1.0"
//!
//! variables:
//!   model: "${GYM_AGENT_MODEL:-gemini-2.5-flash-lite}"
//!
//! steps:
//!   - name: "workout_decoder"
//!     agent: "workout_decoder"
//!     interactive: true
//!     collect: [muscle, goal, training_style, experience_level]
//!     output_key: "decoder_output"
//!
//!   - name: "workout_planner"
//!     agent: "workout_planner"
//!     parallel_group: "planner_equipment_parallel"
//!     requires: [decoder_output]
//!     input: "${decoder_output}\n\n${history.avoid}"
//!     output_key: "plan_output"
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

const BUILTIN_PIPELINE_YAML: &str = include_str!("pipelines/workout.yaml");

/// Top-level pipeline definition loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Pipeline name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Version string
    #[serde(default = "default_version")]
    pub version: String,

    /// Variable substitution map (supports `${ENV_VAR}` references)
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Ordered list of pipeline steps
    pub steps: Vec<PipelineStep>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// What to do when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    /// Stop the pipeline immediately (default)
    #[default]
    Stop,
    /// Continue to the next step
    Continue,
    /// Retry the step (up to max_retries times)
    Retry,
}

/// Local side effect run on a step's output once the step succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepHook {
    /// Parse the output as a workout record and append it to the history file
    PersistHistory,
}

/// A single step in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    /// Step name (unique within the pipeline, used for output references)
    pub name: String,

    /// Agent ID: references a built-in agent or an agent YAML file
    pub agent: String,

    /// Per-step overrides of the LLM call
    #[serde(default)]
    pub config: StepConfig,

    /// Input template: supports variable substitution:
    ///  - `${user.message}`: the user's opening message
    ///  - `${history.avoid}`: exercises from recent workouts
    ///  - `${steps.<StepName>.output}` / `${outputs.<key>}` / `${<key>}`
    ///  - `${variables.<key>}`
    #[serde(default)]
    pub input: Option<String>,

    /// Tool names offered to the agent (defaults to the agent's own list)
    #[serde(default)]
    pub tools: Vec<String>,

    /// Execution gate: output keys that must exist and be non-empty
    #[serde(default)]
    pub requires: Vec<String>,

    /// Key to store this step's output under (for downstream reference)
    #[serde(default)]
    pub output_key: Option<String>,

    /// Parallel group: consecutive steps in the same group run concurrently
    #[serde(default)]
    pub parallel_group: Option<String>,

    /// Hold a conversation with the user until the reply is complete
    #[serde(default)]
    pub interactive: bool,

    /// For interactive steps: JSON fields the reply must contain
    #[serde(default)]
    pub collect: Vec<String>,

    /// For interactive steps: maximum agent turns
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Local side effect on success
    #[serde(default)]
    pub hook: Option<StepHook>,

    /// What to do if this step fails
    #[serde(default)]
    pub on_failure: OnFailure,

    /// Maximum retries (only used when on_failure = retry)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Timeout in seconds for each agent call of this step
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_max_turns() -> u32 {
    8
}

fn default_max_retries() -> u32 {
    2
}

fn default_timeout() -> u64 {
    120
}

/// Per-step LLM call overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StepConfig {
    /// Adapter: "openai" (OpenAI-compatible, incl. Gemini) or "anthropic"
    #[serde(default)]
    pub adapter: Option<String>,

    /// Model to use (e.g., "gemini-2.5-flash-lite")
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL for the API endpoint
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key override (supports `${ENV_VAR}` references)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Maximum tokens for response
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Temperature for generation
    #[serde(default)]
    pub temperature: Option<f64>,

    /// System prompt override (if not using the agent's instruction)
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl PipelineDefinition {
    /// Parse a pipeline definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, PipelineError> {
        serde_yaml::from_str(yaml).map_err(|e| PipelineError::Parse {
            what: "pipeline YAML".to_string(),
            reason: e.to_string(),
        })
    }

    /// Load a pipeline definition from a file path.
    pub fn from_file(path: &str) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Read {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// The default decode → {plan, equipment} → validate → persist →
    /// recommend → aggregate pipeline.
    pub fn builtin() -> Result<Self, PipelineError> {
        Self::from_yaml(BUILTIN_PIPELINE_YAML)
    }

    pub fn builtin_yaml() -> &'static str {
        BUILTIN_PIPELINE_YAML
    }

    /// Split the steps into execution stages: a run of consecutive steps
    /// sharing a `parallel_group` forms one stage, every other step is its
    /// own stage.
    pub fn stages(&self) -> Vec<&[PipelineStep]> {
        let mut stages = Vec::new();
        let mut start = 0;
        while start < self.steps.len() {
            let group = self.steps[start].parallel_group.as_deref();
            let mut end = start + 1;
            if group.is_some() {
                while end < self.steps.len() && self.steps[end].parallel_group.as_deref() == group {
                    end += 1;
                }
            }
            stages.push(&self.steps[start..end]);
            start = end;
        }
        stages
    }

    /// Structural checks that do not need agents or tools.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.steps.is_empty() {
            return Err(PipelineError::Invalid(format!(
                "pipeline '{}' has no steps",
                self.name
            )));
        }

        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        let mut seen_groups = HashSet::new();
        let mut produced: HashSet<&str> = HashSet::new();

        for stage in self.stages() {
            if let Some(group) = stage[0].parallel_group.as_deref() {
                if !seen_groups.insert(group) {
                    return Err(PipelineError::Invalid(format!(
                        "parallel group '{}' is split by other steps",
                        group
                    )));
                }
            }

            for step in stage {
                if !names.insert(step.name.as_str()) {
                    return Err(PipelineError::Invalid(format!(
                        "duplicate step name '{}'",
                        step.name
                    )));
                }
                if let Some(key) = step.output_key.as_deref() {
                    if !keys.insert(key) {
                        return Err(PipelineError::Invalid(format!(
                            "duplicate output key '{}'",
                            key
                        )));
                    }
                }
                if step.interactive && step.parallel_group.is_some() {
                    return Err(PipelineError::Invalid(format!(
                        "interactive step '{}' cannot run in a parallel group",
                        step.name
                    )));
                }
                for required in &step.requires {
                    if !produced.contains(required.as_str()) {
                        return Err(PipelineError::Invalid(format!(
                            "step '{}' requires '{}', which no earlier step produces",
                            step.name, required
                        )));
                    }
                }
            }

            for step in stage {
                if let Some(key) = step.output_key.as_deref() {
                    produced.insert(key);
                }
                produced.insert(step.name.as_str());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_pipeline() {
        let yaml = r#"
name: "Test Flow"
steps:
  - name: "Step 1"
    agent: "workout_planner"
    input: "Plan a chest day"
"#;
        let p = PipelineDefinition::from_yaml(yaml).unwrap();
        assert_eq!(p.name, "Test Flow");
        assert_eq!(p.version, "1.0");
        assert_eq!(p.steps.len(), 1);
        assert_eq!(p.steps[0].agent, "workout_planner");
        assert_eq!(p.steps[0].on_failure, OnFailure::Stop);
        assert_eq!(p.steps[0].max_turns, 8);
        assert!(!p.steps[0].interactive);
        p.validate().unwrap();
    }

    #[test]
    fn test_builtin_pipeline_shape() {
        let p = PipelineDefinition::builtin().unwrap();
        p.validate().unwrap();

        let stages: Vec<Vec<&str>> = p
            .stages()
            .iter()
            .map(|s| s.iter().map(|step| step.name.as_str()).collect())
            .collect();
        assert_eq!(
            stages,
            vec![
                vec!["workout_decoder"],
                vec!["workout_planner", "equipment_agent"],
                vec!["workout_validator"],
                vec!["workout_memory"],
                vec!["workout_recommender"],
                vec!["workout_aggregator"],
            ]
        );

        let decoder = &p.steps[0];
        assert!(decoder.interactive);
        assert_eq!(decoder.collect.len(), 4);
        let memory = p.steps.iter().find(|s| s.name == "workout_memory").unwrap();
        assert_eq!(memory.hook, Some(StepHook::PersistHistory));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let yaml = r#"
name: "Dup"
steps:
  - name: "a"
    agent: "workout_planner"
  - name: "a"
    agent: "workout_validator"
"#;
        let err = PipelineDefinition::from_yaml(yaml).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("duplicate step name"));
    }

    #[test]
    fn test_rejects_dangling_requires() {
        let yaml = r#"
name: "Gate"
steps:
  - name: "validate"
    agent: "workout_validator"
    requires: [plan_output]
    output_key: validated_workout
  - name: "plan"
    agent: "workout_planner"
    output_key: plan_output
"#;
        let err = PipelineDefinition::from_yaml(yaml).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("requires 'plan_output'"));
    }

    #[test]
    fn test_rejects_requires_within_same_group() {
        let yaml = r#"
name: "Group"
steps:
  - name: "plan"
    agent: "workout_planner"
    parallel_group: g
    output_key: plan_output
  - name: "equip"
    agent: "equipment_agent"
    parallel_group: g
    requires: [plan_output]
"#;
        assert!(PipelineDefinition::from_yaml(yaml).unwrap().validate().is_err());
    }

    #[test]
    fn test_rejects_interactive_parallel_step() {
        let yaml = r#"
name: "Bad"
steps:
  - name: "decode"
    agent: "workout_decoder"
    interactive: true
    parallel_group: g
"#;
        assert!(PipelineDefinition::from_yaml(yaml).unwrap().validate().is_err());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = PipelineDefinition::from_yaml("steps: [").unwrap_err();
        assert!(err.to_string().contains("pipeline YAML"));
    }
}

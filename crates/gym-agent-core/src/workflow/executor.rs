//! Pipeline Executor: runs a pipeline definition stage by stage.
//!
//! The executor:
//! 1. Resolves variables and the history-based "exercises to avoid" block
//! 2. Runs each stage: a single step, or a parallel group joined concurrently
//! 3. Skips steps whose execution gate (`requires`) is not met
//! 4. Passes output between steps via template substitution
//! 5. Runs step hooks (history persistence) on success
//! 6. Writes the run's outputs to `logs/last_run_outputs.json`

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use regex::Regex;
use serde::Serialize;

use crate::decision_log::DecisionLog;
use crate::error::{AgentError, PipelineError};
use crate::models::{DecoderOutput, WorkoutHistoryEntry};
use crate::store::{render_avoid_block, write_json, HistoryStore};
use crate::tools::{ToolDefinition, ToolRegistry};
use crate::workflow::agent::{AgentDef, AgentLoader};
use crate::workflow::agent_caller::{
    resolve_env_vars, AgentCallConfig, AgentCaller, AgentRequest, AgentResponse, ChatMessage,
    LlmSettings, UsageInfo, ANTHROPIC_BASE_URL, DEFAULT_MAX_TOKENS, GEMINI_OPENAI_BASE_URL,
};
use crate::workflow::output::{extract_json_object, missing_fields};
use crate::workflow::schema::{OnFailure, PipelineDefinition, PipelineStep, StepHook};
use crate::workspace::Workspace;

pub const DECODER_OUTPUT_KEY: &str = "decoder_output";
pub const VALIDATED_WORKOUT_KEY: &str = "validated_workout";

const DEFAULT_GREETING: &str = "How can I help you plan your workout?";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

/// Where interactive steps talk to the user.
#[async_trait]
pub trait UserChannel: Send + Sync {
    /// Show `message` and wait for a reply. `None` means the user ended the
    /// conversation.
    async fn ask(&self, message: &str) -> Result<Option<String>, AgentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Result of executing a single pipeline step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step_name: String,
    pub agent: String,
    pub status: StepStatus,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub model: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub tool_calls: usize,
    pub attempts: u32,
}

impl StepResult {
    fn new(step: &PipelineStep, status: StepStatus) -> Self {
        Self {
            step_name: step.name.clone(),
            agent: step.agent.clone(),
            status,
            output: String::new(),
            error: None,
            model: String::new(),
            input_tokens: None,
            output_tokens: None,
            tool_calls: 0,
            attempts: 0,
        }
    }

    fn failed(step: &PipelineStep, error: impl Into<String>) -> Self {
        let mut result = Self::new(step, StepStatus::Failed);
        result.error = Some(error.into());
        result
    }

    fn from_response(step: &PipelineStep, response: AgentResponse, usage: Option<UsageInfo>) -> Self {
        let status = if response.success {
            StepStatus::Succeeded
        } else {
            StepStatus::Failed
        };
        let mut result = Self::new(step, status);
        result.output = response.content;
        result.error = response.error;
        result.model = response.model;
        result.input_tokens = usage.and_then(|u| u.input_tokens);
        result.output_tokens = usage.and_then(|u| u.output_tokens);
        result.tool_calls = response.tool_calls;
        result
    }

    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Succeeded
    }
}

/// Result of executing the entire pipeline. Also the content of
/// `logs/last_run_outputs.json`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: String,
    pub pipeline_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    /// Outputs by output key
    pub outputs: BTreeMap<String, String>,
    pub steps: Vec<StepResult>,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

impl PipelineResult {
    /// Output of the last step that produced one (the aggregated summary
    /// in the built-in pipeline).
    pub fn final_output(&self) -> Option<&str> {
        self.steps
            .iter()
            .rev()
            .find(|s| s.succeeded() && !s.output.is_empty())
            .map(|s| s.output.as_str())
    }

    pub fn failed_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .map(|s| s.step_name.as_str())
            .collect()
    }
}

/// The pipeline executor engine.
pub struct PipelineExecutor {
    workspace: Workspace,
    caller: Arc<dyn AgentCaller>,
    agents: AgentLoader,
    tools: ToolRegistry,
    history: HistoryStore,
    settings: LlmSettings,
    log: DecisionLog,
    user: Option<Arc<dyn UserChannel>>,
    /// Resolved variables (pipeline-level + env)
    variables: HashMap<String, String>,
    /// Step outputs indexed by output key and by step name
    outputs: HashMap<String, String>,
    /// The user's opening message, if given up front
    user_message: Option<String>,
    /// Rendered "exercises to avoid" block for this run
    avoid_block: String,
    /// Verbose output mode
    verbose: bool,
}

impl PipelineExecutor {
    pub fn new(workspace: Workspace, caller: Arc<dyn AgentCaller>, log: DecisionLog) -> Self {
        Self {
            tools: ToolRegistry::for_workspace(&workspace),
            history: HistoryStore::new(workspace.history_path()),
            workspace,
            caller,
            agents: AgentLoader::with_builtins(),
            settings: LlmSettings::from_env(),
            log,
            user: None,
            variables: HashMap::new(),
            outputs: HashMap::new(),
            user_message: None,
            avoid_block: String::new(),
            verbose: false,
        }
    }

    pub fn with_agents(mut self, agents: AgentLoader) -> Self {
        self.agents = agents;
        self
    }

    pub fn with_settings(mut self, settings: LlmSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_user_channel(mut self, user: Arc<dyn UserChannel>) -> Self {
        self.user = Some(user);
        self
    }

    /// Set verbose mode for detailed output.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set the user's opening message (skips the decoder's greeting).
    pub fn set_user_message(&mut self, message: String) {
        self.user_message = Some(message);
    }

    pub fn agents(&self) -> &AgentLoader {
        &self.agents
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Validate the pipeline and check that every agent and tool it names
    /// is available.
    pub fn check(&self, pipeline: &PipelineDefinition) -> Result<(), PipelineError> {
        pipeline.validate()?;
        for step in &pipeline.steps {
            let agent = self
                .agents
                .get(&step.agent)
                .ok_or_else(|| PipelineError::UnknownAgent(step.agent.clone()))?;
            for tool in self.tool_names(step, agent) {
                if !self.tools.contains(tool) {
                    return Err(PipelineError::Invalid(format!(
                        "step '{}' uses unknown tool '{}' (available: {})",
                        step.name,
                        tool,
                        self.tools.names().join(", ")
                    )));
                }
            }
        }
        Ok(())
    }

    /// Execute a pipeline definition.
    pub async fn execute(&mut self, pipeline: &PipelineDefinition) -> Result<PipelineResult, PipelineError> {
        self.check(pipeline)?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();

        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║  Gym Agent Pipeline                                      ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║  Pipeline : {:<44} ║", truncate(&pipeline.name, 44));
        println!("║  Steps    : {:<44} ║", pipeline.steps.len());
        println!("║  Run      : {:<44} ║", truncate(&run_id, 44));
        println!("╚══════════════════════════════════════════════════════════╝");
        println!();

        self.log.info(format!(
            "Pipeline '{}' started (run {})",
            pipeline.name, run_id
        ));

        // Resolve pipeline-level variables (expand env vars)
        self.variables.clear();
        self.outputs.clear();
        for (key, val) in &pipeline.variables {
            self.variables.insert(key.clone(), resolve_env_vars(val));
        }
        self.avoid_block = render_avoid_block(&self.history.exercises_to_avoid(&self.log));

        let stages = pipeline.stages();
        let mut results: Vec<StepResult> = Vec::new();
        let mut outputs_by_key = BTreeMap::new();
        let mut stopped = false;

        for (i, stage) in stages.iter().enumerate() {
            let names: Vec<&str> = stage.iter().map(|s| s.name.as_str()).collect();
            println!("── Stage {}/{}: {} ──", i + 1, stages.len(), names.join(" + "));

            let stage_results = if stage.len() == 1 {
                vec![self.run_step(&stage[0]).await]
            } else {
                join_all(stage.iter().map(|step| self.run_step(step))).await
            };

            for (step, result) in stage.iter().zip(stage_results) {
                self.report(&result);

                if result.succeeded() {
                    if let Some(ref key) = step.output_key {
                        self.outputs.insert(key.clone(), result.output.clone());
                        outputs_by_key.insert(key.clone(), result.output.clone());
                    }
                    self.outputs.insert(step.name.clone(), result.output.clone());

                    if let Some(hook) = step.hook {
                        self.run_hook(hook, &result.output);
                    }
                } else if result.status == StepStatus::Failed && step.on_failure != OnFailure::Continue {
                    stopped = true;
                }

                results.push(result);
            }

            println!();
            if stopped {
                self.log.error(format!(
                    "Pipeline '{}' stopped after stage {}",
                    pipeline.name,
                    i + 1
                ));
                break;
            }
        }

        let total_input: u64 = results.iter().filter_map(|r| r.input_tokens).sum();
        let total_output: u64 = results.iter().filter_map(|r| r.output_tokens).sum();
        let success = !stopped && results.iter().all(|r| r.status != StepStatus::Failed);

        let result = PipelineResult {
            run_id,
            pipeline_name: pipeline.name.clone(),
            started_at,
            finished_at: Utc::now(),
            success,
            outputs: outputs_by_key,
            steps: results,
            total_input_tokens: total_input,
            total_output_tokens: total_output,
        };

        let outputs_path = self.workspace.last_run_outputs_path();
        match write_json(&outputs_path, &result) {
            Ok(()) => self.log.debug(format!("Wrote JSON to {}", outputs_path.display())),
            Err(e) => self.log.error(format!("Failed to write run outputs: {}", e)),
        }

        println!("═══════════════════════════════════════════════════════════");
        println!("  Pipeline Complete: {}", pipeline.name);
        println!("  Status: {}", if result.success { "✅ SUCCESS" } else { "❌ FAILED" });
        println!(
            "  Steps: {} succeeded, {} skipped, {} failed",
            result.steps.iter().filter(|r| r.succeeded()).count(),
            result.steps.iter().filter(|r| r.status == StepStatus::Skipped).count(),
            result.failed_steps().len()
        );
        if total_input > 0 || total_output > 0 {
            println!("  Total tokens: {} in / {} out", total_input, total_output);
        }
        println!("═══════════════════════════════════════════════════════════");

        self.log.info(format!(
            "Pipeline '{}' finished: {}",
            pipeline.name,
            if result.success { "success" } else { "failed" }
        ));

        Ok(result)
    }

    fn report(&self, result: &StepResult) {
        match result.status {
            StepStatus::Succeeded => {
                println!("   ✅ {} (model: {})", result.step_name, result.model);
                if let (Some(inp), Some(out)) = (result.input_tokens, result.output_tokens) {
                    println!("   📊 Tokens: {} in / {} out", inp, out);
                }
                if self.verbose {
                    println!("   📝 Output preview: {}", truncate(&result.output, 200));
                }
                self.log.info(format!("Step '{}' succeeded", result.step_name));
            }
            StepStatus::Skipped => {
                let reason = result.error.as_deref().unwrap_or("gate not met");
                println!("   ⏭  {} skipped ({})", result.step_name, reason);
                self.log.warning(format!("Step '{}' skipped: {}", result.step_name, reason));
            }
            StepStatus::Failed => {
                let reason = result.error.as_deref().unwrap_or("unknown");
                println!("   ❌ {} failed: {}", result.step_name, reason);
                self.log.error(format!("Step '{}' failed: {}", result.step_name, reason));
            }
        }
    }

    /// Run one step: check its gate, then run it under its failure policy.
    async fn run_step(&self, step: &PipelineStep) -> StepResult {
        let missing: Vec<&str> = step
            .requires
            .iter()
            .filter(|key| {
                self.outputs
                    .get(key.as_str())
                    .map(|v| v.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            let mut result = StepResult::new(step, StepStatus::Skipped);
            result.error = Some(format!("missing {}", missing.join(", ")));
            return result;
        }

        let attempts = attempts(step);

        let mut result = StepResult::failed(step, "not attempted");
        for attempt in 1..=attempts {
            result = match self.try_step(step).await {
                Ok(r) => r,
                Err(e) => StepResult::failed(step, e.to_string()),
            };
            result.attempts = attempt;
            if result.succeeded() {
                break;
            }
            if attempt < attempts {
                self.log.warning(format!(
                    "Step '{}' attempt {}/{} failed: {}; retrying",
                    step.name,
                    attempt,
                    attempts,
                    result.error.as_deref().unwrap_or("unknown")
                ));
            }
        }
        result
    }

    async fn try_step(&self, step: &PipelineStep) -> Result<StepResult, PipelineError> {
        let agent = self
            .agents
            .get(&step.agent)
            .ok_or_else(|| PipelineError::UnknownAgent(step.agent.clone()))?;
        let config = self.build_call_config(step, agent);
        let tool_names: Vec<String> = self.tool_names(step, agent).map(str::to_string).collect();
        let tools = self.tools.definitions(&tool_names);

        if self.verbose {
            println!("   🔧 {}: adapter {}, model {}", step.name, config.adapter, config.model);
        }

        if step.interactive {
            return self.run_conversation(step, agent, config, tools).await;
        }

        let prompt = self.build_user_prompt(step, agent);
        if self.verbose {
            println!("   📥 {}: prompt length {} chars", step.name, prompt.len());
        }
        self.log.debug(format!(
            "Step '{}' -> agent '{}' (model {}, {} tool(s))",
            step.name,
            agent.id,
            config.model,
            tools.len()
        ));

        let request = AgentRequest {
            agent: agent.id.clone(),
            config,
            messages: vec![ChatMessage::user(prompt)],
            tools,
        };
        let response = self.call_agent(step, &request).await?;
        let usage = response.usage;
        Ok(StepResult::from_response(step, response, usage))
    }

    /// Talk to the user until the agent's reply carries every `collect`
    /// field as JSON (or, with no `collect` list, until the first reply).
    async fn run_conversation(
        &self,
        step: &PipelineStep,
        agent: &AgentDef,
        config: AgentCallConfig,
        tools: Vec<ToolDefinition>,
    ) -> Result<StepResult, PipelineError> {
        let opening = match self.user_message.as_deref() {
            Some(m) if !m.trim().is_empty() => Some(m.to_string()),
            _ => {
                let greeting = agent.greeting.as_deref().unwrap_or(DEFAULT_GREETING);
                self.ask_user(greeting).await?
            }
        };
        let Some(opening) = opening else {
            return Ok(StepResult::failed(step, "no user input"));
        };

        let mut request = AgentRequest {
            agent: agent.id.clone(),
            config,
            messages: vec![ChatMessage::user(opening)],
            tools,
        };
        let mut usage = None;
        let mut tool_calls = 0;

        for turn in 1..=step.max_turns {
            let response = self.call_agent(step, &request).await?;
            UsageInfo::accumulate(&mut usage, response.usage);
            tool_calls += response.tool_calls;
            if !response.success {
                return Ok(StepResult::from_response(step, response, usage));
            }

            if step.collect.is_empty() {
                let mut result = StepResult::from_response(step, response, usage);
                result.tool_calls = tool_calls;
                return Ok(result);
            }

            if let Some(value) = extract_json_object(&response.content) {
                let missing = missing_fields(&value, &step.collect);
                if missing.is_empty() {
                    self.log.info(format!(
                        "Step '{}' collected all fields after {} turn(s)",
                        step.name, turn
                    ));
                    let mut response = response;
                    response.content =
                        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
                    let mut result = StepResult::from_response(step, response, usage);
                    result.tool_calls = tool_calls;
                    return Ok(result);
                }
                self.log.debug(format!(
                    "Step '{}' reply still missing: {}",
                    step.name,
                    missing.join(", ")
                ));
            }

            let Some(reply) = self.ask_user(&response.content).await? else {
                return Ok(StepResult::failed(
                    step,
                    "conversation ended before all fields were collected",
                ));
            };
            request.messages.push(ChatMessage::assistant(response.content));
            request.messages.push(ChatMessage::user(reply));
        }

        Ok(StepResult::failed(
            step,
            format!("no complete answer after {} turn(s)", step.max_turns),
        ))
    }

    async fn ask_user(&self, message: &str) -> Result<Option<String>, PipelineError> {
        match self.user {
            Some(ref user) => Ok(user.ask(message).await?),
            None => Ok(None),
        }
    }

    async fn call_agent(
        &self,
        step: &PipelineStep,
        request: &AgentRequest,
    ) -> Result<AgentResponse, PipelineError> {
        let call = self.caller.call(request, &self.tools, &self.log);
        match tokio::time::timeout(Duration::from_secs(step.timeout_secs), call).await {
            Ok(response) => Ok(response?),
            Err(_) => Err(PipelineError::Timeout {
                step: step.name.clone(),
                secs: step.timeout_secs,
            }),
        }
    }

    fn run_hook(&self, hook: StepHook, output: &str) {
        match hook {
            StepHook::PersistHistory => self.persist_history(output),
        }
    }

    /// Save a memory-agent record to the workout history. Gaps in the record
    /// are filled from the decoder output and the validated workout.
    fn persist_history(&self, output: &str) {
        let Some(mut value) = extract_json_object(output) else {
            self.log
                .warning("Memory output is not a JSON object; skipping history save.");
            return;
        };
        if let Some(map) = value.as_object_mut() {
            for v in map.values_mut() {
                if !v.is_string() {
                    let text = if v.is_null() { String::new() } else { v.to_string() };
                    *v = serde_json::Value::String(text);
                }
            }
        }

        let mut entry: WorkoutHistoryEntry = match serde_json::from_value(value) {
            Ok(e) => e,
            Err(e) => {
                self.log
                    .warning(format!("Memory output is not a workout record ({}); skipping.", e));
                return;
            }
        };

        let decoded = self
            .outputs
            .get(DECODER_OUTPUT_KEY)
            .and_then(|t| extract_json_object(t))
            .and_then(|v| DecoderOutput::from_value(&v));
        if let Some(decoded) = decoded {
            fill_blank(&mut entry.muscle, decoded.muscle);
            fill_blank(&mut entry.goal, decoded.goal);
            fill_blank(&mut entry.training_style, decoded.training_style);
            fill_blank(&mut entry.experience_level, decoded.experience_level);
        }
        if let Some(workout) = self.outputs.get(VALIDATED_WORKOUT_KEY) {
            fill_blank(&mut entry.workout, workout.clone());
        }

        if let Err(e) = self.history.append(entry, &self.log) {
            self.log.error(format!("Error appending to history: {}", e));
        }
    }

    fn tool_names<'a>(&self, step: &'a PipelineStep, agent: &'a AgentDef) -> impl Iterator<Item = &'a str> {
        let names = if step.tools.is_empty() {
            &agent.tools
        } else {
            &step.tools
        };
        names.iter().map(String::as_str)
    }

    /// Build the agent call configuration from step config + agent defaults
    /// + environment settings.
    fn build_call_config(&self, step: &PipelineStep, agent: &AgentDef) -> AgentCallConfig {
        let adapter = step
            .config
            .adapter
            .as_ref()
            .map(|a| self.resolve_template(a))
            .or_else(|| self.variables.get("adapter").cloned())
            .unwrap_or_else(|| self.settings.adapter.clone());

        let base_url = step
            .config
            .base_url
            .as_ref()
            .map(|u| self.resolve_template(u))
            .or_else(|| self.variables.get("base_url").cloned())
            .unwrap_or_else(|| {
                if adapter == self.settings.adapter {
                    self.settings.base_url.clone()
                } else {
                    match adapter.as_str() {
                        "anthropic" | "claude" => ANTHROPIC_BASE_URL.to_string(),
                        _ => GEMINI_OPENAI_BASE_URL.to_string(),
                    }
                }
            });

        let api_key = step
            .config
            .api_key
            .as_ref()
            .map(|k| self.resolve_template(k))
            .unwrap_or_else(|| self.settings.api_key.clone());

        let model = step
            .config
            .model
            .as_ref()
            .map(|m| self.resolve_template(m))
            .or_else(|| self.variables.get("model").cloned())
            .or_else(|| agent.model.clone())
            .unwrap_or_else(|| self.settings.model.clone());

        // System prompt: step override > agent instruction
        let system_prompt = step
            .config
            .system_prompt
            .clone()
            .unwrap_or_else(|| agent.instruction.clone());

        AgentCallConfig {
            adapter,
            base_url,
            api_key,
            model,
            max_tokens: step.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: step.config.temperature,
            system_prompt,
        }
    }

    /// Build the user prompt for a step, resolving template variables.
    fn build_user_prompt(&self, step: &PipelineStep, agent: &AgentDef) -> String {
        let prompt = step
            .input
            .as_ref()
            .map(|input| self.resolve_template(input))
            .unwrap_or_default();

        if prompt.trim().is_empty() {
            format!(
                "Execute your role as {} ({}).",
                agent.name,
                agent.description.as_deref().unwrap_or("no description")
            )
        } else {
            prompt
        }
    }

    /// Resolve template variables in a string.
    ///
    /// Supported patterns:
    /// - `${user.message}`: the opening message
    /// - `${history.avoid}`: exercises from recent workouts
    /// - `${steps.<StepName>.output}` / `${outputs.<key>}`: earlier outputs
    /// - `${variables.<key>}` or `${<key>}`: variables, then outputs
    /// - `${ENV_VAR}`: from environment
    ///
    /// Substitution is a single pass over the template: text inserted for one
    /// placeholder is never scanned again, so a `${...}` inside user input or
    /// an agent's output stays literal.
    fn resolve_template(&self, template: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(template, |caps: &regex::Captures| {
                self.resolve_placeholder(&caps[1])
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn resolve_placeholder(&self, key: &str) -> Option<String> {
        if key == "user.message" {
            return self.user_message.clone();
        }
        if key == "history.avoid" {
            return Some(self.avoid_block.clone());
        }
        if let Some(step_name) = key
            .strip_prefix("steps.")
            .and_then(|rest| rest.strip_suffix(".output"))
        {
            return self.outputs.get(step_name).cloned();
        }
        if let Some(name) = key.strip_prefix("outputs.") {
            return self.outputs.get(name).cloned();
        }
        if let Some(name) = key.strip_prefix("variables.") {
            return self.variables.get(name).cloned();
        }
        self.variables
            .get(key)
            .or_else(|| self.outputs.get(key))
            .cloned()
            .or_else(|| std::env::var(key).ok())
    }
}

/// Total tries for a step under its failure policy.
fn attempts(step: &PipelineStep) -> u32 {
    match step.on_failure {
        OnFailure::Retry => step.max_retries.saturating_add(1),
        _ => 1,
    }
}

fn fill_blank(field: &mut String, value: String) {
    if field.trim().is_empty() {
        *field = value;
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

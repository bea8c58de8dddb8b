//! `gym-agent run`: Plan a workout by running the agent pipeline.
//!
//! The decoder step talks to the user in the terminal until it has the four
//! fields it needs; the rest of the pipeline runs without further input.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use console::style;
use dialoguer::Input;

use gym_agent_core::error::AgentError;
use gym_agent_core::state::AppState;
use gym_agent_core::workflow::{
    AgentCaller, AgentLoader, HttpAgentCaller, PipelineDefinition, PipelineResult, UserChannel,
};

/// Options for a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Opening message; without it the decoder greets the user first
    pub message: Option<String>,
    /// Pipeline YAML file; the built-in pipeline otherwise
    pub pipeline_file: Option<String>,
    /// Directory of agent YAML overrides
    pub agents_dir: Option<String>,
    pub verbose: bool,
}

/// Terminal conversation for interactive steps. An empty line, `exit` or
/// `quit` ends the conversation.
pub struct TerminalUser;

#[async_trait]
impl UserChannel for TerminalUser {
    async fn ask(&self, message: &str) -> Result<Option<String>, AgentError> {
        println!();
        println!("{} {}", style("🤖 Coach:").cyan().bold(), message);

        let reply = tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt(style("You").green().bold().to_string())
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| AgentError::Input(e.to_string()))?
        .map_err(|e| AgentError::Input(e.to_string()))?;

        let reply = reply.trim();
        if reply.is_empty() || matches!(reply.to_lowercase().as_str(), "exit" | "quit") {
            return Ok(None);
        }
        Ok(Some(reply.to_string()))
    }
}

/// Run the pipeline against the configured LLM backend.
pub async fn run(state: &AppState, options: &RunOptions) -> Result<(), String> {
    // Load .env / .env.local (API keys etc.) from the cwd and the home dir
    super::load_dotenv(Path::new("."));
    super::load_dotenv(state.workspace.root());

    let caller: Arc<dyn AgentCaller> = Arc::new(HttpAgentCaller::new());
    let user: Arc<dyn UserChannel> = Arc::new(TerminalUser);
    let result = execute(state, caller, Some(user), options).await?;

    if let Some(summary) = result.final_output() {
        println!();
        println!("{}", style("Summary").bold().underlined());
        println!("{}", summary);
    }

    if result.success {
        println!("\n🎉 Workout plan ready!");
        Ok(())
    } else {
        Err(format!(
            "Pipeline failed. Failed steps: {}",
            result.failed_steps().join(", ")
        ))
    }
}

/// Load the pipeline and agents and execute with the given caller.
pub async fn execute(
    state: &AppState,
    caller: Arc<dyn AgentCaller>,
    user: Option<Arc<dyn UserChannel>>,
    options: &RunOptions,
) -> Result<PipelineResult, String> {
    let pipeline = match options.pipeline_file.as_deref() {
        Some(file) => PipelineDefinition::from_file(file),
        None => PipelineDefinition::builtin(),
    }
    .map_err(|e| e.to_string())?;

    println!(
        "📄 Loaded pipeline: {} ({})",
        pipeline.name,
        options.pipeline_file.as_deref().unwrap_or("built-in")
    );
    println!("   {} step(s), {} stage(s)", pipeline.steps.len(), pipeline.stages().len());
    println!();

    let agents = match options.agents_dir.as_deref() {
        Some(dir) => AgentLoader::from_dir(dir).map_err(|e| e.to_string())?,
        None => AgentLoader::with_builtins(),
    };

    let mut executor = state.executor(caller).with_agents(agents);
    if let Some(user) = user {
        executor = executor.with_user_channel(user);
    }
    executor.set_verbose(options.verbose);
    if let Some(ref message) = options.message {
        executor.set_user_message(message.clone());
    }

    executor.execute(&pipeline).await.map_err(|e| e.to_string())
}

//! Integration tests for the gym-agent CLI commands.
//!
//! These exercise the same code paths as the binary against a temporary home
//! directory, with a scripted agent caller standing in for the LLM.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use gym_agent_cli::commands;
use gym_agent_cli::commands::run::RunOptions;
use gym_agent_core::error::AgentError;
use gym_agent_core::models::{LookupStatus, WorkoutHistoryEntry};
use gym_agent_core::state::AppState;
use gym_agent_core::tools::{ToolRegistry, EQUIPMENT_SELECTOR};
use gym_agent_core::workflow::{AgentCaller, AgentRequest, AgentResponse, UserChannel};
use gym_agent_core::DecisionLog;

const EQUIPMENT_DB: &str = r#"{
  "chest": {"required_equipment": ["Barbell", "Bench"], "alternatives": ["Resistance Bands"]},
  "legs": {"required_equipment": ["Squat Rack"], "alternatives": ["Dumbbells"]}
}"#;

/// Canned replies per agent; the equipment agent calls the real tool.
struct ScriptedCaller {
    replies: Mutex<HashMap<String, VecDeque<String>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedCaller {
    fn for_muscle(muscle: &str, workout: &str) -> Self {
        let decoded = format!(
            r#"{{"muscle": "{}", "goal": "strength", "training_style": "gym", "experience_level": "intermediate"}}"#,
            muscle
        );
        let memory = serde_json::json!({
            "muscle": muscle,
            "goal": "strength",
            "training_style": "gym",
            "experience_level": "intermediate",
            "workout": workout,
        })
        .to_string();

        let mut replies = HashMap::new();
        for (agent, text) in [
            ("workout_decoder", decoded),
            ("workout_planner", workout.to_string()),
            ("workout_validator", workout.to_string()),
            ("workout_memory", memory),
            ("workout_recommender", "- Hydrate\n- Sleep".to_string()),
            ("workout_aggregator", format!("FINAL WORKOUT SUMMARY\n- Muscle: {}", muscle)),
        ] {
            replies.insert(agent.to_string(), VecDeque::from(vec![text]));
        }
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompt_for(&self, agent: &str) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .find(|(a, _)| a == agent)
            .map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl AgentCaller for ScriptedCaller {
    async fn call(
        &self,
        request: &AgentRequest,
        tools: &ToolRegistry,
        log: &DecisionLog,
    ) -> Result<AgentResponse, AgentError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts
            .lock()
            .unwrap()
            .push((request.agent.clone(), prompt.clone()));

        if request.tools.iter().any(|t| t.name == EQUIPMENT_SELECTOR) {
            let muscle = if prompt.contains("legs") { "legs" } else { "chest" };
            let result = tools.call(EQUIPMENT_SELECTOR, serde_json::json!({ "muscle": muscle }), log);
            return Ok(AgentResponse::text("scripted", result.to_content()));
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&request.agent)
            .and_then(|q| q.pop_front())
            .ok_or_else(|| AgentError::InvalidResponse(format!("no reply for {}", request.agent)))?;
        Ok(AgentResponse::text("scripted", reply))
    }
}

struct SilentUser;

#[async_trait]
impl UserChannel for SilentUser {
    async fn ask(&self, _message: &str) -> Result<Option<String>, AgentError> {
        Ok(None)
    }
}

fn test_state() -> (tempfile::TempDir, AppState) {
    let tmp = tempfile::tempdir().unwrap();
    let state = commands::init_state(tmp.path().to_str().unwrap(), true).unwrap();
    std::fs::write(state.workspace.equipment_db_path(), EQUIPMENT_DB).unwrap();
    (tmp, state)
}

fn options(message: &str) -> RunOptions {
    RunOptions {
        message: Some(message.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_run_builtin_pipeline() {
    let (_tmp, state) = test_state();
    let caller = Arc::new(ScriptedCaller::for_muscle("chest", "Exercise 1: Bench Press\n- Dips 3x10"));

    let result = commands::run::execute(&state, caller.clone(), None, &options("chest strength"))
        .await
        .unwrap();

    assert!(result.success, "failed steps: {:?}", result.failed_steps());
    assert_eq!(result.final_output(), Some("FINAL WORKOUT SUMMARY\n- Muscle: chest"));
    assert!(result.outputs["equipment_output"].contains("Resistance Bands"));

    // Aggregator saw every upstream output.
    let aggregator = caller.prompt_for("workout_aggregator").unwrap();
    assert!(aggregator.contains("- Hydrate"));
    assert!(aggregator.contains("\"status\": \"success\"") || aggregator.contains("\"status\":\"success\""));

    // History persisted by the memory step.
    let history = commands::history::entries(&state, None);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].muscle, "chest");
    assert_eq!(history[0].workout, "Exercise 1: Bench Press\n- Dips 3x10");

    // Run outputs and decision trace written to logs/.
    let outputs = std::fs::read_to_string(state.workspace.last_run_outputs_path()).unwrap();
    let outputs: serde_json::Value = serde_json::from_str(&outputs).unwrap();
    assert_eq!(outputs["pipeline_name"], "FullWorkoutPipeline");
    assert_eq!(outputs["steps"].as_array().unwrap().len(), 7);

    let trace = std::fs::read_to_string(state.log.path().unwrap()).unwrap();
    assert!(trace.contains(" - INFO - Saved workout history for muscle='chest'"));
}

#[tokio::test]
async fn test_second_run_avoids_previous_exercises() {
    let (_tmp, state) = test_state();

    let first = Arc::new(ScriptedCaller::for_muscle("chest", "Exercise 1: Bench Press\n- Dips 3x10"));
    commands::run::execute(&state, first, None, &options("chest"))
        .await
        .unwrap();

    let second = Arc::new(ScriptedCaller::for_muscle("legs", "Exercise 1: Back Squat"));
    let result = commands::run::execute(&state, second.clone(), None, &options("legs"))
        .await
        .unwrap();
    assert!(result.success);

    let planner = second.prompt_for("workout_planner").unwrap();
    assert!(planner.contains("exercise 1: bench press"));
    assert!(planner.contains("- dips 3x10"));
    assert!(result.outputs["equipment_output"].contains("Squat Rack"));

    let history = commands::history::entries(&state, Some(1));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].muscle, "legs");
    assert_eq!(commands::history::entries(&state, None).len(), 2);
}

#[tokio::test]
async fn test_run_without_user_input_fails_at_decoder() {
    let (_tmp, state) = test_state();
    let caller = Arc::new(ScriptedCaller::for_muscle("chest", "- Push-ups"));
    let user: Arc<dyn UserChannel> = Arc::new(SilentUser);

    let result = commands::run::execute(&state, caller, Some(user), &RunOptions::default())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.failed_steps(), vec!["workout_decoder"]);
    assert!(commands::history::entries(&state, None).is_empty());
}

#[tokio::test]
async fn test_run_with_missing_pipeline_file() {
    let (_tmp, state) = test_state();
    let caller = Arc::new(ScriptedCaller::for_muscle("chest", "- Push-ups"));
    let options = RunOptions {
        pipeline_file: Some("/nonexistent/pipeline.yaml".to_string()),
        ..options("chest")
    };
    let err = commands::run::execute(&state, caller, None, &options)
        .await
        .unwrap_err();
    assert!(err.contains("/nonexistent/pipeline.yaml"));
}

#[tokio::test]
async fn test_run_with_agents_dir_override() {
    let (tmp, state) = test_state();
    let agents_dir = tmp.path().join("agents");
    std::fs::create_dir_all(&agents_dir).unwrap();
    std::fs::write(
        agents_dir.join("recommender.yaml"),
        "id: workout_recommender\nname: Terse Recommender\ninstruction: One bullet only.\n",
    )
    .unwrap();

    let caller = Arc::new(ScriptedCaller::for_muscle("chest", "- Push-ups"));
    let options = RunOptions {
        agents_dir: Some(agents_dir.to_string_lossy().to_string()),
        ..options("chest")
    };
    let result = commands::run::execute(&state, caller, None, &options)
        .await
        .unwrap();
    assert!(result.success);
    assert!(commands::agents::list(options.agents_dir.as_deref()).is_ok());
}

#[test]
fn test_equipment_lookup_command() {
    let (_tmp, state) = test_state();

    let found = commands::equipment::recommend(&state, " CHEST ");
    assert_eq!(found.status, LookupStatus::Success);
    assert_eq!(found.muscle, "chest");
    assert_eq!(found.required, vec!["Barbell", "Bench"]);

    let missing = commands::equipment::recommend(&state, "calves");
    assert_eq!(missing.status, LookupStatus::NotFound);
    assert_eq!(missing.muscle, "calves");

    assert!(commands::equipment::lookup(&state, "legs").is_ok());
}

#[test]
fn test_history_commands_on_corrupt_file() {
    let (_tmp, state) = test_state();
    std::fs::write(state.workspace.history_path(), "{ not json").unwrap();

    assert!(commands::history::entries(&state, None).is_empty());
    assert!(commands::history::list(&state, Some(3)).is_ok());
    assert!(commands::history::avoid(&state).is_ok());
}

#[test]
fn test_history_entries_keeps_order() {
    let (_tmp, state) = test_state();
    for muscle in ["chest", "back", "legs"] {
        state
            .history
            .append(
                WorkoutHistoryEntry {
                    muscle: muscle.to_string(),
                    ..Default::default()
                },
                &state.log,
            )
            .unwrap();
    }
    let muscles: Vec<String> = commands::history::entries(&state, Some(2))
        .into_iter()
        .map(|e| e.muscle)
        .collect();
    assert_eq!(muscles, vec!["back", "legs"]);
}

#[test]
fn test_pipeline_validate_and_show() {
    let tmp = tempfile::tempdir().unwrap();
    let good = tmp.path().join("good.yaml");
    std::fs::write(
        &good,
        gym_agent_core::workflow::PipelineDefinition::builtin_yaml(),
    )
    .unwrap();
    assert!(commands::pipeline::validate(good.to_str().unwrap()).is_ok());
    assert!(commands::pipeline::show(Some(good.to_str().unwrap())).is_ok());
    assert!(commands::pipeline::show(None).is_ok());

    let bad = tmp.path().join("bad.yaml");
    std::fs::write(
        &bad,
        "name: Bad\nsteps:\n  - name: a\n    agent: workout_planner\n  - name: a\n    agent: workout_validator\n",
    )
    .unwrap();
    let err = commands::pipeline::validate(bad.to_str().unwrap()).unwrap_err();
    assert!(err.contains("duplicate step name"));
}

#[test]
fn test_agents_list_rejects_missing_dir() {
    assert!(commands::agents::list(None).is_ok());
    assert!(commands::agents::list(Some("/definitely/not/here")).is_err());
}

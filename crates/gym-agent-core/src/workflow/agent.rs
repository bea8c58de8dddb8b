//! Agent definitions: named prompt configurations for the pipeline.
//!
//! The seven workout agents are built in. Any of them can be overridden (or
//! new ones added) with YAML files in an agents directory:
//!
//! ```yaml
//! id: "workout_planner"
//! name: "Workout Planner"
//! description: "Creates a 6-8 exercise workout plan"
//! model: "gemini-2.5-flash"
//! instruction: |
//!   Use the provided fields to create a workout containing 6-8 exercises.
//!   ...
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::tools::EQUIPMENT_SELECTOR;

/// An agent definition loaded from YAML or built in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDef {
    /// Agent ID referenced by pipeline steps
    pub id: String,

    /// Display name
    pub name: String,

    /// What this agent does
    #[serde(default)]
    pub description: Option<String>,

    /// Default model for this agent
    #[serde(default)]
    pub model: Option<String>,

    /// The system prompt
    pub instruction: String,

    /// Opening line shown to the user before an interactive step
    #[serde(default)]
    pub greeting: Option<String>,

    /// Tools this agent may call
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentDef {
    /// Parse an agent definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, PipelineError> {
        serde_yaml::from_str(yaml).map_err(|e| PipelineError::Parse {
            what: "agent YAML".to_string(),
            reason: e.to_string(),
        })
    }

    /// Load an agent definition from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }
}

/// Loads agent definitions from a directory, with built-ins as fallback.
pub struct AgentLoader {
    /// Loaded agents indexed by ID
    agents: HashMap<String, AgentDef>,
    /// IDs that came from files rather than built-ins
    from_files: Vec<String>,
}

impl AgentLoader {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
            from_files: Vec::new(),
        }
    }

    /// A loader holding only the built-in agents.
    pub fn with_builtins() -> Self {
        let mut loader = Self::new();
        loader.add_builtins();
        loader
    }

    /// Load all `.yaml`/`.yml` agents from a directory, then fill the gaps
    /// with built-ins.
    pub fn from_dir(dir: &str) -> Result<Self, PipelineError> {
        let mut loader = Self::new();
        loader.load_dir(dir)?;
        loader.add_builtins();
        Ok(loader)
    }

    pub fn load_dir(&mut self, dir: &str) -> Result<usize, PipelineError> {
        let dir_path = Path::new(dir);
        if !dir_path.is_dir() {
            return Err(PipelineError::Read {
                path: dir.to_string(),
                reason: "agents directory does not exist".to_string(),
            });
        }

        let read_err = |e: std::io::Error| PipelineError::Read {
            path: dir.to_string(),
            reason: e.to_string(),
        };

        let mut count = 0;
        for entry in std::fs::read_dir(dir_path).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !matches!(ext, "yaml" | "yml") {
                continue;
            }

            let agent = AgentDef::from_file(&path)?;
            tracing::info!("[AgentLoader] Loaded agent: {} ({})", agent.id, agent.name);
            self.from_files.push(agent.id.clone());
            self.agents.insert(agent.id.clone(), agent);
            count += 1;
        }

        Ok(count)
    }

    fn add_builtins(&mut self) {
        for builtin in builtin_agents() {
            self.agents.entry(builtin.id.clone()).or_insert(builtin);
        }
    }

    /// Get an agent by ID.
    pub fn get(&self, id: &str) -> Option<&AgentDef> {
        self.agents.get(id)
    }

    pub fn is_from_file(&self, id: &str) -> bool {
        self.from_files.iter().any(|f| f == id)
    }

    /// All agents, sorted by ID.
    pub fn all(&self) -> Vec<&AgentDef> {
        let mut agents: Vec<&AgentDef> = self.agents.values().collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents
    }
}

impl Default for AgentLoader {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn agent(id: &str, name: &str, description: &str, instruction: &str) -> AgentDef {
    AgentDef {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        model: None,
        instruction: instruction.trim_start().to_string(),
        greeting: None,
        tools: Vec::new(),
    }
}

/// The seven agents of the workout pipeline.
pub fn builtin_agents() -> Vec<AgentDef> {
    let mut decoder = agent(
        "workout_decoder",
        "Workout Decoder",
        "Collects 4 fields (muscle, goal, training_style, experience_level) and outputs JSON.",
        r#"
ROLE:
You are WorkoutDecoder. Collect EXACTLY these 4 fields from the user:
- muscle
- goal
- training_style
- experience_level

RULES:
- Ask ONLY for missing fields.
- Never repeat a field already provided.
- Once all fields are present, output ONLY the JSON with these keys and STOP.
- Do NOT produce workout plans or ask for equipment.
"#,
    );
    decoder.greeting = Some(
        "Hi! Let's plan your workout. Which muscle group do you want to train, what is your \
         goal, which training style do you prefer, and what is your experience level?"
            .to_string(),
    );

    let mut equipment = agent(
        "equipment_agent",
        "Equipment Agent",
        "Selects primary and alternative equipment for the target muscle.",
        r#"
EXECUTION GATE:
Run only if decoder_output exists with a 'muscle' value.

TASK:
Call the equipment_selector tool with decoder_output.muscle.
Return a short, bullet-style equipment recommendation (primary and alternatives).
Do not ask user questions.
"#,
    );
    equipment.tools = vec![EQUIPMENT_SELECTOR.to_string()];

    vec![
        decoder,
        agent(
            "workout_planner",
            "Workout Planner",
            "Creates a 6-8 exercise workout plan based on decoder_output.",
            r#"
EXECUTION GATE:
Run only if decoder_output exists and contains all required fields:
- muscle, goal, training_style, experience_level

TASK:
Use the provided fields to create a workout containing 6-8 exercises.
Do not reuse the exercises listed as used in recent workouts.
For each exercise include:
- Name
- Sets x Reps (appropriate for goal)
- Rest
- Form tip (one cue)
- Why (brief)
OUTPUT:
Return only the workout plan as plain text (no JSON).
"#,
        ),
        equipment,
        agent(
            "workout_validator",
            "Workout Validator",
            "Validates and adjusts workout for safety/volume/experience level.",
            r#"
EXECUTION GATE:
Run only if plan_output exists (a workout plan from planner).

TASK:
- Verify the plan matches the user's experience level and goal.
- Flag or adjust exercises that seem unsafe for the declared experience level.
- Ensure total volume is reasonable (no excessive sets/reps).
- Output the corrected/validated workout plan as plain text.
"#,
        ),
        agent(
            "workout_memory",
            "Workout Memory",
            "Prepares a JSON record of the workout for persistence.",
            r#"
EXECUTION GATE:
Run only if decoder_output and validated_workout both exist.

TASK:
Produce the following JSON object (exact keys):
{
  "muscle": decoder_output.muscle,
  "goal": decoder_output.goal,
  "training_style": decoder_output.training_style,
  "experience_level": decoder_output.experience_level,
  "workout": validated_workout
}
Output only the JSON (no extra text). It will be saved to the workout history.
"#,
        ),
        agent(
            "workout_recommender",
            "Workout Recommender",
            "Gives nutrition, recovery and next-session recommendations based on validated workout.",
            r#"
EXECUTION GATE:
Run only if validated_workout exists.

TASK:
Provide 4-6 concise bullet points:
- Recovery advice
- Post-workout nutrition
- Warm-up & cool-down
- Supplement suggestions (optional)
- Next-day training suggestion
Output as short bullets (plain text).
"#,
        ),
        agent(
            "workout_aggregator",
            "Workout Aggregator",
            "Aggregates decoder_output, validated_workout, equipment_output, memory_output, \
             recommendation_output into a concise bullet summary.",
            r#"
EXECUTION GATE:
Run only if all exist:
- decoder_output
- validated_workout
- equipment_output
- memory_output
- recommendation_output

TASK:
Produce a compact bullet-list summary exactly in this structure:

FINAL WORKOUT SUMMARY
- Muscle: {decoder_output.muscle}
- Goal: {decoder_output.goal}
- Style: {decoder_output.training_style}
- Level: {decoder_output.experience_level}

WORKOUT (validated):
- [each exercise as: Name — sets×reps — rest]

EQUIPMENT:
- Primary: ...
- Alternatives: ...

RECOMMENDATIONS:
- bullet 1
- bullet 2
- bullet 3

MEMORY:
- "Workout saved."

Output only bullet points, no JSON, no long paragraphs.
"#,
        ),
    ]
}

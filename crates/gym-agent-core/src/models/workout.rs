use serde::{Deserialize, Serialize};

/// One persisted past workout.
///
/// Fields default to empty strings so that hand-edited or partially written
/// history entries still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutHistoryEntry {
    #[serde(default)]
    pub muscle: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub training_style: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub workout: String,
}

/// The four fields the decoder collects from the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderOutput {
    pub muscle: String,
    pub goal: String,
    pub training_style: String,
    pub experience_level: String,
}

impl DecoderOutput {
    pub const FIELDS: [&'static str; 4] = ["muscle", "goal", "training_style", "experience_level"];

    /// Accepts the object only when all four fields are present and non-blank.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let decoded: DecoderOutput = serde_json::from_value(value.clone()).ok()?;
        let complete = [
            &decoded.muscle,
            &decoded.goal,
            &decoded.training_style,
            &decoded.experience_level,
        ]
        .iter()
        .all(|v| !v.trim().is_empty());
        complete.then_some(decoded)
    }
}

use std::path::Path;

use crate::decision_log::DecisionLog;
use crate::error::StoreError;
use crate::models::WorkoutHistoryEntry;
use crate::store::json_list::JsonListStore;

/// How many past workouts the repetition filter looks at.
pub const RECENT_WORKOUTS: usize = 3;

pub struct HistoryStore {
    list: JsonListStore<WorkoutHistoryEntry>,
}

impl HistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            list: JsonListStore::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.list.path()
    }

    pub fn load(&self) -> Result<Vec<WorkoutHistoryEntry>, StoreError> {
        self.list.load()
    }

    pub fn load_or_empty(&self, log: &DecisionLog) -> Vec<WorkoutHistoryEntry> {
        self.list.load_or_empty(log)
    }

    pub fn append(&self, entry: WorkoutHistoryEntry, log: &DecisionLog) -> Result<(), StoreError> {
        let muscle = entry.muscle.clone();
        self.list.append(entry, log)?;
        log.info(format!("Saved workout history for muscle='{}'", muscle));
        Ok(())
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize, log: &DecisionLog) -> Vec<WorkoutHistoryEntry> {
        let mut entries = self.load_or_empty(log);
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
        entries
    }

    pub fn exercises_to_avoid(&self, log: &DecisionLog) -> Vec<String> {
        let recent = self.recent(RECENT_WORKOUTS, log);
        let avoid = exercises_to_avoid(&recent);
        log.debug(format!(
            "History filter: {} line(s) to avoid from {} recent workout(s)",
            avoid.len(),
            recent.len()
        ));
        avoid
    }
}

/// Collect previously used exercise lines from the last three workouts.
///
/// A line counts when it contains the literal `Exercise` or any `-`. This is
/// a text heuristic: bullet lists and hyphenated words match too.
pub fn exercises_to_avoid(entries: &[WorkoutHistoryEntry]) -> Vec<String> {
    let start = entries.len().saturating_sub(RECENT_WORKOUTS);
    entries[start..]
        .iter()
        .flat_map(|entry| entry.workout.lines())
        .filter(|line| line.contains("Exercise") || line.contains('-'))
        .map(|line| line.to_lowercase())
        .collect()
}

/// Render the avoid list as a prompt block.
pub fn render_avoid_block(avoid: &[String]) -> String {
    if avoid.is_empty() {
        return "No previous workouts recorded.".to_string();
    }
    let mut block = String::from("Exercises used in recent workouts (avoid repeating them):\n");
    for line in avoid {
        block.push_str(line);
        block.push('\n');
    }
    block
}

//! `gym-agent history`: Inspect the saved workout history.

use gym_agent_core::models::WorkoutHistoryEntry;
use gym_agent_core::state::AppState;
use gym_agent_core::store::render_avoid_block;

use super::truncate;

/// The last `last` entries (all of them when `None`), oldest first.
pub fn entries(state: &AppState, last: Option<usize>) -> Vec<WorkoutHistoryEntry> {
    let all = state.history.load_or_empty(&state.log);
    let start = last.map(|n| all.len().saturating_sub(n)).unwrap_or(0);
    all[start..].to_vec()
}

pub fn list(state: &AppState, last: Option<usize>) -> Result<(), String> {
    let entries = entries(state, last);
    if entries.is_empty() {
        println!("No workouts saved yet ({}).", state.history.path().display());
        return Ok(());
    }

    println!("┌─────┬──────────────┬──────────────────┬──────────────┬──────────────┐");
    println!("│ #   │ Muscle       │ Goal             │ Style        │ Level        │");
    println!("├─────┼──────────────┼──────────────────┼──────────────┼──────────────┤");
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "│ {:<3} │ {:<12} │ {:<16} │ {:<12} │ {:<12} │",
            i + 1,
            truncate(&entry.muscle, 12),
            truncate(&entry.goal, 16),
            truncate(&entry.training_style, 12),
            truncate(&entry.experience_level, 12)
        );
    }
    println!("└─────┴──────────────┴──────────────────┴──────────────┴──────────────┘");
    Ok(())
}

/// Print the exercise lines the planner is told to avoid.
pub fn avoid(state: &AppState) -> Result<(), String> {
    let avoid = state.history.exercises_to_avoid(&state.log);
    println!("{}", render_avoid_block(&avoid));
    Ok(())
}

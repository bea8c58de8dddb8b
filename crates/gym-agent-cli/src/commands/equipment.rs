//! `gym-agent equipment`: Look up equipment for a muscle group.

use gym_agent_core::equipment;
use gym_agent_core::models::EquipmentRecommendation;
use gym_agent_core::state::AppState;

pub fn recommend(state: &AppState, muscle: &str) -> EquipmentRecommendation {
    equipment::lookup(&state.workspace.equipment_db_path(), Some(muscle), &state.log)
}

/// Print the recommendation as JSON.
pub fn lookup(state: &AppState, muscle: &str) -> Result<(), String> {
    let recommendation = recommend(state, muscle);
    let value = serde_json::to_value(&recommendation).map_err(|e| e.to_string())?;
    super::print_json(&value);
    Ok(())
}

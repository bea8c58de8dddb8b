use serde::{Deserialize, Serialize};

/// Fallback when the table has no entry for a muscle (or no table at all).
pub const DEFAULT_REQUIRED_EQUIPMENT: &[&str] = &["Dumbbells", "Resistance Bands"];
pub const DEFAULT_ALTERNATIVES: &[&str] = &["Bodyweight variations", "Household objects (water jugs)"];

/// One row of the static equipment table, keyed by lowercase muscle name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    #[serde(default)]
    pub required_equipment: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Success,
    NotFound,
}

impl LookupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
        }
    }
}

/// Result of an equipment lookup, as handed to the equipment agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRecommendation {
    pub status: LookupStatus,
    pub muscle: String,
    pub required: Vec<String>,
    pub alternatives: Vec<String>,
}

impl EquipmentRecommendation {
    pub fn found(muscle: String, record: &EquipmentRecord) -> Self {
        Self {
            status: LookupStatus::Success,
            muscle,
            required: record.required_equipment.clone(),
            alternatives: record.alternatives.clone(),
        }
    }

    pub fn not_found(muscle: String) -> Self {
        Self {
            status: LookupStatus::NotFound,
            muscle,
            required: DEFAULT_REQUIRED_EQUIPMENT.iter().map(|s| s.to_string()).collect(),
            alternatives: DEFAULT_ALTERNATIVES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

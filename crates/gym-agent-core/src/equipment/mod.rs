//! Equipment lookup: maps a muscle group to required and alternative
//! equipment using the static `data/equipments_db.json` table.
//!
//! The table is read fresh on every lookup. A missing or malformed table is
//! reported to the caller as a `StoreError`; `lookup` then treats it as an
//! empty table and answers with the fixed fallback recommendation.

use std::collections::HashMap;
use std::path::Path;

use crate::decision_log::DecisionLog;
use crate::error::StoreError;
use crate::models::{EquipmentRecommendation, EquipmentRecord};

#[derive(Debug, Clone, Default)]
pub struct EquipmentTable {
    records: HashMap<String, EquipmentRecord>,
    skipped: Vec<String>,
}

impl EquipmentTable {
    pub fn from_json(json: &str, path: &Path) -> Result<Self, StoreError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| StoreError::malformed(path, e))?;
        let serde_json::Value::Object(entries) = value else {
            return Err(StoreError::malformed(path, "expected a JSON object keyed by muscle"));
        };

        // A bad record only costs its own key.
        let mut records = HashMap::with_capacity(entries.len());
        let mut skipped = Vec::new();
        for (muscle, record) in entries {
            match serde_json::from_value::<EquipmentRecord>(record) {
                Ok(record) => {
                    records.insert(muscle, record);
                }
                Err(e) => skipped.push(format!("{}: {}", muscle, e)),
            }
        }
        Ok(Self { records, skipped })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        Self::from_json(&content, path)
    }

    /// Load the table, substituting an empty one on any error.
    pub fn load_or_empty(path: impl AsRef<Path>, log: &DecisionLog) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(table) => {
                log.debug(format!("Loaded equipments DB from {}", path.display()));
                for entry in &table.skipped {
                    log.warning(format!("Skipping equipment record {}", entry));
                }
                table
            }
            Err(StoreError::NotFound(_)) => {
                log.warning(format!(
                    "Equipment DB not found at {}. Returning empty DB.",
                    path.display()
                ));
                Self::default()
            }
            Err(e) => {
                log.error(format!("Equipment DB unusable: {}", e));
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, muscle: &str) -> Option<&EquipmentRecord> {
        self.records.get(muscle)
    }

    /// Records that could not be read, as `"<muscle>: <error>"`.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn muscles(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.records.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Look up an already-loaded table.
    pub fn lookup(&self, muscle: Option<&str>) -> EquipmentRecommendation {
        let muscle = normalize_muscle(muscle);
        match self.records.get(&muscle) {
            Some(record) => EquipmentRecommendation::found(muscle, record),
            None => EquipmentRecommendation::not_found(muscle),
        }
    }
}

/// Trim and lower-case a muscle name; absent names become `""`.
pub fn normalize_muscle(muscle: Option<&str>) -> String {
    muscle.unwrap_or("").trim().to_lowercase()
}

/// Load the table at `table_path` and look up `muscle`. Never fails.
pub fn lookup(table_path: &Path, muscle: Option<&str>, log: &DecisionLog) -> EquipmentRecommendation {
    let table = EquipmentTable::load_or_empty(table_path, log);
    let recommendation = table.lookup(muscle);
    log.debug(format!(
        "equipment_selector called for muscle='{}' -> {}",
        recommendation.muscle,
        recommendation.status.as_str()
    ));
    recommendation
}

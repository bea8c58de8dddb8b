//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses the
//! gym-agent-core domain logic through `AppState`.

pub mod agents;
pub mod equipment;
pub mod history;
pub mod pipeline;
pub mod run;

use std::path::Path;

use gym_agent_core::state::{AppState, AppStateInner};

/// Open the gym-agent home directory (creating `memory/`, `logs/`, `data/`).
pub fn init_state(home: &str, trace: bool) -> Result<AppState, String> {
    AppStateInner::open(home, trace)
        .map_err(|e| format!("Failed to open home directory '{}': {}", home, e))
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

/// Load `.env.local` then `.env` from `dir`. Variables already set in the
/// environment are kept, so `.env.local` wins over `.env`.
pub fn load_dotenv(dir: &Path) {
    for filename in [".env.local", ".env"] {
        let path = dir.join(filename);
        if !path.is_file() {
            continue;
        }
        match dotenvy::from_path(&path) {
            Ok(()) => tracing::info!("[Env] Loaded environment from '{}'", path.display()),
            Err(e) => tracing::warn!("[Env] Could not load '{}': {}", path.display(), e),
        }
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

pub mod history_store;
pub mod json_list;

pub use history_store::{exercises_to_avoid, render_avoid_block, HistoryStore, RECENT_WORKOUTS};
pub use json_list::{write_json, JsonListStore};

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::decision_log::DecisionLog;
use crate::error::StoreError;

/// A list of records persisted as one pretty-printed JSON array.
///
/// Writes are a plain overwrite of the whole file: there is no locking and
/// no atomic rename, so concurrent writers race and a crash mid-write can
/// truncate the file.
pub struct JsonListStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonListStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<T>, StoreError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| StoreError::malformed(&self.path, e))?;
        if !value.is_array() {
            return Err(StoreError::malformed(&self.path, "expected a JSON array"));
        }
        serde_json::from_value(value).map_err(|e| StoreError::malformed(&self.path, e))
    }

    /// Load the list, substituting an empty one on any error.
    pub fn load_or_empty(&self, log: &DecisionLog) -> Vec<T> {
        match self.load() {
            Ok(entries) => entries,
            Err(StoreError::NotFound(_)) => {
                log.debug(format!("{} does not exist yet; starting empty", self.path.display()));
                Vec::new()
            }
            Err(e @ StoreError::Malformed { .. }) => {
                log.warning(format!("{}; starting with a new list", e));
                Vec::new()
            }
            Err(e) => {
                log.error(format!("{}; starting with a new list", e));
                Vec::new()
            }
        }
    }

    pub fn save(&self, entries: &[T]) -> Result<(), StoreError> {
        write_json(&self.path, &entries)
    }

    /// Load (leniently), push one entry, rewrite the whole file.
    pub fn append(&self, entry: T, log: &DecisionLog) -> Result<(), StoreError> {
        let mut entries = self.load_or_empty(log);
        entries.push(entry);
        self.save(&entries)?;
        log.debug(format!("Appended entry to {}", self.path.display()));
        Ok(())
    }
}

/// Overwrite `path` with `value` as indented JSON.
pub fn write_json<V: Serialize + ?Sized>(path: &Path, value: &V) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::malformed(path, e))?;
    std::fs::write(path, json).map_err(|e| StoreError::io(path, e))
}

use anyhow::{Context, Result};
use log::warn;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use super::StateStore;

/// Key-value store kept as a pretty-printed JSON object on disk. The whole
/// map is rewritten on every `set`.
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "State file {} is corrupt ({err}); starting empty",
                    path.display()
                );
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write state to {}", self.path.display()))
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string(), value.to_string());
        self.persist(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mode, TimeStats};
    use crate::store::{load_state, save_mode, save_stats};
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("modewatch-{}", Uuid::new_v4()))
            .join("state.json")
    }

    #[test]
    fn values_survive_reopen() {
        let path = temp_path();
        let stats = TimeStats {
            focus_ms: 1_500,
            break_ms: 0,
            idle_ms: 250,
        };
        {
            let store = JsonFileStore::new(path.clone()).unwrap();
            save_mode(&store, Mode::Focus).unwrap();
            save_stats(&store, &stats).unwrap();
        }

        let reopened = JsonFileStore::new(path.clone()).unwrap();
        let state = load_state(&reopened);
        assert_eq!(state.mode, Mode::Focus);
        assert_eq!(state.stats, stats);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "]]").unwrap();

        let store = JsonFileStore::new(path.clone()).unwrap();
        assert_eq!(store.get("currentMode").unwrap(), None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}

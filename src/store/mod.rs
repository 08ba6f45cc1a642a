// Guild config store
// One in-memory record per guild, persisted in full after every change.

pub mod json_file;

use std::collections::BTreeMap;
use std::sync::Mutex;

use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::guild::GuildConfig;

pub use json_file::JsonFileBackend;

/// Guild id (as string, the JSON key) -> config
pub type ConfigMap = BTreeMap<String, GuildConfig>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the config map lives between restarts
pub trait ConfigBackend: Send + Sync {
    fn load(&self) -> Result<ConfigMap, StoreError>;
    fn save(&self, configs: &ConfigMap) -> Result<(), StoreError>;
}

pub struct ConfigStore {
    backend: Box<dyn ConfigBackend>,
    guilds: DashMap<String, GuildConfig>,
    save_lock: Mutex<()>,
}

impl ConfigStore {
    /// Load configs from the backend; any load failure starts empty
    pub fn open(backend: Box<dyn ConfigBackend>) -> Self {
        let configs = match backend.load() {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to load guild configs, starting empty: {}", e);
                ConfigMap::new()
            }
        };
        info!("Loaded config for {} guild(s)", configs.len());

        Self {
            backend,
            guilds: configs.into_iter().collect(),
            save_lock: Mutex::new(()),
        }
    }

    /// The guild's config, or defaults if it has none yet
    pub fn get(&self, guild_id: serenity::GuildId) -> GuildConfig {
        self.guilds
            .get(&guild_id.to_string())
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Read-modify-write one guild's config, then persist everything
    ///
    /// The record is created on first write. Writers hold the save lock from
    /// `f` until the file is written, so updates never interleave. When the
    /// save fails the record is put back the way it was.
    pub fn update<F, R>(&self, guild_id: serenity::GuildId, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut GuildConfig) -> R,
    {
        let _guard = self.save_lock.lock().unwrap_or_else(|p| p.into_inner());
        let key = guild_id.to_string();

        let previous = self.guilds.get(&key).map(|c| c.clone());
        let mut config = previous.clone().unwrap_or_default();
        let result = f(&mut config);
        self.guilds.insert(key.clone(), config);

        if let Err(e) = self.persist() {
            match previous {
                Some(old) => {
                    self.guilds.insert(key, old);
                }
                None => {
                    self.guilds.remove(&key);
                }
            }
            return Err(e);
        }
        Ok(result)
    }

    /// Write a snapshot of every guild; callers hold `save_lock`
    fn persist(&self) -> Result<(), StoreError> {
        let snapshot: ConfigMap = self
            .guilds
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        self.backend.save(&snapshot).inspect_err(|e| {
            error!("Failed to save guild configs: {}", e);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::guild::SupportType;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn guild(id: u64) -> serenity::GuildId {
        serenity::GuildId::new(id)
    }

    fn file_store(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::open(Box::new(JsonFileBackend::new(dir.path().join("config.json"))))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("nope.json"));
        assert!(backend.load().unwrap().is_empty());

        let store = ConfigStore::open(Box::new(backend));
        assert_eq!(store.get(guild(1)), GuildConfig::default());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let store = ConfigStore::open(Box::new(JsonFileBackend::new(&path)));
        assert_eq!(store.get(guild(1)), GuildConfig::default());
    }

    #[test]
    fn test_non_object_guild_entry_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"1": 5, "2": {"support_role": 9}}"#).unwrap();

        let store = ConfigStore::open(Box::new(JsonFileBackend::new(&path)));
        assert_eq!(store.get(guild(1)), GuildConfig::default());
        assert_eq!(store.get(guild(2)).support_role, Some(9));
    }

    #[test]
    fn test_set_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = file_store(&dir);
            store
                .update(guild(10), |c| {
                    c.support_role = Some(123);
                    c.panel_title = Some("Help desk".into());
                })
                .unwrap();
        }

        let store = file_store(&dir);
        let cfg = store.get(guild(10));
        assert_eq!(cfg.support_role, Some(123));
        assert_eq!(cfg.panel_title.as_deref(), Some("Help desk"));
    }

    #[test]
    fn test_clear_removes_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir);
        store
            .update(guild(10), |c| c.button_label = Some("Go".into()))
            .unwrap();
        store.update(guild(10), |c| c.button_label = None).unwrap();

        let raw = fs::read_to_string(dir.path().join("config.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["10"], serde_json::json!({}));
        assert!(!raw.contains("null"));
    }

    #[test]
    fn test_support_types_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = file_store(&dir);
            store
                .update(guild(3), |c| {
                    c.support_types.insert(
                        "billing".into(),
                        SupportType { category_id: Some(4), role_id: None },
                    );
                })
                .unwrap();
        }
        let store = file_store(&dir);
        assert_eq!(
            store.get(guild(3)).support_type("Billing"),
            Some(&SupportType { category_id: Some(4), role_id: None })
        );
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(file_store(&dir));

        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        store
                            .update(guild(1 + i % 2), |c| {
                                let n = c.support_role.unwrap_or(0);
                                c.support_role = Some(n + 1);
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get(guild(1)).support_role, Some(40));
        assert_eq!(store.get(guild(2)).support_role, Some(40));

        let reloaded = file_store(&dir);
        assert_eq!(reloaded.get(guild(1)).support_role, Some(40));
        assert_eq!(reloaded.get(guild(2)).support_role, Some(40));
    }

    /// Loads `initial`, then fails every save while `broken` is set
    struct FlakyBackend {
        initial: ConfigMap,
        broken: Arc<AtomicBool>,
    }

    impl ConfigBackend for FlakyBackend {
        fn load(&self) -> Result<ConfigMap, StoreError> {
            Ok(self.initial.clone())
        }
        fn save(&self, _: &ConfigMap) -> Result<(), StoreError> {
            if self.broken.load(Ordering::SeqCst) {
                Err(StoreError::Io(std::io::Error::other("disk gone")))
            } else {
                Ok(())
            }
        }
    }

    fn flaky_store(initial: ConfigMap) -> (ConfigStore, Arc<AtomicBool>) {
        let broken = Arc::new(AtomicBool::new(true));
        let backend = FlakyBackend {
            initial,
            broken: Arc::clone(&broken),
        };
        (ConfigStore::open(Box::new(backend)), broken)
    }

    #[test]
    fn test_save_error_is_reported() {
        let mut initial = ConfigMap::new();
        initial.insert(
            "1".into(),
            GuildConfig {
                support_role: Some(3),
                ..Default::default()
            },
        );
        let (store, broken) = flaky_store(initial);

        assert!(store.update(guild(1), |c| c.support_role = Some(7)).is_err());
        assert_eq!(store.get(guild(1)).support_role, Some(3));

        // a guild that had no record gets none
        assert!(store.update(guild(2), |c| c.support_role = Some(7)).is_err());
        assert_eq!(store.get(guild(2)), GuildConfig::default());

        // the failed change is not carried into the next good save
        broken.store(false, Ordering::SeqCst);
        store.update(guild(2), |c| c.panel_title = Some("Desk".into())).unwrap();
        assert_eq!(store.get(guild(1)).support_role, Some(3));
        assert_eq!(store.get(guild(2)).support_role, None);
    }

    #[test]
    fn test_load_error_starts_empty() {
        struct Unreadable;
        impl ConfigBackend for Unreadable {
            fn load(&self) -> Result<ConfigMap, StoreError> {
                Err(StoreError::Io(std::io::Error::other("disk gone")))
            }
            fn save(&self, _: &ConfigMap) -> Result<(), StoreError> {
                Ok(())
            }
        }

        let store = ConfigStore::open(Box::new(Unreadable));
        assert_eq!(store.get(guild(1)), GuildConfig::default());
    }
}

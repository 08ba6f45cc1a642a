// JSON file persistence for guild configs

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::{ConfigBackend, ConfigMap, StoreError};
use crate::models::guild::GuildConfig;

/// Stores every guild's config in one pretty-printed JSON document
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigBackend for JsonFileBackend {
    fn load(&self) -> Result<ConfigMap, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}, starting empty", self.path.display());
                return Ok(ConfigMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)?;

        let configs = raw
            .into_iter()
            .map(|(guild_id, value)| {
                let config = match serde_json::from_value::<GuildConfig>(value) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Ignoring malformed config for guild {}: {}", guild_id, e);
                        GuildConfig::default()
                    }
                };
                (guild_id, config)
            })
            .collect();

        Ok(configs)
    }

    fn save(&self, configs: &ConfigMap) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(configs)?;

        // Write next to the target, then swap it in
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

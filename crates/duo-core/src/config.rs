use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::errors::CallError;

const CONFIG_FILE: &str = "call.json";

/// Uid this participant publishes as.
pub const DEFAULT_LOCAL_UID: u32 = 5;

/// Inputs the shell supplies before a call: engine app id and channel
/// credentials. Not validated here; the engine rejects bad values itself.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CallConfig {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default = "default_local_uid")]
    pub local_uid: u32,
}

fn default_local_uid() -> u32 {
    DEFAULT_LOCAL_UID
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            token: String::new(),
            channel_name: String::new(),
            local_uid: DEFAULT_LOCAL_UID,
        }
    }
}

pub struct ConfigStore {
    config: Mutex<CallConfig>,
    file_path: PathBuf,
}

impl ConfigStore {
    pub fn new(data_dir: &str) -> Self {
        let file_path = PathBuf::from(data_dir).join(CONFIG_FILE);
        let config = Self::load(&file_path);
        Self {
            config: Mutex::new(config),
            file_path,
        }
    }

    pub fn get(&self) -> CallConfig {
        self.lock().clone()
    }

    pub fn set_app_id(&self, app_id: String) -> Result<(), CallError> {
        self.lock().app_id = app_id;
        self.save()
    }

    pub fn set_token(&self, token: String) -> Result<(), CallError> {
        self.lock().token = token;
        self.save()
    }

    pub fn set_channel_name(&self, channel_name: String) -> Result<(), CallError> {
        self.lock().channel_name = channel_name;
        self.save()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CallConfig> {
        self.config.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self) -> Result<(), CallError> {
        let config = self.get();
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CallError::Config(format!("create {}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| CallError::Config(e.to_string()))?;
        std::fs::write(&self.file_path, json)
            .map_err(|e| CallError::Config(format!("write {}: {e}", self.file_path.display())))
    }

    fn load(path: &Path) -> CallConfig {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("ignoring unreadable {}: {e}", path.display());
                CallConfig::default()
            }),
            Err(_) => CallConfig::default(),
        }
    }
}

//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application settings (`config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

/// Engine session management
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Live sessions kept under moderate memory pressure
    #[serde(default = "default_max_live_sessions")]
    pub max_live_sessions: usize,

    /// Create a session as soon as a tab becomes selected
    #[serde(default = "default_true")]
    pub create_session_on_select: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_live_sessions: default_max_live_sessions(),
            create_session_on_select: true,
        }
    }
}

/// Snapshot persistence
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Debounce between a state change and the snapshot write
    #[serde(default = "default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,

    #[serde(default = "default_true")]
    pub restore_parent_ids: bool,
}

impl StorageSettings {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_millis(self.autosave_interval_ms)
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            autosave_interval_ms: default_autosave_interval_ms(),
            restore_parent_ids: true,
        }
    }
}

fn default_max_live_sessions() -> usize {
    5
}

fn default_file_name() -> String {
    "browser_state.json".to_string()
}

fn default_autosave_interval_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.engine.max_live_sessions, 5);
        assert!(settings.engine.create_session_on_select);
        assert_eq!(settings.storage.file_name, "browser_state.json");
        assert_eq!(settings.storage.autosave_interval(), Duration::from_secs(2));
        assert!(settings.storage.restore_parent_ids);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let settings: Settings = toml::from_str("[engine]\nmax_live_sessions = 2\n").unwrap();
        assert_eq!(settings.engine.max_live_sessions, 2);
        assert!(settings.engine.create_session_on_select);
        assert_eq!(settings.storage, StorageSettings::default());
    }
}

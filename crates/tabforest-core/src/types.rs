//! Core domain types for browser tabs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque unique identifier of a tab.
///
/// Parent links between tabs are stored as plain `TabId`s, never as owning
/// references, so a tab record can not form a reference cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id (UUID v4)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TabId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for TabId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Security descriptor of the page currently loaded in a tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityInfo {
    pub secure: bool,
    pub host: String,
    pub issuer: String,
}

impl SecurityInfo {
    /// Build from engine-provided values; missing host/issuer become empty strings.
    pub fn new(secure: bool, host: Option<String>, issuer: Option<String>) -> Self {
        Self {
            secure,
            host: host.unwrap_or_default(),
            issuer: issuer.unwrap_or_default(),
        }
    }
}

/// Reader mode state of a tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderState {
    pub active: bool,
    pub active_url: Option<String>,
}

/// Displayed content of a tab, kept current by engine callbacks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentState {
    pub url: String,
    pub title: String,
    pub private: bool,
    /// Load progress, 0-100
    pub progress: u8,
    pub loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub search_terms: String,
    pub security: SecurityInfo,
}

impl ContentState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Memory pressure reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPressure {
    /// Release sessions beyond the configured live-session budget
    Moderate,
    /// Release every session except the selected tab's
    Critical,
}

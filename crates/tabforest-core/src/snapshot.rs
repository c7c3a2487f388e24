//! Engine-independent snapshot types used to recover tabs from disk

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{Error, Result};
use crate::types::{ReaderState, TabId};

/// Serialized navigation state of an engine session.
///
/// The blob is owned by the engine; tabforest stores and forwards the raw
/// JSON text without looking inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineSessionState(Box<RawValue>);

impl EngineSessionState {
    /// Wrap a JSON document, validating that it is well-formed JSON
    pub fn from_json(json: impl Into<String>) -> Result<Self> {
        RawValue::from_string(json.into())
            .map(Self)
            .map_err(|e| Error::malformed_snapshot(format!("Invalid engine session state: {}", e)))
    }

    pub fn from_raw(raw: Box<RawValue>) -> Self {
        Self(raw)
    }

    pub fn as_json(&self) -> &str {
        self.0.get()
    }

    pub fn as_raw(&self) -> &RawValue {
        &self.0
    }
}

impl PartialEq for EngineSessionState {
    fn eq(&self, other: &Self) -> bool {
        self.as_json() == other.as_json()
    }
}

impl Eq for EngineSessionState {}

/// A tab as recovered from a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverableTab {
    pub id: TabId,
    pub parent_id: Option<TabId>,
    pub url: String,
    pub title: String,
    pub context_id: Option<String>,
    pub last_access: i64,
    pub private: bool,
    pub reader: ReaderState,
    pub engine_state: Option<EngineSessionState>,
}

impl RecoverableTab {
    pub fn new(id: impl Into<TabId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            url: url.into(),
            title: String::new(),
            context_id: None,
            last_access: 0,
            private: false,
            reader: ReaderState::default(),
            engine_state: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<TabId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_last_access(mut self, last_access: i64) -> Self {
        self.last_access = last_access;
        self
    }

    pub fn with_engine_state(mut self, state: EngineSessionState) -> Self {
        self.engine_state = Some(state);
        self
    }
}

/// The tab forest as recovered from a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverableBrowserState {
    pub tabs: Vec<RecoverableTab>,
    pub selected_tab_id: Option<TabId>,
}

impl RecoverableBrowserState {
    pub fn find_tab(&self, tab_id: &TabId) -> Option<&RecoverableTab> {
        self.tabs.iter().find(|t| &t.id == tab_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_state_keeps_raw_text() {
        let state = EngineSessionState::from_json(r#"{"history":[1,2,3]}"#).unwrap();
        assert_eq!(state.as_json(), r#"{"history":[1,2,3]}"#);
    }

    #[test]
    fn test_engine_state_rejects_invalid_json() {
        let err = EngineSessionState::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::MalformedSnapshot { .. }));
    }

    #[test]
    fn test_engine_state_serializes_inline() {
        let state = EngineSessionState::from_json(r#"{"a":1}"#).unwrap();
        let json = serde_json::to_string(&vec![state]).unwrap();
        assert_eq!(json, r#"[{"a":1}]"#);
    }

    #[test]
    fn test_find_tab() {
        let state = RecoverableBrowserState {
            tabs: vec![
                RecoverableTab::new("a", "https://a.test"),
                RecoverableTab::new("b", "https://b.test").with_parent("a"),
            ],
            selected_tab_id: Some(TabId::new("b")),
        };
        let tab = state.find_tab(&TabId::new("b")).unwrap();
        assert_eq!(tab.parent_id, Some(TabId::new("a")));
        assert!(state.find_tab(&TabId::new("c")).is_none());
    }
}

//! Browser state (the Model)
//!
//! An immutable forest of tab records. Reducers never mutate a published
//! state; they build a new one and hand it out behind an `Arc`, so callers
//! can detect a no-op with `Arc::ptr_eq`.

use tabforest_core::{
    ContentState, EngineSessionState, ReaderState, RecoverableBrowserState, RecoverableTab, TabId,
};
use tabforest_engine::EngineSessionHandle;

/// Engine-side state of a tab
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    /// The live session linked to this tab, if any
    pub session: Option<EngineSessionHandle>,

    /// Last known serialized state, used to recreate an equivalent session
    /// after the live one was released
    pub session_state: Option<EngineSessionState>,

    /// The linked session already shows its page; do not navigate it again
    pub skip_initial_load: bool,
}

impl EngineState {
    pub fn is_linked(&self) -> bool {
        self.session.is_some()
    }
}

/// A single logical browser tab
#[derive(Debug, Clone, PartialEq)]
pub struct TabRecord {
    pub id: TabId,
    /// Weak link to the tab that opened this one
    pub parent_id: Option<TabId>,
    pub content: ContentState,
    /// Container/partition id; carried along but never interpreted
    pub context_id: Option<String>,
    /// Epoch millis of the last time this tab was selected
    pub last_access: i64,
    pub reader: ReaderState,
    pub trackers_blocked: Vec<String>,
    pub engine: EngineState,
}

impl TabRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_id(TabId::generate(), url)
    }

    pub fn with_id(id: impl Into<TabId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            content: ContentState::new(url),
            context_id: None,
            last_access: 0,
            reader: ReaderState::default(),
            trackers_blocked: Vec::new(),
            engine: EngineState::default(),
        }
    }

    pub fn parent(mut self, parent_id: impl Into<TabId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn private(mut self, private: bool) -> Self {
        self.content.private = private;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.content.title = title.into();
        self
    }

    pub fn context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    pub fn last_access(mut self, last_access: i64) -> Self {
        self.last_access = last_access;
        self
    }

    pub fn engine_state(mut self, state: EngineSessionState) -> Self {
        self.engine.session_state = Some(state);
        self
    }

    pub fn is_private(&self) -> bool {
        self.content.private
    }

    /// Snapshot view of this tab for persistence
    pub fn to_recoverable(&self) -> RecoverableTab {
        RecoverableTab {
            id: self.id.clone(),
            parent_id: self.parent_id.clone(),
            url: self.content.url.clone(),
            title: self.content.title.clone(),
            context_id: self.context_id.clone(),
            last_access: self.last_access,
            private: self.content.private,
            reader: self.reader.clone(),
            engine_state: self.engine.session_state.clone(),
        }
    }
}

impl From<RecoverableTab> for TabRecord {
    fn from(tab: RecoverableTab) -> Self {
        Self {
            id: tab.id,
            parent_id: tab.parent_id,
            content: ContentState::new(tab.url)
                .with_title(tab.title)
                .private(tab.private),
            context_id: tab.context_id,
            last_access: tab.last_access,
            reader: tab.reader,
            trackers_blocked: Vec::new(),
            engine: EngineState {
                session: None,
                session_state: tab.engine_state,
                skip_initial_load: false,
            },
        }
    }
}

/// The whole tab forest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowserState {
    /// Tabs in insertion order; the tree shape lives in `parent_id`
    pub tabs: Vec<TabRecord>,
    pub selected_tab_id: Option<TabId>,
}

impl BrowserState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tabs(tabs: Vec<TabRecord>, selected_tab_id: Option<TabId>) -> Self {
        Self {
            tabs,
            selected_tab_id,
        }
    }

    pub fn find_tab(&self, tab_id: &TabId) -> Option<&TabRecord> {
        self.tabs.iter().find(|t| &t.id == tab_id)
    }

    pub fn contains(&self, tab_id: &TabId) -> bool {
        self.find_tab(tab_id).is_some()
    }

    pub fn index_of(&self, tab_id: &TabId) -> Option<usize> {
        self.tabs.iter().position(|t| &t.id == tab_id)
    }

    pub fn selected_tab(&self) -> Option<&TabRecord> {
        self.selected_tab_id
            .as_ref()
            .and_then(|id| self.find_tab(id))
    }

    /// Direct children of `tab_id`, in insertion order
    pub fn children_of<'a>(&'a self, tab_id: &'a TabId) -> impl Iterator<Item = &'a TabRecord> {
        self.tabs
            .iter()
            .filter(move |t| t.parent_id.as_ref() == Some(tab_id))
    }

    pub fn normal_tabs(&self) -> impl Iterator<Item = &TabRecord> {
        self.tabs.iter().filter(|t| !t.is_private())
    }

    pub fn private_tabs(&self) -> impl Iterator<Item = &TabRecord> {
        self.tabs.iter().filter(|t| t.is_private())
    }

    /// Tabs that currently have a live engine session
    pub fn linked_tabs(&self) -> impl Iterator<Item = &TabRecord> {
        self.tabs.iter().filter(|t| t.engine.is_linked())
    }

    /// Snapshot of the non-private part of the forest
    pub fn to_recoverable(&self) -> RecoverableBrowserState {
        let tabs: Vec<RecoverableTab> = self
            .normal_tabs()
            .map(TabRecord::to_recoverable)
            .collect();
        let selected_tab_id = self
            .selected_tab()
            .filter(|t| !t.is_private())
            .map(|t| t.id.clone());
        RecoverableBrowserState {
            tabs,
            selected_tab_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest() -> BrowserState {
        BrowserState::with_tabs(
            vec![
                TabRecord::with_id("a", "https://a.test"),
                TabRecord::with_id("b", "https://b.test").parent("a"),
                TabRecord::with_id("c", "https://c.test").parent("a"),
                TabRecord::with_id("p", "https://p.test").private(true),
            ],
            Some(TabId::new("p")),
        )
    }

    #[test]
    fn test_children_of() {
        let state = forest();
        let a = TabId::new("a");
        let children: Vec<&str> = state.children_of(&a).map(|t| t.id.as_str()).collect();
        assert_eq!(children, vec!["b", "c"]);
    }

    #[test]
    fn test_normal_and_private_partition() {
        let state = forest();
        assert_eq!(state.normal_tabs().count(), 3);
        assert_eq!(state.private_tabs().count(), 1);
    }

    #[test]
    fn test_to_recoverable_excludes_private_tabs_and_selection() {
        let state = forest();
        let snapshot = state.to_recoverable();
        assert_eq!(snapshot.tabs.len(), 3);
        assert!(snapshot.tabs.iter().all(|t| !t.private));
        assert_eq!(snapshot.selected_tab_id, None);
    }

    #[test]
    fn test_recoverable_conversion_keeps_fields() {
        let tab = TabRecord::with_id("x", "https://x.test")
            .parent("y")
            .title("X")
            .context_id("work")
            .last_access(42);
        let back = TabRecord::from(tab.to_recoverable());
        assert_eq!(back, tab);
    }

    #[test]
    fn test_selected_tab_missing_id() {
        let mut state = forest();
        state.selected_tab_id = Some(TabId::new("gone"));
        assert!(state.selected_tab().is_none());
    }
}

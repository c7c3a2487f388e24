//! Domain events emitted by the Store for external consumers
//!
//! Events are derived from a before/after comparison of the browser state
//! and broadcast after each action via `Store::subscribe()`.

use tabforest_core::TabId;

/// Domain events emitted by the Store.
///
/// Subscribers that fall behind lose the oldest events; the published
/// state (`Dispatcher::state()`) stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    // ─────────────────────────────────────────────────────────
    // Tab Lifecycle
    // ─────────────────────────────────────────────────────────
    TabAdded { tab_id: TabId },

    TabRemoved { tab_id: TabId },

    /// A snapshot was merged into the forest
    Restored { count: usize },

    // ─────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────
    SelectionChanged {
        previous: Option<TabId>,
        current: Option<TabId>,
    },

    // ─────────────────────────────────────────────────────────
    // Engine Sessions
    // ─────────────────────────────────────────────────────────
    EngineSessionLinked { tab_id: TabId },

    EngineSessionUnlinked { tab_id: TabId },

    // ─────────────────────────────────────────────────────────
    // Store Lifecycle
    // ─────────────────────────────────────────────────────────
    Shutdown,
}

impl StoreEvent {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TabAdded { .. } => "tab_added",
            Self::TabRemoved { .. } => "tab_removed",
            Self::Restored { .. } => "restored",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::EngineSessionLinked { .. } => "engine_session_linked",
            Self::EngineSessionUnlinked { .. } => "engine_session_unlinked",
            Self::Shutdown => "shutdown",
        }
    }
}

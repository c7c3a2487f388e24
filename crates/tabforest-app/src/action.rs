//! Action types dispatched to the store

use std::sync::Arc;

use tabforest_core::{
    EngineSessionState, MemoryPressure, RecoverableBrowserState, RecoverableTab, SecurityInfo,
    TabId,
};
use tabforest_engine::EngineSessionHandle;

use crate::observer::EngineObserver;
use crate::state::TabRecord;

/// All actions the store understands
#[derive(Debug, Clone)]
pub enum Action {
    TabList(TabListAction),
    Engine(EngineAction),
    Content(ContentAction),
}

impl Action {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Action::TabList(a) => a.kind(),
            Action::Engine(a) => a.kind(),
            Action::Content(_) => "content",
        }
    }
}

// ─────────────────────────────────────────────────────────
// Tab List
// ─────────────────────────────────────────────────────────

/// Changes to the shape of the tab forest and its selection
#[derive(Debug, Clone)]
pub enum TabListAction {
    /// Add a tab, directly after its parent when it has one
    AddTab { tab: TabRecord, select: bool },

    SelectTab { tab_id: TabId },

    /// Remove a tab, reparenting its children to its own parent
    RemoveTab {
        tab_id: TabId,
        select_parent_if_exists: bool,
    },

    RemoveTabs { tab_ids: Vec<TabId> },

    RemoveAllTabs,

    RemoveAllNormalTabs,

    RemoveAllPrivateTabs,

    /// Add tabs recovered from a snapshot
    Restore {
        tabs: Vec<RecoverableTab>,
        selected_tab_id: Option<TabId>,
    },

    UpdateLastAccess { tab_id: TabId, last_access: i64 },
}

impl TabListAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddTab { .. } => "add_tab",
            Self::SelectTab { .. } => "select_tab",
            Self::RemoveTab { .. } => "remove_tab",
            Self::RemoveTabs { .. } => "remove_tabs",
            Self::RemoveAllTabs => "remove_all_tabs",
            Self::RemoveAllNormalTabs => "remove_all_normal_tabs",
            Self::RemoveAllPrivateTabs => "remove_all_private_tabs",
            Self::Restore { .. } => "restore",
            Self::UpdateLastAccess { .. } => "update_last_access",
        }
    }
}

// ─────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────

/// Engine session lifecycle
#[derive(Debug, Clone)]
pub enum EngineAction {
    /// Make sure the tab has a live engine session
    CreateEngineSession { tab_id: TabId },

    /// Attach a freshly created session and its observer to a tab
    LinkEngineSession {
        tab_id: TabId,
        session: EngineSessionHandle,
        observer: Arc<EngineObserver>,
        skip_initial_load: bool,
    },

    UnlinkEngineSession { tab_id: TabId },

    /// Save the session's state, then release the native session
    SuspendEngineSession { tab_id: TabId },

    /// Release the native session and forget its state
    KillEngineSession { tab_id: TabId },

    UpdateEngineSessionState {
        tab_id: TabId,
        state: EngineSessionState,
    },

    /// Navigate the tab, creating its session first if needed
    LoadUrl { tab_id: TabId, url: String },

    TrimMemory { level: MemoryPressure },
}

impl EngineAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateEngineSession { .. } => "create_engine_session",
            Self::LinkEngineSession { .. } => "link_engine_session",
            Self::UnlinkEngineSession { .. } => "unlink_engine_session",
            Self::SuspendEngineSession { .. } => "suspend_engine_session",
            Self::KillEngineSession { .. } => "kill_engine_session",
            Self::UpdateEngineSessionState { .. } => "update_engine_session_state",
            Self::LoadUrl { .. } => "load_url",
            Self::TrimMemory { .. } => "trim_memory",
        }
    }
}

// ─────────────────────────────────────────────────────────
// Content
// ─────────────────────────────────────────────────────────

/// Facts reported by a tab's engine session
#[derive(Debug, Clone, PartialEq)]
pub enum ContentAction {
    /// A new top-level navigation; stale title, search terms and trackers are dropped
    LocationChanged { tab_id: TabId, url: String },

    UpdateTitle { tab_id: TabId, title: String },

    UpdateProgress { tab_id: TabId, progress: u8 },

    UpdateLoadingState { tab_id: TabId, loading: bool },

    /// `None` leaves the corresponding flag untouched
    UpdateNavigationState {
        tab_id: TabId,
        can_go_back: Option<bool>,
        can_go_forward: Option<bool>,
    },

    UpdateSecurityInfo { tab_id: TabId, info: SecurityInfo },

    UpdateSearchTerms { tab_id: TabId, search_terms: String },

    TrackerBlocked { tab_id: TabId, tracker: String },
}

impl ContentAction {
    pub fn tab_id(&self) -> &TabId {
        match self {
            Self::LocationChanged { tab_id, .. }
            | Self::UpdateTitle { tab_id, .. }
            | Self::UpdateProgress { tab_id, .. }
            | Self::UpdateLoadingState { tab_id, .. }
            | Self::UpdateNavigationState { tab_id, .. }
            | Self::UpdateSecurityInfo { tab_id, .. }
            | Self::UpdateSearchTerms { tab_id, .. }
            | Self::TrackerBlocked { tab_id, .. } => tab_id,
        }
    }
}

impl From<RecoverableBrowserState> for TabListAction {
    fn from(state: RecoverableBrowserState) -> Self {
        TabListAction::Restore {
            tabs: state.tabs,
            selected_tab_id: state.selected_tab_id,
        }
    }
}

impl From<TabListAction> for Action {
    fn from(action: TabListAction) -> Self {
        Action::TabList(action)
    }
}

impl From<EngineAction> for Action {
    fn from(action: EngineAction) -> Self {
        Action::Engine(action)
    }
}

impl From<ContentAction> for Action {
    fn from(action: ContentAction) -> Self {
        Action::Content(action)
    }
}

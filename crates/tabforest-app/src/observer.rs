//! Engine observer - translates native session callbacks into store actions
//!
//! One observer is created per engine session and bound to a single tab.
//! It holds no state of its own; every callback becomes a dispatched
//! [`ContentAction`] (or an engine state update) for that tab.

use tabforest_core::prelude::*;
use tabforest_core::{EngineSessionState, SecurityInfo, TabId};
use tabforest_engine::EngineSessionObserver;

use crate::action::{Action, ContentAction, EngineAction};
use crate::store::Dispatcher;

#[derive(Debug, Clone)]
pub struct EngineObserver {
    tab_id: TabId,
    dispatcher: Dispatcher,
}

impl EngineObserver {
    pub fn new(tab_id: TabId, dispatcher: Dispatcher) -> Self {
        Self { tab_id, dispatcher }
    }

    pub fn tab_id(&self) -> &TabId {
        &self.tab_id
    }

    fn send(&self, action: impl Into<Action>) {
        // The store may already be gone while the engine still reports.
        if let Err(e) = self.dispatcher.dispatch(action) {
            debug!("Dropping engine callback for tab {}: {}", self.tab_id, e);
        }
    }
}

impl EngineSessionObserver for EngineObserver {
    fn on_location_change(&self, url: &str) {
        self.send(ContentAction::LocationChanged {
            tab_id: self.tab_id.clone(),
            url: url.to_string(),
        });
    }

    fn on_title_change(&self, title: &str) {
        self.send(ContentAction::UpdateTitle {
            tab_id: self.tab_id.clone(),
            title: title.to_string(),
        });
    }

    fn on_progress(&self, progress: i32) {
        self.send(ContentAction::UpdateProgress {
            tab_id: self.tab_id.clone(),
            progress: progress.clamp(0, 100) as u8,
        });
    }

    fn on_loading_state_change(&self, loading: bool) {
        self.send(ContentAction::UpdateLoadingState {
            tab_id: self.tab_id.clone(),
            loading,
        });
    }

    fn on_navigation_state_change(&self, can_go_back: Option<bool>, can_go_forward: Option<bool>) {
        self.send(ContentAction::UpdateNavigationState {
            tab_id: self.tab_id.clone(),
            can_go_back,
            can_go_forward,
        });
    }

    fn on_security_change(&self, secure: bool, host: Option<String>, issuer: Option<String>) {
        self.send(ContentAction::UpdateSecurityInfo {
            tab_id: self.tab_id.clone(),
            info: SecurityInfo::new(secure, host, issuer),
        });
    }

    fn on_tracker_blocked(&self, tracker: &str) {
        self.send(ContentAction::TrackerBlocked {
            tab_id: self.tab_id.clone(),
            tracker: tracker.to_string(),
        });
    }

    fn on_state_updated(&self, state: EngineSessionState) {
        self.send(EngineAction::UpdateEngineSessionState {
            tab_id: self.tab_id.clone(),
            state,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn observer() -> (EngineObserver, mpsc::UnboundedReceiver<Action>) {
        let (dispatcher, rx) = Dispatcher::channel_for_test();
        (EngineObserver::new(TabId::new("t"), dispatcher), rx)
    }

    fn next_content(rx: &mut mpsc::UnboundedReceiver<Action>) -> ContentAction {
        match rx.try_recv().unwrap() {
            Action::Content(action) => action,
            other => panic!("expected content action, got {:?}", other),
        }
    }

    #[test]
    fn test_location_change_dispatches() {
        let (observer, mut rx) = observer();

        observer.on_location_change("https://example.com");

        assert_eq!(
            next_content(&mut rx),
            ContentAction::LocationChanged {
                tab_id: TabId::new("t"),
                url: "https://example.com".into()
            }
        );
    }

    #[test]
    fn test_progress_clamped_to_percent() {
        let (observer, mut rx) = observer();

        observer.on_progress(-5);
        observer.on_progress(140);

        assert!(matches!(
            next_content(&mut rx),
            ContentAction::UpdateProgress { progress: 0, .. }
        ));
        assert!(matches!(
            next_content(&mut rx),
            ContentAction::UpdateProgress { progress: 100, .. }
        ));
    }

    #[test]
    fn test_security_defaults_missing_values() {
        let (observer, mut rx) = observer();

        observer.on_security_change(true, None, Some("CA".into()));

        match next_content(&mut rx) {
            ContentAction::UpdateSecurityInfo { info, .. } => {
                assert!(info.secure);
                assert_eq!(info.host, "");
                assert_eq!(info.issuer, "CA");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_navigation_state_keeps_unknowns() {
        let (observer, mut rx) = observer();

        observer.on_navigation_state_change(None, Some(true));

        assert_eq!(
            next_content(&mut rx),
            ContentAction::UpdateNavigationState {
                tab_id: TabId::new("t"),
                can_go_back: None,
                can_go_forward: Some(true),
            }
        );
    }

    #[test]
    fn test_state_update_becomes_engine_action() {
        let (observer, mut rx) = observer();
        let state = EngineSessionState::from_json(r#"{"a":1}"#).unwrap();

        observer.on_state_updated(state.clone());

        match rx.try_recv().unwrap() {
            Action::Engine(EngineAction::UpdateEngineSessionState { tab_id, state: got }) => {
                assert_eq!(tab_id, TabId::new("t"));
                assert_eq!(got, state);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_closed_store_is_ignored() {
        let observer = EngineObserver::new(TabId::new("t"), Dispatcher::disconnected());
        observer.on_title_change("nobody listens");
    }
}

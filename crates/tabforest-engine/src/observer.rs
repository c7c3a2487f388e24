//! Callbacks emitted by engine sessions

use std::fmt;

use tabforest_core::EngineSessionState;

/// Receiver of native engine session callbacks.
///
/// Every callback has a default no-op implementation so observers only
/// override what they translate. Callbacks may arrive on any thread.
pub trait EngineSessionObserver: Send + Sync + fmt::Debug {
    /// A new top-level navigation committed to `url`
    fn on_location_change(&self, _url: &str) {}

    fn on_title_change(&self, _title: &str) {}

    /// Load progress in percent
    fn on_progress(&self, _progress: i32) {}

    fn on_loading_state_change(&self, _loading: bool) {}

    /// `None` means the engine does not know, not `false`
    fn on_navigation_state_change(&self, _can_go_back: Option<bool>, _can_go_forward: Option<bool>) {
    }

    fn on_security_change(&self, _secure: bool, _host: Option<String>, _issuer: Option<String>) {}

    fn on_tracker_blocked(&self, _tracker: &str) {}

    /// The engine produced a fresh serialized snapshot of the session
    fn on_state_updated(&self, _state: EngineSessionState) {}
}

//! Test utilities: an in-memory engine that records what it was asked to do

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::value::RawValue;
use tabforest_core::prelude::*;
use tabforest_core::EngineSessionState;

use crate::engine::Engine;
use crate::observer::EngineSessionObserver;
use crate::session::{EngineSession, EngineSessionHandle};

/// Engine double handing out [`FakeEngineSession`]s.
#[derive(Debug, Default)]
pub struct FakeEngine {
    sessions: Mutex<Vec<Arc<FakeEngineSession>>>,
    create_delay: Option<Duration>,
    fail_creation: AtomicBool,
    reject_state: AtomicBool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `create_session` call sleep before returning
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn set_fail_creation(&self, fail: bool) {
        self.fail_creation.store(fail, Ordering::SeqCst);
    }

    /// Make `create_session_state` fail for every blob
    pub fn set_reject_state(&self, reject: bool) {
        self.reject_state.store(reject, Ordering::SeqCst);
    }

    /// Number of sessions created so far
    pub fn created_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn sessions(&self) -> Vec<Arc<FakeEngineSession>> {
        self.sessions.lock().unwrap().clone()
    }

    /// Sessions that have not been closed
    pub fn live_sessions(&self) -> Vec<Arc<FakeEngineSession>> {
        self.sessions()
            .into_iter()
            .filter(|s| !s.is_closed())
            .collect()
    }

    /// Create a session outside of `create_session`, still tracked by this engine
    pub fn detached_session(&self, private: bool) -> Arc<FakeEngineSession> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = Arc::new(FakeEngineSession::new(sessions.len() + 1, private, None));
        sessions.push(session.clone());
        session
    }
}

impl Engine for FakeEngine {
    async fn create_session(
        &self,
        private: bool,
        context_id: Option<String>,
    ) -> Result<EngineSessionHandle> {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_creation.load(Ordering::SeqCst) {
            return Err(Error::engine_session("fake engine refused to create a session"));
        }

        let mut sessions = self.sessions.lock().unwrap();
        let session = Arc::new(FakeEngineSession::new(
            sessions.len() + 1,
            private,
            context_id,
        ));
        sessions.push(session.clone());
        Ok(EngineSessionHandle::from(session))
    }

    fn create_session_state(&self, raw: &RawValue) -> Result<EngineSessionState> {
        if self.reject_state.load(Ordering::SeqCst) {
            return Err(Error::engine_session("fake engine rejected session state"));
        }
        Ok(EngineSessionState::from_raw(raw.to_owned()))
    }
}

/// Session double recording loads, restores and lifecycle calls.
#[derive(Debug)]
pub struct FakeEngineSession {
    pub id: usize,
    pub private: bool,
    pub context_id: Option<String>,
    loaded_urls: Mutex<Vec<String>>,
    restored_state: Mutex<Option<EngineSessionState>>,
    saved_state: Mutex<Option<EngineSessionState>>,
    observers: Mutex<Vec<Arc<dyn EngineSessionObserver>>>,
    closed: AtomicBool,
    close_count: AtomicUsize,
}

impl FakeEngineSession {
    pub fn new(id: usize, private: bool, context_id: Option<String>) -> Self {
        Self {
            id,
            private,
            context_id,
            loaded_urls: Mutex::new(Vec::new()),
            restored_state: Mutex::new(None),
            saved_state: Mutex::new(None),
            observers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            close_count: AtomicUsize::new(0),
        }
    }

    pub fn loaded_urls(&self) -> Vec<String> {
        self.loaded_urls.lock().unwrap().clone()
    }

    pub fn restored_state(&self) -> Option<EngineSessionState> {
        self.restored_state.lock().unwrap().clone()
    }

    /// Set what the next `save_state` call returns
    pub fn set_saved_state(&self, state: Option<EngineSessionState>) {
        *self.saved_state.lock().unwrap() = state;
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    /// Deliver a callback to every registered observer
    pub fn notify_observers(&self, f: impl Fn(&dyn EngineSessionObserver)) {
        let observers = self.observers.lock().unwrap().clone();
        for observer in observers {
            f(observer.as_ref());
        }
    }
}

impl EngineSession for FakeEngineSession {
    fn load_url(&self, url: &str) {
        self.loaded_urls.lock().unwrap().push(url.to_string());
    }

    fn restore_state(&self, state: &EngineSessionState) -> bool {
        *self.restored_state.lock().unwrap() = Some(state.clone());
        true
    }

    fn save_state(&self) -> Option<EngineSessionState> {
        self.saved_state.lock().unwrap().clone()
    }

    fn register(&self, observer: Arc<dyn EngineSessionObserver>) {
        self.observers.lock().unwrap().push(observer);
    }

    fn unregister_observers(&self) {
        self.observers.lock().unwrap().clear();
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build an engine state blob from a JSON literal
pub fn test_state(json: &str) -> EngineSessionState {
    EngineSessionState::from_json(json).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_engine_counts_sessions() {
        let engine = FakeEngine::new();
        let session = engine
            .create_session(false, Some("work".to_string()))
            .await
            .unwrap();
        session.load_url("https://example.com");

        assert_eq!(engine.created_count(), 1);
        let fake = &engine.sessions()[0];
        assert_eq!(fake.context_id.as_deref(), Some("work"));
        assert_eq!(fake.loaded_urls(), vec!["https://example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_fake_engine_failure() {
        let engine = FakeEngine::new();
        engine.set_fail_creation(true);
        let err = engine.create_session(false, None).await.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(engine.created_count(), 0);
    }

    #[tokio::test]
    async fn test_dispose_closes_and_detaches() {
        #[derive(Debug)]
        struct Noop;
        impl EngineSessionObserver for Noop {}

        let engine = FakeEngine::new();
        let handle = engine.create_session(false, None).await.unwrap();
        handle.register(Arc::new(Noop));
        let fake = engine.sessions()[0].clone();
        assert_eq!(fake.observer_count(), 1);

        handle.dispose();

        assert!(fake.is_closed());
        assert_eq!(fake.observer_count(), 0);
    }

    #[test]
    fn test_handles_compare_by_identity() {
        let engine = FakeEngine::new();
        let a = EngineSessionHandle::from(engine.detached_session(false));
        let b = EngineSessionHandle::from(engine.detached_session(false));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_create_session_state_passes_raw_text() {
        let engine = FakeEngine::new();
        let raw = RawValue::from_string(r#"{"entries":[]}"#.to_string()).unwrap();
        let state = engine.create_session_state(&raw).unwrap();
        assert_eq!(state.as_json(), r#"{"entries":[]}"#);

        engine.set_reject_state(true);
        assert!(engine.create_session_state(&raw).is_err());
    }
}

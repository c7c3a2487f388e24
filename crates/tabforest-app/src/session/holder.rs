//! Per-tab engine session holders
//!
//! A holder pairs a tab's live session with the observer registered on it.
//! The pair is stored and released together so callbacks never outlive the
//! session they were attached to.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::MutexGuard as AsyncMutexGuard;

use tabforest_core::{EngineSessionState, TabId};
use tabforest_engine::EngineSessionHandle;

use crate::observer::EngineObserver;

/// Result of [`EngineSessionHolder::link`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The pair is now stored
    Linked,
    /// This exact session was already stored
    AlreadyLinked,
    /// A different session is stored; the offered one was not taken
    Conflict,
    /// The tab was removed; nothing may be stored anymore
    Retired,
    /// The offered session was already taken out of this holder and released
    Released,
}

#[derive(Debug, Default)]
struct Slot {
    session: Option<EngineSessionHandle>,
    observer: Option<Arc<EngineObserver>>,
    state: Option<EngineSessionState>,
    /// Last session handed out by `take`; a late link for it must not revive it
    released: Option<EngineSessionHandle>,
    retired: bool,
}

/// Engine session bookkeeping for one tab.
///
/// `creation` serializes "check absent, then create" across tasks; `slot`
/// guards the stored pair and is never held across an await.
#[derive(Debug, Default)]
pub struct EngineSessionHolder {
    creation: tokio::sync::Mutex<()>,
    slot: Mutex<Slot>,
}

impl EngineSessionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive rights to create this tab's session
    pub async fn lock_creation(&self) -> AsyncMutexGuard<'_, ()> {
        self.creation.lock().await
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn session(&self) -> Option<EngineSessionHandle> {
        self.slot().session.clone()
    }

    pub fn observer(&self) -> Option<Arc<EngineObserver>> {
        self.slot().observer.clone()
    }

    pub fn is_retired(&self) -> bool {
        self.slot().retired
    }

    /// Store a session/observer pair unless another session is already held
    pub fn link(&self, session: &EngineSessionHandle, observer: &Arc<EngineObserver>) -> LinkOutcome {
        let mut slot = self.slot();
        if slot.retired {
            return LinkOutcome::Retired;
        }
        if slot.released.as_ref().is_some_and(|r| r.same_session(session)) {
            return LinkOutcome::Released;
        }
        match &slot.session {
            Some(existing) if existing.same_session(session) => LinkOutcome::AlreadyLinked,
            Some(_) => LinkOutcome::Conflict,
            None => {
                slot.session = Some(session.clone());
                slot.observer = Some(Arc::clone(observer));
                LinkOutcome::Linked
            }
        }
    }

    /// Remove and return the stored pair
    pub fn take(&self) -> Option<(EngineSessionHandle, Option<Arc<EngineObserver>>)> {
        let mut slot = self.slot();
        let observer = slot.observer.take();
        let session = slot.session.take()?;
        slot.released = Some(session.clone());
        Some((session, observer))
    }

    /// Mark the tab as gone and hand back whatever session was held
    pub fn retire(&self) -> Option<EngineSessionHandle> {
        let mut slot = self.slot();
        slot.retired = true;
        slot.observer = None;
        slot.state = None;
        slot.released = None;
        slot.session.take()
    }

    pub fn cached_state(&self) -> Option<EngineSessionState> {
        self.slot().state.clone()
    }

    pub fn set_cached_state(&self, state: Option<EngineSessionState>) {
        self.slot().state = state;
    }

    fn is_idle(&self) -> bool {
        let slot = self.slot();
        slot.session.is_none() && slot.state.is_none()
    }
}

/// All holders, keyed by tab id.
#[derive(Debug, Default)]
pub struct HolderMap {
    inner: Mutex<HashMap<TabId, Arc<EngineSessionHolder>>>,
}

impl HolderMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<TabId, Arc<EngineSessionHolder>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, tab_id: &TabId) -> Option<Arc<EngineSessionHolder>> {
        self.map().get(tab_id).cloned()
    }

    pub fn get_or_insert(&self, tab_id: &TabId) -> Arc<EngineSessionHolder> {
        Arc::clone(self.map().entry(tab_id.clone()).or_default())
    }

    pub fn remove(&self, tab_id: &TabId) -> Option<Arc<EngineSessionHolder>> {
        self.map().remove(tab_id)
    }

    /// Drop the holder if it holds neither a session nor saved state
    pub fn remove_if_idle(&self, tab_id: &TabId) {
        let mut map = self.map();
        if map.get(tab_id).is_some_and(|h| h.is_idle()) {
            map.remove(tab_id);
        }
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.map().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

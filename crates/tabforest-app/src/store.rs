//! Store - owns the browser state and runs the dispatch loop
//!
//! Actions from any source (callers, middleware, engine observers) funnel
//! through one unbounded queue and are processed strictly in order: each
//! action passes the middleware chain, is reduced, the new state is
//! published on a `watch` channel, and `StoreEvent`s are broadcast.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use tabforest_core::prelude::*;
use tabforest_core::TabId;

use crate::action::{Action, TabListAction};
use crate::event::StoreEvent;
use crate::middleware::{Flow, Middleware};
use crate::reducer;
use crate::state::BrowserState;

/// Capacity of the store event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Cloneable handle for dispatching actions and reading the current state.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    action_tx: mpsc::UnboundedSender<Action>,
    state_rx: watch::Receiver<Arc<BrowserState>>,
}

impl Dispatcher {
    /// Queue an action for the store
    pub fn dispatch(&self, action: impl Into<Action>) -> Result<()> {
        let action = action.into();
        let kind = action.kind();
        self.action_tx
            .send(action)
            .map_err(|_| Error::channel_send(format!("store is gone, dropped {}", kind)))
    }

    /// The most recently published state
    pub fn state(&self) -> Arc<BrowserState> {
        Arc::clone(&self.state_rx.borrow())
    }

    /// A receiver notified on every published state
    pub fn watch_state(&self) -> watch::Receiver<Arc<BrowserState>> {
        self.state_rx.clone()
    }

    /// A dispatcher whose store no longer exists
    pub fn disconnected() -> Self {
        let (action_tx, _) = mpsc::unbounded_channel();
        let (_, state_rx) = watch::channel(Arc::new(BrowserState::new()));
        Self {
            action_tx,
            state_rx,
        }
    }

    #[cfg(test)]
    pub(crate) fn channel_for_test() -> (Self, mpsc::UnboundedReceiver<Action>) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (_, state_rx) = watch::channel(Arc::new(BrowserState::new()));
        (
            Self {
                action_tx,
                state_rx,
            },
            action_rx,
        )
    }
}

/// The browser state store.
pub struct Store {
    state: Arc<BrowserState>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    state_tx: watch::Sender<Arc<BrowserState>>,
    /// Kept so `Dispatcher`s can be handed out before anyone subscribes
    state_rx: watch::Receiver<Arc<BrowserState>>,
    event_tx: broadcast::Sender<StoreEvent>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Store {
    pub fn new(initial: BrowserState) -> Self {
        let state = Arc::new(initial);
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(Arc::clone(&state));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            state,
            action_tx,
            action_rx,
            state_tx,
            state_rx,
            event_tx,
            middleware: Vec::new(),
        }
    }

    /// Add middleware to the end of the chain and start it.
    pub fn register_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        if let Err(e) = middleware.on_start(&self.dispatcher()) {
            warn!("Middleware '{}' failed to start: {}", middleware.name(), e);
        }
        self.middleware.push(middleware);
    }

    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            action_tx: self.action_tx.clone(),
            state_rx: self.state_rx.clone(),
        }
    }

    pub fn state(&self) -> &Arc<BrowserState> {
        &self.state
    }

    /// Subscribe to store events.
    ///
    /// If the subscriber falls behind (buffer full), older events are
    /// dropped. Use `broadcast::error::RecvError::Lagged` to detect this.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    /// Process a single action through middleware and reducer.
    pub fn process_action(&mut self, action: Action) {
        let pre = Arc::clone(&self.state);

        for middleware in &self.middleware {
            if middleware.before_reduce(&pre, &action) == Flow::Drop {
                debug!("Action {} dropped by '{}'", action.kind(), middleware.name());
                return;
            }
        }

        let post = reducer::reduce(&pre, &action);
        if !Arc::ptr_eq(&pre, &post) {
            trace!("Action {} produced a new state", action.kind());
            self.state = Arc::clone(&post);
            self.state_tx.send_replace(Arc::clone(&post));
        }

        for middleware in &self.middleware {
            if let Err(e) = middleware.after_reduce(&action, &pre, &post) {
                warn!(
                    "Middleware '{}' failed after {}: {}",
                    middleware.name(),
                    action.kind(),
                    e
                );
            }
        }

        if !Arc::ptr_eq(&pre, &post) {
            self.emit_events(&action, &pre, &post);
        }
    }

    /// Drain and process all queued actions.
    ///
    /// Returns the number of actions processed. Actions dispatched while
    /// draining are processed in the same call.
    pub fn drain_pending_actions(&mut self) -> usize {
        let mut count = 0;
        while let Ok(action) = self.action_rx.try_recv() {
            self.process_action(action);
            count += 1;
        }
        count
    }

    /// Process actions until `shutdown` flips to `true` (or its sender is dropped).
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Store started with {} middleware", self.middleware.len());

        loop {
            tokio::select! {
                Some(action) = self.action_rx.recv() => self.process_action(action),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.shutdown();
    }

    /// Process what is still queued, then stop every middleware.
    pub fn shutdown(&mut self) {
        let drained = self.drain_pending_actions();
        debug!("Store shutting down after draining {} actions", drained);

        self.emit(StoreEvent::Shutdown);

        for middleware in &self.middleware {
            if let Err(e) = middleware.on_shutdown() {
                warn!("Middleware '{}' failed to shut down: {}", middleware.name(), e);
            }
        }
    }

    fn emit_events(&self, action: &Action, pre: &BrowserState, post: &BrowserState) {
        let pre_ids: HashSet<&TabId> = pre.tabs.iter().map(|t| &t.id).collect();
        let post_ids: HashSet<&TabId> = post.tabs.iter().map(|t| &t.id).collect();

        if let Action::TabList(TabListAction::Restore { .. }) = action {
            let count = post_ids.difference(&pre_ids).count();
            self.emit(StoreEvent::Restored { count });
        } else {
            for tab in post.tabs.iter().filter(|t| !pre_ids.contains(&t.id)) {
                self.emit(StoreEvent::TabAdded {
                    tab_id: tab.id.clone(),
                });
            }
        }

        for tab in pre.tabs.iter().filter(|t| !post_ids.contains(&t.id)) {
            self.emit(StoreEvent::TabRemoved {
                tab_id: tab.id.clone(),
            });
        }

        if pre.selected_tab_id != post.selected_tab_id {
            self.emit(StoreEvent::SelectionChanged {
                previous: pre.selected_tab_id.clone(),
                current: post.selected_tab_id.clone(),
            });
        }

        for tab in &post.tabs {
            let before = pre.find_tab(&tab.id).and_then(|t| t.engine.session.as_ref());
            let after = tab.engine.session.as_ref();
            match (before, after) {
                (None, Some(_)) => self.emit(StoreEvent::EngineSessionLinked {
                    tab_id: tab.id.clone(),
                }),
                (Some(_), None) => self.emit(StoreEvent::EngineSessionUnlinked {
                    tab_id: tab.id.clone(),
                }),
                (Some(old), Some(new)) if old != new => self.emit(StoreEvent::EngineSessionLinked {
                    tab_id: tab.id.clone(),
                }),
                _ => {}
            }
        }
    }

    /// send() returns Err only if there are no receivers, which is fine.
    fn emit(&self, event: StoreEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("tabs", &self.state.tabs.len())
            .field("selected_tab_id", &self.state.selected_tab_id)
            .field("middleware", &self.middleware)
            .finish()
    }
}

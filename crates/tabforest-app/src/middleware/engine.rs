//! Engine linking middleware
//!
//! Keeps at most one live engine session per tab, in step with the store:
//! - sessions are created lazily on a single worker task, one job at a time
//! - a `LinkEngineSession` for a tab that already holds another session is
//!   swallowed and the extra session disposed
//! - sessions of removed tabs are disposed, including ones still being
//!   created when the tab went away
//! - suspension under memory pressure saves state so the tab can be
//!   recreated without reloading

use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tabforest_core::prelude::*;
use tabforest_core::{MemoryPressure, TabId};
use tabforest_engine::{Engine, EngineSessionHandle};

use super::{Flow, Middleware};
use crate::action::{Action, EngineAction, TabListAction};
use crate::config::EngineSettings;
use crate::observer::EngineObserver;
use crate::session::{HolderMap, LinkOutcome, SessionLookup, StoreSessionLookup};
use crate::state::{BrowserState, TabRecord};
use crate::store::Dispatcher;

/// Work executed in order on the middleware's worker task
#[derive(Debug)]
enum Job {
    Create { tab_id: TabId },
    LoadUrl { tab_id: TabId, url: String },
}

struct Inner<E> {
    engine: Arc<E>,
    holders: HolderMap,
    settings: EngineSettings,
    dispatcher: OnceLock<Dispatcher>,
    lookup: OnceLock<Arc<dyn SessionLookup>>,
}

pub struct EngineMiddleware<E> {
    inner: Arc<Inner<E>>,
    jobs_tx: mpsc::UnboundedSender<Job>,
    jobs_rx: Mutex<Option<mpsc::UnboundedReceiver<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<E> EngineMiddleware<E>
where
    E: Engine + Send + Sync + 'static,
{
    pub fn new(engine: Arc<E>, settings: EngineSettings) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                engine,
                holders: HolderMap::new(),
                settings,
                dispatcher: OnceLock::new(),
                lookup: OnceLock::new(),
            }),
            jobs_tx,
            jobs_rx: Mutex::new(Some(jobs_rx)),
            worker: Mutex::new(None),
        }
    }

    /// Use `lookup` instead of the store-backed default
    pub fn with_lookup(self, lookup: Arc<dyn SessionLookup>) -> Self {
        if self.inner.lookup.set(lookup).is_err() {
            warn!("Session lookup already set, keeping the first one");
        }
        self
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.inner.engine
    }

    pub fn holders(&self) -> &HolderMap {
        &self.inner.holders
    }

    /// The session currently held for `tab_id`
    pub fn session(&self, tab_id: &TabId) -> Option<EngineSessionHandle> {
        self.inner.holders.get(tab_id).and_then(|h| h.session())
    }

    /// Return the tab's session, creating and linking one if needed.
    ///
    /// `None` when the tab (or its logical session) is gone or the engine
    /// failed; both are logged, never raised.
    pub async fn get_or_create_engine_session(&self, tab_id: &TabId) -> Option<EngineSessionHandle> {
        self.inner.get_or_create(tab_id, false).await
    }

    fn enqueue(&self, job: Job) {
        if self.jobs_tx.send(job).is_err() {
            warn!("Engine worker is gone, dropping job");
        }
    }

    fn dispatcher(&self) -> Result<&Dispatcher> {
        self.inner.dispatcher.get().ok_or(Error::ChannelClosed)
    }

    fn after_engine_action(
        &self,
        action: &EngineAction,
        pre: &BrowserState,
        post: &BrowserState,
    ) -> Result<()> {
        match action {
            EngineAction::CreateEngineSession { tab_id } => {
                self.enqueue(Job::Create {
                    tab_id: tab_id.clone(),
                });
            }
            EngineAction::LoadUrl { tab_id, url } => {
                self.enqueue(Job::LoadUrl {
                    tab_id: tab_id.clone(),
                    url: url.clone(),
                });
            }
            EngineAction::LinkEngineSession {
                tab_id,
                session,
                skip_initial_load,
                ..
            } => {
                let held = self.session(tab_id).as_ref() == Some(session);
                let linked = post
                    .find_tab(tab_id)
                    .filter(|t| held && t.engine.session.as_ref() == Some(session));
                if let Some(tab) = linked {
                    if !*skip_initial_load && !tab.content.url.is_empty() {
                        trace!("Initial load of {} in tab {}", tab.content.url, tab_id);
                        session.load_url(&tab.content.url);
                    }
                }
            }
            EngineAction::UnlinkEngineSession { tab_id } => {
                // Only release the session this unlink was about; the holder
                // may already carry a newer one waiting for its link.
                let unlinked = pre.find_tab(tab_id).and_then(|t| t.engine.session.as_ref());
                if let (Some(unlinked), Some(holder)) = (unlinked, self.inner.holders.get(tab_id)) {
                    if holder.session().as_ref() == Some(unlinked) {
                        if let Some((session, _)) = holder.take() {
                            session.dispose();
                        }
                    }
                }
            }
            EngineAction::SuspendEngineSession { tab_id } => self.suspend(tab_id)?,
            EngineAction::KillEngineSession { tab_id } => {
                if let Some(holder) = self.inner.holders.get(tab_id) {
                    if let Some((session, _)) = holder.take() {
                        session.dispose();
                    }
                    holder.set_cached_state(None);
                }
                self.dispatcher()?.dispatch(EngineAction::UnlinkEngineSession {
                    tab_id: tab_id.clone(),
                })?;
            }
            EngineAction::UpdateEngineSessionState { tab_id, state } => {
                if let Some(holder) = self.inner.holders.get(tab_id) {
                    holder.set_cached_state(Some(state.clone()));
                }
            }
            EngineAction::TrimMemory { level } => self.trim_memory(*level, post)?,
        }
        Ok(())
    }

    /// Save the tab's session state, release the session and unlink it
    fn suspend(&self, tab_id: &TabId) -> Result<()> {
        let Some(holder) = self.inner.holders.get(tab_id) else {
            return Ok(());
        };
        let Some((session, _)) = holder.take() else {
            return Ok(());
        };

        let saved = session.save_state().or_else(|| holder.cached_state());
        session.dispose();
        holder.set_cached_state(saved.clone());
        debug!("Suspended engine session of tab {}", tab_id);

        let dispatcher = self.dispatcher()?;
        if let Some(state) = saved {
            dispatcher.dispatch(EngineAction::UpdateEngineSessionState {
                tab_id: tab_id.clone(),
                state,
            })?;
        }
        dispatcher.dispatch(EngineAction::UnlinkEngineSession {
            tab_id: tab_id.clone(),
        })
    }

    fn trim_memory(&self, level: MemoryPressure, state: &BrowserState) -> Result<()> {
        let selected = state.selected_tab_id.as_ref();
        let mut background: Vec<&TabRecord> = state
            .linked_tabs()
            .filter(|t| Some(&t.id) != selected)
            .collect();

        let victims: Vec<TabId> = match level {
            MemoryPressure::Critical => background.iter().map(|t| t.id.clone()).collect(),
            MemoryPressure::Moderate => {
                let live = state.linked_tabs().count();
                let excess = live.saturating_sub(self.inner.settings.max_live_sessions);
                background.sort_by_key(|t| t.last_access);
                background.iter().take(excess).map(|t| t.id.clone()).collect()
            }
        };

        info!(
            "Trimming memory ({:?}): suspending {} engine sessions",
            level,
            victims.len()
        );

        let dispatcher = self.dispatcher()?;
        for tab_id in victims {
            dispatcher.dispatch(EngineAction::SuspendEngineSession { tab_id })?;
        }
        Ok(())
    }

    /// Retire and dispose the holders of every tab that left the forest
    fn release_removed_tabs(&self, pre: &BrowserState, post: &BrowserState) {
        for tab in pre.tabs.iter().filter(|t| !post.contains(&t.id)) {
            if let Some(holder) = self.inner.holders.remove(&tab.id) {
                if let Some(session) = holder.retire() {
                    debug!("Disposing engine session of removed tab {}", tab.id);
                    session.dispose();
                }
            }
        }
    }
}

impl<E> Inner<E>
where
    E: Engine + Send + Sync + 'static,
{
    async fn get_or_create(&self, tab_id: &TabId, navigating: bool) -> Option<EngineSessionHandle> {
        match self.try_get_or_create(tab_id, navigating).await {
            Ok(session) => Some(session),
            Err(e @ Error::NotFound { .. }) => {
                warn!("No engine session for tab {}: {}", tab_id, e);
                self.holders.remove_if_idle(tab_id);
                None
            }
            Err(e) => {
                error!("Failed to create engine session for tab {}: {}", tab_id, e);
                self.holders.remove_if_idle(tab_id);
                None
            }
        }
    }

    async fn try_get_or_create(&self, tab_id: &TabId, navigating: bool) -> Result<EngineSessionHandle> {
        let dispatcher = self.dispatcher.get().ok_or(Error::ChannelClosed)?;
        let holder = self.holders.get_or_insert(tab_id);
        let _creation = holder.lock_creation().await;

        if let Some(session) = holder.session() {
            return Ok(session);
        }

        let state = dispatcher.state();
        let tab = state
            .find_tab(tab_id)
            .ok_or_else(|| Error::not_found(tab_id.as_str()))?;
        let target = self
            .lookup
            .get()
            .and_then(|lookup| lookup.lookup(tab_id))
            .ok_or_else(|| Error::not_found(tab_id.as_str()))?;

        let session = self
            .engine
            .create_session(tab.is_private(), tab.context_id.clone())
            .await?;
        let observer = Arc::new(EngineObserver::new(tab_id.clone(), target));
        session.register(observer.clone());

        // Restore before any navigation so the saved history survives.
        let saved = holder
            .cached_state()
            .or_else(|| tab.engine.session_state.clone());
        let restored = match &saved {
            Some(saved) => {
                let ok = session.restore_state(saved);
                if !ok {
                    warn!("Engine could not restore saved state of tab {}", tab_id);
                }
                ok
            }
            None => false,
        };

        if !dispatcher.state().contains(tab_id) {
            debug!("Tab {} removed during session creation, disposing", tab_id);
            session.dispose();
            return Err(Error::not_found(tab_id.as_str()));
        }

        match holder.link(&session, &observer) {
            LinkOutcome::Linked => {}
            LinkOutcome::AlreadyLinked => return Ok(session),
            LinkOutcome::Conflict => {
                session.dispose();
                return holder
                    .session()
                    .ok_or_else(|| Error::engine_session("holder emptied during creation"));
            }
            LinkOutcome::Retired | LinkOutcome::Released => {
                debug!("Tab {} retired during session creation, disposing", tab_id);
                session.dispose();
                return Err(Error::not_found(tab_id.as_str()));
            }
        }

        info!("Created engine session for tab {}", tab_id);
        let link = EngineAction::LinkEngineSession {
            tab_id: tab_id.clone(),
            session: session.clone(),
            observer,
            skip_initial_load: restored || navigating,
        };
        if let Err(e) = dispatcher.dispatch(link) {
            if let Some((orphan, _)) = holder.take() {
                orphan.dispose();
            }
            return Err(e);
        }

        Ok(session)
    }
}

async fn run_worker<E>(inner: Arc<Inner<E>>, mut jobs: mpsc::UnboundedReceiver<Job>)
where
    E: Engine + Send + Sync + 'static,
{
    while let Some(job) = jobs.recv().await {
        match job {
            Job::Create { tab_id } => {
                inner.get_or_create(&tab_id, false).await;
            }
            Job::LoadUrl { tab_id, url } => {
                if let Some(session) = inner.get_or_create(&tab_id, true).await {
                    debug!("Loading {} in tab {}", url, tab_id);
                    session.load_url(&url);
                }
            }
        }
    }
    debug!("Engine worker stopped");
}

impl<E> Middleware for EngineMiddleware<E>
where
    E: Engine + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "engine"
    }

    fn on_start(&self, dispatcher: &Dispatcher) -> Result<()> {
        if self.inner.dispatcher.set(dispatcher.clone()).is_err() {
            return Err(Error::config("engine middleware registered twice"));
        }
        // Keeps a lookup injected through `with_lookup`.
        let _ = self
            .inner
            .lookup
            .set(Arc::new(StoreSessionLookup::new(dispatcher.clone())));

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::config("engine middleware needs a tokio runtime"))?;
        let jobs = self
            .jobs_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(jobs) = jobs {
            let handle = runtime.spawn(run_worker(Arc::clone(&self.inner), jobs));
            *self.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        }
        Ok(())
    }

    fn before_reduce(&self, state: &BrowserState, action: &Action) -> Flow {
        let Action::Engine(EngineAction::LinkEngineSession {
            tab_id,
            session,
            observer,
            ..
        }) = action
        else {
            return Flow::Continue;
        };

        if !state.contains(tab_id) {
            debug!("Dropping link for unknown tab {}", tab_id);
            session.dispose();
            return Flow::Drop;
        }

        match self.inner.holders.get_or_insert(tab_id).link(session, observer) {
            LinkOutcome::Linked | LinkOutcome::AlreadyLinked => Flow::Continue,
            LinkOutcome::Conflict => {
                debug!("Tab {} already has an engine session, disposing duplicate", tab_id);
                session.dispose();
                Flow::Drop
            }
            LinkOutcome::Retired => {
                session.dispose();
                Flow::Drop
            }
            LinkOutcome::Released => {
                debug!("Dropping link of released engine session for tab {}", tab_id);
                session.dispose();
                Flow::Drop
            }
        }
    }

    fn after_reduce(&self, action: &Action, pre: &BrowserState, post: &BrowserState) -> Result<()> {
        match action {
            Action::Engine(action) => self.after_engine_action(action, pre, post),
            Action::TabList(action) => {
                self.release_removed_tabs(pre, post);

                let selection_changed = pre.selected_tab_id != post.selected_tab_id;
                let restored = matches!(action, TabListAction::Restore { .. });
                if self.inner.settings.create_session_on_select && (selection_changed || restored) {
                    if let Some(tab) = post.selected_tab().filter(|t| !t.engine.is_linked()) {
                        self.enqueue(Job::Create {
                            tab_id: tab.id.clone(),
                        });
                    }
                }
                Ok(())
            }
            Action::Content(_) => Ok(()),
        }
    }

    fn on_shutdown(&self) -> Result<()> {
        if let Some(worker) = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take() {
            worker.abort();
        }
        for tab_id in self.inner.holders.tab_ids() {
            if let Some(session) = self.inner.holders.remove(&tab_id).and_then(|h| h.retire()) {
                session.dispose();
            }
        }
        Ok(())
    }
}

impl<E> std::fmt::Debug for EngineMiddleware<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineMiddleware")
            .field("holders", &self.inner.holders)
            .field("settings", &self.inner.settings)
            .field("started", &self.inner.dispatcher.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use std::time::Duration;
    use tabforest_core::EngineSessionState;
    use tabforest_engine::test_utils::{test_state, FakeEngine};

    fn id(s: &str) -> TabId {
        TabId::new(s)
    }

    fn add(tab: &str, select: bool) -> Action {
        TabListAction::AddTab {
            tab: TabRecord::with_id(tab, format!("https://{}.test", tab)),
            select,
        }
        .into()
    }

    fn setup_with(
        engine: FakeEngine,
        settings: EngineSettings,
    ) -> (Store, Arc<EngineMiddleware<FakeEngine>>, Arc<FakeEngine>) {
        let engine = Arc::new(engine);
        let middleware = Arc::new(EngineMiddleware::new(engine.clone(), settings));
        let mut store = Store::new(BrowserState::new());
        store.register_middleware(middleware.clone());
        (store, middleware, engine)
    }

    fn setup() -> (Store, Arc<EngineMiddleware<FakeEngine>>, Arc<FakeEngine>) {
        setup_with(FakeEngine::new(), EngineSettings::default())
    }

    fn manual() -> EngineSettings {
        EngineSettings {
            create_session_on_select: false,
            ..EngineSettings::default()
        }
    }

    /// Let the worker run and feed everything it dispatched back through the store
    async fn settle(store: &mut Store) {
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(2)).await;
            store.drain_pending_actions();
        }
    }

    #[tokio::test]
    async fn test_selecting_tab_creates_and_links_session() {
        let (mut store, middleware, engine) = setup();

        store.process_action(add("a", true));
        settle(&mut store).await;

        assert_eq!(engine.created_count(), 1);
        let tab = store.state().find_tab(&id("a")).unwrap().clone();
        assert_eq!(tab.engine.session, middleware.session(&id("a")));
        assert_eq!(engine.sessions()[0].loaded_urls(), vec!["https://a.test"]);
        assert_eq!(engine.sessions()[0].observer_count(), 1);
    }

    #[tokio::test]
    async fn test_no_creation_when_disabled() {
        let (mut store, _middleware, engine) = setup_with(FakeEngine::new(), manual());

        store.process_action(add("a", true));
        settle(&mut store).await;

        assert_eq!(engine.created_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_yields_one_session() {
        let (mut store, middleware, engine) =
            setup_with(FakeEngine::new().with_create_delay(Duration::from_millis(20)), manual());
        store.process_action(add("a", true));

        let tab_id = id("a");
        let (first, second) = tokio::join!(
            middleware.get_or_create_engine_session(&tab_id),
            middleware.get_or_create_engine_session(&tab_id),
        );

        assert_eq!(engine.created_count(), 1);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_link_is_disposed() {
        let (mut store, middleware, engine) = setup_with(FakeEngine::new(), manual());
        store.process_action(add("a", true));
        let first = middleware
            .get_or_create_engine_session(&id("a"))
            .await
            .unwrap();
        store.drain_pending_actions();

        let extra = engine.detached_session(false);
        store.process_action(
            EngineAction::LinkEngineSession {
                tab_id: id("a"),
                session: EngineSessionHandle::from(extra.clone()),
                observer: Arc::new(EngineObserver::new(id("a"), store.dispatcher())),
                skip_initial_load: false,
            }
            .into(),
        );

        assert!(extra.is_closed());
        assert_eq!(
            store.state().find_tab(&id("a")).unwrap().engine.session,
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_suspend_before_link_lands_never_navigates_closed_session() {
        let (mut store, middleware, engine) = setup_with(FakeEngine::new(), manual());
        store.process_action(add("a", true));
        middleware
            .get_or_create_engine_session(&id("a"))
            .await
            .unwrap();

        // The link is still queued when the suspend is processed.
        store.process_action(EngineAction::SuspendEngineSession { tab_id: id("a") }.into());
        store.drain_pending_actions();

        let session = engine.sessions()[0].clone();
        assert!(session.is_closed());
        assert!(session.loaded_urls().is_empty());
        assert!(!store.state().find_tab(&id("a")).unwrap().engine.is_linked());
        assert!(middleware.session(&id("a")).is_none());
    }

    #[tokio::test]
    async fn test_link_for_unknown_tab_is_disposed() {
        let (mut store, _middleware, engine) = setup_with(FakeEngine::new(), manual());
        let stray = engine.detached_session(false);

        store.process_action(
            EngineAction::LinkEngineSession {
                tab_id: id("ghost"),
                session: EngineSessionHandle::from(stray.clone()),
                observer: Arc::new(EngineObserver::new(id("ghost"), store.dispatcher())),
                skip_initial_load: false,
            }
            .into(),
        );

        assert!(stray.is_closed());
        assert!(store.state().tabs.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tab_yields_none() {
        let (_store, middleware, engine) = setup_with(FakeEngine::new(), manual());

        assert!(middleware.get_or_create_engine_session(&id("nope")).await.is_none());
        assert_eq!(engine.created_count(), 0);
        assert!(middleware.holders().is_empty());
    }

    #[tokio::test]
    async fn test_missing_logical_session_yields_none() {
        #[derive(Debug)]
        struct NoSessions;
        impl SessionLookup for NoSessions {
            fn lookup(&self, _tab_id: &TabId) -> Option<Dispatcher> {
                None
            }
        }

        let engine = Arc::new(FakeEngine::new());
        let middleware =
            Arc::new(EngineMiddleware::new(engine.clone(), manual()).with_lookup(Arc::new(NoSessions)));
        let mut store = Store::new(BrowserState::new());
        store.register_middleware(middleware.clone());
        store.process_action(add("a", true));

        assert!(middleware.get_or_create_engine_session(&id("a")).await.is_none());
        assert_eq!(engine.created_count(), 0);
    }

    #[tokio::test]
    async fn test_creation_failure_is_not_fatal() {
        let (mut store, middleware, engine) = setup_with(FakeEngine::new(), manual());
        engine.set_fail_creation(true);
        store.process_action(add("a", true));

        assert!(middleware.get_or_create_engine_session(&id("a")).await.is_none());

        engine.set_fail_creation(false);
        assert!(middleware.get_or_create_engine_session(&id("a")).await.is_some());
    }

    #[tokio::test]
    async fn test_removing_tab_disposes_session() {
        let (mut store, _middleware, engine) = setup();
        store.process_action(add("a", true));
        settle(&mut store).await;

        store.process_action(
            TabListAction::RemoveTab {
                tab_id: id("a"),
                select_parent_if_exists: false,
            }
            .into(),
        );

        assert!(engine.sessions()[0].is_closed());
        assert!(engine.live_sessions().is_empty());
    }

    #[tokio::test]
    async fn test_tab_removed_during_creation_disposes_orphan() {
        let (mut store, middleware, engine) =
            setup_with(FakeEngine::new().with_create_delay(Duration::from_millis(30)), manual());
        store.process_action(add("a", true));

        let pending = {
            let middleware = middleware.clone();
            tokio::spawn(async move { middleware.get_or_create_engine_session(&id("a")).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.process_action(TabListAction::RemoveAllTabs.into());

        assert!(pending.await.unwrap().is_none());
        settle(&mut store).await;
        assert_eq!(engine.created_count(), 1);
        assert!(engine.live_sessions().is_empty());
        assert!(store.state().tabs.is_empty());
    }

    #[tokio::test]
    async fn test_suspend_saves_state_and_restore_skips_initial_load() {
        let (mut store, _middleware, engine) = setup();
        store.process_action(add("a", true));
        settle(&mut store).await;

        let first = engine.sessions()[0].clone();
        first.set_saved_state(Some(test_state(r#"{"history":["https://a.test"]}"#)));

        store.process_action(EngineAction::SuspendEngineSession { tab_id: id("a") }.into());
        settle(&mut store).await;

        assert!(first.is_closed());
        let tab = store.state().find_tab(&id("a")).unwrap().clone();
        assert!(tab.engine.session.is_none());
        assert_eq!(
            tab.engine.session_state,
            Some(test_state(r#"{"history":["https://a.test"]}"#))
        );

        store.process_action(EngineAction::CreateEngineSession { tab_id: id("a") }.into());
        settle(&mut store).await;

        let second = engine.sessions()[1].clone();
        assert_eq!(
            second.restored_state(),
            Some(test_state(r#"{"history":["https://a.test"]}"#))
        );
        assert!(second.loaded_urls().is_empty());
        assert!(store.state().find_tab(&id("a")).unwrap().engine.skip_initial_load);
    }

    #[tokio::test]
    async fn test_kill_forgets_state() {
        let (mut store, _middleware, engine) = setup();
        store.process_action(add("a", true));
        settle(&mut store).await;
        store.process_action(
            EngineAction::UpdateEngineSessionState {
                tab_id: id("a"),
                state: EngineSessionState::from_json(r#"{"x":1}"#).unwrap(),
            }
            .into(),
        );

        store.process_action(EngineAction::KillEngineSession { tab_id: id("a") }.into());
        settle(&mut store).await;

        assert!(engine.sessions()[0].is_closed());
        let tab = store.state().find_tab(&id("a")).unwrap().clone();
        assert!(tab.engine.session.is_none());
        assert!(tab.engine.session_state.is_none());
    }

    #[tokio::test]
    async fn test_load_url_creates_session_and_navigates_once() {
        let (mut store, _middleware, engine) = setup_with(FakeEngine::new(), manual());
        store.process_action(add("a", true));

        store.process_action(
            EngineAction::LoadUrl {
                tab_id: id("a"),
                url: "https://elsewhere.test".into(),
            }
            .into(),
        );
        settle(&mut store).await;

        assert_eq!(engine.created_count(), 1);
        assert_eq!(
            engine.sessions()[0].loaded_urls(),
            vec!["https://elsewhere.test"]
        );
    }

    #[tokio::test]
    async fn test_trim_memory_critical_keeps_selected() {
        let (mut store, middleware, engine) = setup_with(FakeEngine::new(), manual());
        for tab in ["a", "b", "c"] {
            store.process_action(add(tab, false));
            middleware.get_or_create_engine_session(&id(tab)).await.unwrap();
        }
        store.drain_pending_actions();
        assert_eq!(store.state().linked_tabs().count(), 3);

        store.process_action(
            EngineAction::TrimMemory {
                level: MemoryPressure::Critical,
            }
            .into(),
        );
        settle(&mut store).await;

        let linked: Vec<&str> = store.state().linked_tabs().map(|t| t.id.as_str()).collect();
        assert_eq!(linked, vec!["a"]);
        assert_eq!(engine.live_sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_trim_memory_moderate_suspends_least_recent() {
        let settings = EngineSettings {
            max_live_sessions: 2,
            create_session_on_select: false,
        };
        let (mut store, middleware, _engine) = setup_with(FakeEngine::new(), settings);
        for (tab, last_access) in [("a", 10), ("b", 1), ("c", 5)] {
            store.process_action(add(tab, false));
            store.process_action(
                TabListAction::UpdateLastAccess {
                    tab_id: id(tab),
                    last_access,
                }
                .into(),
            );
            middleware.get_or_create_engine_session(&id(tab)).await.unwrap();
        }
        store.drain_pending_actions();

        store.process_action(
            EngineAction::TrimMemory {
                level: MemoryPressure::Moderate,
            }
            .into(),
        );
        settle(&mut store).await;

        let linked: Vec<&str> = store.state().linked_tabs().map(|t| t.id.as_str()).collect();
        assert_eq!(linked, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_shutdown_disposes_everything() {
        let (mut store, _middleware, engine) = setup();
        store.process_action(add("a", true));
        settle(&mut store).await;

        store.shutdown();

        assert!(engine.live_sessions().is_empty());
    }
}

//! Debounced snapshot saving driven by the store's published state

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use tabforest_core::prelude::*;

use super::session_storage::SessionStorage;
use crate::config::StorageSettings;
use crate::state::BrowserState;
use crate::store::Dispatcher;

/// Saves the browser state a fixed delay after it changes.
///
/// Changes arriving while a save is pending are folded into it: the save
/// always writes the state current at the time it fires.
#[derive(Debug, Clone)]
pub struct AutoSave {
    storage: Arc<SessionStorage>,
    state_rx: watch::Receiver<Arc<BrowserState>>,
    saving: Arc<AtomicBool>,
    interval: Duration,
}

impl AutoSave {
    pub fn new(storage: SessionStorage, dispatcher: &Dispatcher, interval: Duration) -> Self {
        Self {
            storage: Arc::new(storage),
            state_rx: dispatcher.watch_state(),
            saving: Arc::new(AtomicBool::new(false)),
            interval,
        }
    }

    /// Auto-saver for `storage`, debounced by the configured interval
    pub fn with_settings(
        storage: SessionStorage,
        dispatcher: &Dispatcher,
        settings: &StorageSettings,
    ) -> Self {
        Self::new(storage, dispatcher, settings.autosave_interval())
    }

    /// Watch the store and schedule a save after every change.
    ///
    /// The task ends when the store goes away; abort it to stop earlier.
    pub fn start(&self) -> JoinHandle<()> {
        let autosave = self.clone();
        let mut state_rx = self.state_rx.clone();
        tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                autosave.schedule_save();
            }
            debug!("Store closed, autosave stopped");
        })
    }

    /// Schedule a save (debounced)
    ///
    /// Skips scheduling if a save is already pending or running; that save
    /// picks up the newer state.
    pub fn schedule_save(&self) {
        if self
            .saving
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            trace!("Snapshot save already pending");
            return;
        }

        let storage = self.storage.clone();
        let state_rx = self.state_rx.clone();
        let saving = self.saving.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let state = Arc::clone(&state_rx.borrow());
                let snapshot = Arc::clone(&state);
                let storage = storage.clone();
                match tokio::task::spawn_blocking(move || storage.save(&snapshot)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!("Failed to auto-save browser state: {}", e),
                    Err(e) => error!("Auto-save task panicked: {}", e),
                }

                saving.store(false, Ordering::SeqCst);

                // Something changed during the write and nobody rescheduled.
                let stale = !Arc::ptr_eq(&state, &state_rx.borrow());
                if !stale
                    || saving
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_err()
                {
                    break;
                }
            }
        });
    }

    /// Immediately save (bypass debounce)
    pub fn save_now(&self) -> Result<()> {
        let state = Arc::clone(&self.state_rx.borrow());
        self.storage.save(&state)
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::TabListAction;
    use crate::state::TabRecord;
    use crate::storage::ReadOptions;
    use crate::store::Store;
    use tabforest_engine::test_utils::FakeEngine;
    use tempfile::tempdir;

    fn add(store: &mut Store, id: &str) {
        store.process_action(
            TabListAction::AddTab {
                tab: TabRecord::with_id(id, format!("https://{}.test", id)),
                select: true,
            }
            .into(),
        );
    }

    async fn wait_until_idle(autosave: &AutoSave) {
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if !autosave.is_saving() {
                return;
            }
        }
        panic!("autosave never finished");
    }

    #[tokio::test]
    async fn test_changes_are_saved_after_debounce() {
        let dir = tempdir().unwrap();
        let mut store = Store::new(BrowserState::new());
        let settings = StorageSettings {
            autosave_interval_ms: 10,
            ..StorageSettings::default()
        };
        let storage = SessionStorage::new(dir.path(), &settings);
        let autosave = AutoSave::with_settings(storage, &store.dispatcher(), &settings);
        let task = autosave.start();

        add(&mut store, "a");
        add(&mut store, "b");
        tokio::time::sleep(Duration::from_millis(5)).await;
        wait_until_idle(&autosave).await;

        let restored = autosave
            .storage()
            .restore(&FakeEngine::new(), &ReadOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(restored.tabs.len(), 2);
        task.abort();
    }

    #[tokio::test]
    async fn test_schedule_while_pending_is_skipped() {
        let dir = tempdir().unwrap();
        let store = Store::new(BrowserState::new());
        let storage = SessionStorage::new(dir.path(), &StorageSettings::default());
        let autosave = AutoSave::new(storage, &store.dispatcher(), Duration::from_millis(50));

        autosave.schedule_save();
        assert!(autosave.is_saving());
        autosave.schedule_save();

        wait_until_idle(&autosave).await;
        assert!(autosave.storage().path().exists());
    }

    #[tokio::test]
    async fn test_save_now() {
        let dir = tempdir().unwrap();
        let mut store = Store::new(BrowserState::new());
        let storage = SessionStorage::new(dir.path(), &StorageSettings::default());
        let autosave = AutoSave::new(storage, &store.dispatcher(), Duration::from_secs(60));
        add(&mut store, "a");

        autosave.save_now().unwrap();

        let restored = autosave
            .storage()
            .restore(&FakeEngine::new(), &ReadOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(restored.tabs[0].id.as_str(), "a");
    }
}

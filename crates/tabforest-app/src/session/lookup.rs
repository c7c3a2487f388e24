//! Resolving where a tab's engine callbacks should be delivered

use std::fmt;

use tabforest_core::TabId;

use crate::store::Dispatcher;

/// Side table the engine middleware consults before creating a session.
///
/// It may lag behind the store; `None` means the tab's logical session is
/// gone and no engine session should be created for it.
pub trait SessionLookup: Send + Sync + fmt::Debug {
    fn lookup(&self, tab_id: &TabId) -> Option<Dispatcher>;
}

/// Lookup backed by the store itself: a tab has a logical session while it
/// is part of the published state.
#[derive(Debug, Clone)]
pub struct StoreSessionLookup {
    dispatcher: Dispatcher,
}

impl StoreSessionLookup {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

impl SessionLookup for StoreSessionLookup {
    fn lookup(&self, tab_id: &TabId) -> Option<Dispatcher> {
        self.dispatcher
            .state()
            .contains(tab_id)
            .then(|| self.dispatcher.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::TabListAction;
    use crate::state::{BrowserState, TabRecord};
    use crate::store::Store;

    #[tokio::test]
    async fn test_store_lookup_follows_state() {
        let mut store = Store::new(BrowserState::new());
        let lookup = StoreSessionLookup::new(store.dispatcher());
        let id = TabId::new("a");
        assert!(lookup.lookup(&id).is_none());

        store.process_action(
            TabListAction::AddTab {
                tab: TabRecord::with_id("a", "https://a.test"),
                select: true,
            }
            .into(),
        );

        assert!(lookup.lookup(&id).is_some());
    }
}

//! Stamps the selected tab with the time it was selected

use std::sync::OnceLock;

use tabforest_core::now_millis;
use tabforest_core::prelude::*;

use super::Middleware;
use crate::action::{Action, TabListAction};
use crate::state::BrowserState;
use crate::store::Dispatcher;

/// Dispatches `UpdateLastAccess` whenever the selection moves, so the
/// reducer itself never reads the clock.
#[derive(Debug, Default)]
pub struct LastAccessMiddleware {
    dispatcher: OnceLock<Dispatcher>,
}

impl LastAccessMiddleware {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Middleware for LastAccessMiddleware {
    fn name(&self) -> &str {
        "last-access"
    }

    fn on_start(&self, dispatcher: &Dispatcher) -> Result<()> {
        self.dispatcher
            .set(dispatcher.clone())
            .map_err(|_| Error::config("last-access middleware registered twice"))
    }

    fn after_reduce(&self, _action: &Action, pre: &BrowserState, post: &BrowserState) -> Result<()> {
        if pre.selected_tab_id == post.selected_tab_id {
            return Ok(());
        }
        let Some(tab_id) = post.selected_tab_id.clone() else {
            return Ok(());
        };

        let dispatcher = self.dispatcher.get().ok_or(Error::ChannelClosed)?;
        dispatcher.dispatch(TabListAction::UpdateLastAccess {
            tab_id,
            last_access: now_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TabRecord;
    use crate::store::Store;
    use std::sync::Arc;
    use tabforest_core::TabId;

    #[tokio::test]
    async fn test_selection_change_stamps_last_access() {
        let mut store = Store::new(BrowserState::new());
        store.register_middleware(Arc::new(LastAccessMiddleware::new()));

        let before = now_millis();
        store.process_action(
            TabListAction::AddTab {
                tab: TabRecord::with_id("a", "https://a.test"),
                select: true,
            }
            .into(),
        );
        store.drain_pending_actions();

        let tab = store.state().find_tab(&TabId::new("a")).unwrap().clone();
        assert!(tab.last_access >= before);
    }

    #[tokio::test]
    async fn test_unchanged_selection_is_ignored() {
        let mut store = Store::new(BrowserState::new());
        store.register_middleware(Arc::new(LastAccessMiddleware::new()));
        store.process_action(
            TabListAction::AddTab {
                tab: TabRecord::with_id("a", "https://a.test"),
                select: true,
            }
            .into(),
        );
        store.drain_pending_actions();

        store.process_action(
            TabListAction::AddTab {
                tab: TabRecord::with_id("b", "https://b.test"),
                select: false,
            }
            .into(),
        );

        assert_eq!(store.drain_pending_actions(), 0);
        assert_eq!(
            store.state().find_tab(&TabId::new("b")).unwrap().last_access,
            0
        );
    }
}

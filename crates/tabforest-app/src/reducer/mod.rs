//! Reducer module - pure state transitions
//!
//! Organized into submodules:
//! - `tab_list`: forest shape, reparenting and selection successor
//! - `engine`: engine session linking state
//! - `content`: facts reported by engine observers
//!
//! Every reducer returns the input `Arc` untouched when the action does not
//! change anything, including actions naming tabs that do not exist.

pub(crate) mod content;
pub(crate) mod engine;
pub(crate) mod tab_list;


use std::sync::Arc;

use tabforest_core::TabId;

use crate::action::Action;
use crate::state::{BrowserState, TabRecord};

pub use tab_list::find_successor;

/// Compute the next state for `action`
pub fn reduce(state: &Arc<BrowserState>, action: &Action) -> Arc<BrowserState> {
    match action {
        Action::TabList(action) => tab_list::reduce(state, action),
        Action::Engine(action) => engine::reduce(state, action),
        Action::Content(action) => content::reduce(state, action),
    }
}

/// Apply `f` to a copy of one tab, keeping the old state when the tab is
/// unknown or `f` leaves it unchanged
pub(crate) fn update_tab(
    state: &Arc<BrowserState>,
    tab_id: &TabId,
    f: impl FnOnce(&mut TabRecord),
) -> Arc<BrowserState> {
    let Some(index) = state.index_of(tab_id) else {
        return Arc::clone(state);
    };

    let mut tab = state.tabs[index].clone();
    f(&mut tab);
    if tab == state.tabs[index] {
        return Arc::clone(state);
    }

    let mut next = BrowserState::clone(state);
    next.tabs[index] = tab;
    Arc::new(next)
}

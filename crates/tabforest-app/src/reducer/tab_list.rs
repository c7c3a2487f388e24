//! Tab list reducer: forest shape and selection

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tabforest_core::prelude::*;
use tabforest_core::{RecoverableTab, TabId};

use super::update_tab;
use crate::action::TabListAction;
use crate::state::{BrowserState, TabRecord};

pub(crate) fn reduce(state: &Arc<BrowserState>, action: &TabListAction) -> Arc<BrowserState> {
    match action {
        TabListAction::AddTab { tab, select } => add_tab(state, tab.clone(), *select),
        TabListAction::SelectTab { tab_id } => select_tab(state, tab_id),
        TabListAction::RemoveTab {
            tab_id,
            select_parent_if_exists,
        } => remove_tab(state, tab_id, *select_parent_if_exists),
        TabListAction::RemoveTabs { tab_ids } => remove_tabs(state, tab_ids),
        TabListAction::RemoveAllTabs => {
            if state.tabs.is_empty() && state.selected_tab_id.is_none() {
                Arc::clone(state)
            } else {
                Arc::new(BrowserState::new())
            }
        }
        TabListAction::RemoveAllNormalTabs => remove_where(state, |t| !t.is_private()),
        TabListAction::RemoveAllPrivateTabs => remove_where(state, TabRecord::is_private),
        TabListAction::Restore {
            tabs,
            selected_tab_id,
        } => restore(state, tabs, selected_tab_id.as_ref()),
        TabListAction::UpdateLastAccess {
            tab_id,
            last_access,
        } => update_tab(state, tab_id, |tab| tab.last_access = *last_access),
    }
}

fn add_tab(state: &Arc<BrowserState>, mut tab: TabRecord, select: bool) -> Arc<BrowserState> {
    if state.contains(&tab.id) {
        warn!("Ignoring AddTab for existing tab {}", tab.id);
        return Arc::clone(state);
    }

    let mut next = BrowserState::clone(state);

    let insert_at = match tab.parent_id.as_ref().map(|p| next.index_of(p)) {
        Some(Some(parent_index)) => parent_index + 1,
        Some(None) => {
            debug!("Parent of new tab {} does not exist, adding as root", tab.id);
            tab.parent_id = None;
            next.tabs.len()
        }
        None => next.tabs.len(),
    };

    if select || next.selected_tab_id.is_none() {
        next.selected_tab_id = Some(tab.id.clone());
    }
    next.tabs.insert(insert_at, tab);

    Arc::new(next)
}

fn select_tab(state: &Arc<BrowserState>, tab_id: &TabId) -> Arc<BrowserState> {
    if !state.contains(tab_id) || state.selected_tab_id.as_ref() == Some(tab_id) {
        return Arc::clone(state);
    }

    let mut next = BrowserState::clone(state);
    next.selected_tab_id = Some(tab_id.clone());
    Arc::new(next)
}

fn remove_tab(
    state: &Arc<BrowserState>,
    tab_id: &TabId,
    select_parent_if_exists: bool,
) -> Arc<BrowserState> {
    let Some(index) = state.index_of(tab_id) else {
        return Arc::clone(state);
    };

    let mut next = BrowserState::clone(state);
    let removed = next.tabs.remove(index);

    // Children move up one level only; grandchildren keep their parent.
    for tab in next.tabs.iter_mut() {
        if tab.parent_id.as_ref() == Some(&removed.id) {
            tab.parent_id = removed.parent_id.clone();
        }
    }

    if next.selected_tab_id.as_ref() == Some(&removed.id) {
        let parent = removed
            .parent_id
            .as_ref()
            .filter(|p| select_parent_if_exists && next.contains(p))
            .cloned();
        next.selected_tab_id =
            parent.or_else(|| find_successor(&next.tabs, index, removed.is_private()));
    }

    Arc::new(next)
}

/// Pick the tab to select after the selected tab at `index` was removed.
///
/// Prefers the tab now sitting at the removed tab's position among tabs of
/// the same privacy mode (clamped to the last one), then the same rule over
/// all tabs. `tabs` is the list after removal.
pub fn find_successor(tabs: &[TabRecord], index: usize, private: bool) -> Option<TabId> {
    let same_mode: Vec<&TabRecord> = tabs.iter().filter(|t| t.is_private() == private).collect();
    if !same_mode.is_empty() {
        let mode_index = tabs[..index.min(tabs.len())]
            .iter()
            .filter(|t| t.is_private() == private)
            .count();
        let pick = mode_index.min(same_mode.len() - 1);
        return Some(same_mode[pick].id.clone());
    }

    tabs.get(index.min(tabs.len().saturating_sub(1)))
        .map(|t| t.id.clone())
}

fn remove_tabs(state: &Arc<BrowserState>, tab_ids: &[TabId]) -> Arc<BrowserState> {
    tab_ids
        .iter()
        .fold(Arc::clone(state), |current, id| remove_tab(&current, id, false))
}

fn remove_where(state: &Arc<BrowserState>, pred: impl Fn(&TabRecord) -> bool) -> Arc<BrowserState> {
    let ids: Vec<TabId> = state
        .tabs
        .iter()
        .filter(|t| pred(t))
        .map(|t| t.id.clone())
        .collect();
    remove_tabs(state, &ids)
}

fn restore(
    state: &Arc<BrowserState>,
    tabs: &[RecoverableTab],
    selected_tab_id: Option<&TabId>,
) -> Arc<BrowserState> {
    let mut known: HashSet<TabId> = state.tabs.iter().map(|t| t.id.clone()).collect();
    let mut restored: Vec<TabRecord> = Vec::with_capacity(tabs.len());

    for tab in tabs {
        if !known.insert(tab.id.clone()) {
            debug!("Skipping restored tab {}: id already present", tab.id);
            continue;
        }
        restored.push(TabRecord::from(tab.clone()));
    }

    if restored.is_empty() {
        return Arc::clone(state);
    }

    for tab in restored.iter_mut() {
        let dangling = tab
            .parent_id
            .as_ref()
            .is_some_and(|p| p == &tab.id || !known.contains(p));
        if dangling {
            tab.parent_id = None;
        }
    }
    break_parent_cycles(&mut restored);

    let mut next = BrowserState::clone(state);
    next.tabs.extend(restored);

    if next.selected_tab_id.is_none() {
        next.selected_tab_id = selected_tab_id.filter(|id| next.contains(id)).cloned();
    }

    Arc::new(next)
}

/// Clear the parent of any restored tab whose ancestor chain leads back to itself
fn break_parent_cycles(tabs: &mut [TabRecord]) {
    let index: HashMap<TabId, usize> = tabs
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    for i in 0..tabs.len() {
        let own_id = tabs[i].id.clone();
        let mut seen = HashSet::new();
        let mut current = tabs[i].parent_id.clone();

        while let Some(parent) = current {
            if parent == own_id {
                warn!("Breaking parent cycle at restored tab {}", own_id);
                tabs[i].parent_id = None;
                break;
            }
            if !seen.insert(parent.clone()) {
                break;
            }
            current = index.get(&parent).and_then(|&j| tabs[j].parent_id.clone());
        }
    }
}

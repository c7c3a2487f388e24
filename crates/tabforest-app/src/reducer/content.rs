//! Content reducer: facts reported by engine observers

use std::sync::Arc;

use super::update_tab;
use crate::action::ContentAction;
use crate::state::BrowserState;

pub(crate) fn reduce(state: &Arc<BrowserState>, action: &ContentAction) -> Arc<BrowserState> {
    update_tab(state, action.tab_id(), |tab| match action {
        ContentAction::LocationChanged { url, .. } => {
            tab.content.url = url.clone();
            tab.content.title.clear();
            tab.content.search_terms.clear();
            tab.trackers_blocked.clear();
        }
        ContentAction::UpdateTitle { title, .. } => tab.content.title = title.clone(),
        ContentAction::UpdateProgress { progress, .. } => {
            tab.content.progress = (*progress).min(100);
        }
        ContentAction::UpdateLoadingState { loading, .. } => tab.content.loading = *loading,
        ContentAction::UpdateNavigationState {
            can_go_back,
            can_go_forward,
            ..
        } => {
            if let Some(back) = can_go_back {
                tab.content.can_go_back = *back;
            }
            if let Some(forward) = can_go_forward {
                tab.content.can_go_forward = *forward;
            }
        }
        ContentAction::UpdateSecurityInfo { info, .. } => tab.content.security = info.clone(),
        ContentAction::UpdateSearchTerms { search_terms, .. } => {
            tab.content.search_terms = search_terms.clone();
        }
        ContentAction::TrackerBlocked { tracker, .. } => {
            tab.trackers_blocked.push(tracker.clone());
        }
    })
}

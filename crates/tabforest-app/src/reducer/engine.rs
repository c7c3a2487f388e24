//! Engine reducer: which tabs hold a live session and their saved state

use std::sync::Arc;

use super::update_tab;
use crate::action::EngineAction;
use crate::state::BrowserState;

pub(crate) fn reduce(state: &Arc<BrowserState>, action: &EngineAction) -> Arc<BrowserState> {
    match action {
        EngineAction::LinkEngineSession {
            tab_id,
            session,
            skip_initial_load,
            ..
        } => update_tab(state, tab_id, |tab| {
            tab.engine.session = Some(session.clone());
            tab.engine.skip_initial_load = *skip_initial_load;
        }),
        EngineAction::UnlinkEngineSession { tab_id } => update_tab(state, tab_id, |tab| {
            tab.engine.session = None;
            tab.engine.skip_initial_load = false;
        }),
        EngineAction::KillEngineSession { tab_id } => update_tab(state, tab_id, |tab| {
            tab.engine.session = None;
            tab.engine.session_state = None;
            tab.engine.skip_initial_load = false;
        }),
        EngineAction::UpdateEngineSessionState {
            tab_id,
            state: session_state,
        } => update_tab(state, tab_id, |tab| {
            tab.engine.session_state = Some(session_state.clone());
        }),
        // Side effects only; handled by the engine middleware
        EngineAction::CreateEngineSession { .. }
        | EngineAction::SuspendEngineSession { .. }
        | EngineAction::LoadUrl { .. }
        | EngineAction::TrimMemory { .. } => Arc::clone(state),
    }
}

//! Middleware system for extending Store behaviour.
//!
//! Middleware sees every action twice: before it reaches the reducer (and may
//! swallow it) and after the new state has been published. Side effects such
//! as engine session management live here so reducers stay pure.

pub mod engine;
pub mod last_access;

use std::fmt;

use tabforest_core::prelude::*;

use crate::action::Action;
use crate::state::BrowserState;
use crate::store::Dispatcher;

pub use engine::EngineMiddleware;
pub use last_access::LastAccessMiddleware;

/// Outcome of [`Middleware::before_reduce`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Hand the action to the next middleware and the reducer
    Continue,
    /// Swallow the action; nothing after this middleware sees it
    Drop,
}

/// Extension trait for Store middleware.
///
/// Each callback has a default no-op implementation, so middleware only
/// needs to override the hooks it cares about.
///
/// # Lifecycle
///
/// 1. Middleware is registered via `Store::register_middleware()`, which
///    calls `on_start()` with a dispatcher for follow-up actions
/// 2. `before_reduce()` runs for every action, in registration order
/// 3. `after_reduce()` runs once the reduced state is published
/// 4. `on_shutdown()` is called when the Store shuts down
///
/// Hooks run on the store's processing task and must not block. Work that
/// suspends belongs on a task owned by the middleware.
pub trait Middleware: Send + Sync + fmt::Debug {
    /// Unique name for this middleware (for logging and identification).
    fn name(&self) -> &str;

    fn on_start(&self, _dispatcher: &Dispatcher) -> Result<()> {
        Ok(())
    }

    /// Inspect an action before it is reduced against `state`.
    fn before_reduce(&self, _state: &BrowserState, _action: &Action) -> Flow {
        Flow::Continue
    }

    /// Called after `action` turned `pre` into `post`.
    ///
    /// `pre` and `post` are the same state when the action was a no-op.
    fn after_reduce(&self, _action: &Action, _pre: &BrowserState, _post: &BrowserState) -> Result<()> {
        Ok(())
    }

    fn on_shutdown(&self) -> Result<()> {
        Ok(())
    }
}

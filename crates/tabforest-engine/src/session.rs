//! Native engine session abstraction

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use tabforest_core::EngineSessionState;

use crate::observer::EngineSessionObserver;

/// A live engine-side session: one loaded page with its navigation history.
///
/// Implementations are expected to be cheap to call from any thread; the
/// heavy lifting (network, rendering) happens inside the engine.
pub trait EngineSession: Send + Sync + fmt::Debug {
    /// Start loading `url` in this session
    fn load_url(&self, url: &str);

    /// Restore previously saved navigation state.
    ///
    /// Returns `false` when the engine could not apply the state, in which
    /// case the session is left blank.
    fn restore_state(&self, state: &EngineSessionState) -> bool;

    /// Serialize the current navigation state, if the engine has any
    fn save_state(&self) -> Option<EngineSessionState>;

    /// Attach an observer receiving this session's callbacks
    fn register(&self, observer: Arc<dyn EngineSessionObserver>);

    /// Detach every observer
    fn unregister_observers(&self);

    /// Release the native resources of this session.
    ///
    /// May be called more than once; later calls must be no-ops.
    fn close(&self);
}

/// Shared handle to a live engine session.
///
/// Two handles are equal only when they point at the same session.
#[derive(Clone)]
pub struct EngineSessionHandle(Arc<dyn EngineSession>);

impl EngineSessionHandle {
    pub fn new(session: Arc<dyn EngineSession>) -> Self {
        Self(session)
    }

    /// Check whether both handles refer to the same native session
    pub fn same_session(&self, other: &EngineSessionHandle) -> bool {
        // Data pointers only; vtables of one object may differ across codegen units.
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    /// Detach observers and close the session
    pub fn dispose(&self) {
        tracing::trace!("Disposing engine session {:?}", self.0);
        self.0.unregister_observers();
        self.0.close();
    }
}

impl<S: EngineSession + 'static> From<Arc<S>> for EngineSessionHandle {
    fn from(session: Arc<S>) -> Self {
        Self(session)
    }
}

impl Deref for EngineSessionHandle {
    type Target = dyn EngineSession;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for EngineSessionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_session(other)
    }
}

impl Eq for EngineSessionHandle {}

impl fmt::Debug for EngineSessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EngineSessionHandle").field(&self.0).finish()
    }
}

//! Engine trait: factory for native sessions and their serialized state

use serde_json::value::RawValue;
use tabforest_core::prelude::*;
use tabforest_core::EngineSessionState;

use crate::session::EngineSessionHandle;

/// The rendering engine collaborator.
///
/// `create_session` may suspend (the native side can take a while to spin up
/// a renderer); `create_session_state` runs inline while a snapshot is being
/// streamed from disk and must not block.
#[trait_variant::make(Engine: Send)]
pub trait LocalEngine {
    /// Create a new native session scoped to the given privacy mode and
    /// container
    async fn create_session(
        &self,
        private: bool,
        context_id: Option<String>,
    ) -> Result<EngineSessionHandle>;

    /// Parse the engine's own serialized session format.
    ///
    /// `raw` is the exact JSON text stored under a tab's `engineSession` key.
    fn create_session_state(&self, raw: &RawValue) -> Result<EngineSessionState>;
}

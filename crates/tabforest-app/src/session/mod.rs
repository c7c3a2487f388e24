//! Engine session bookkeeping owned by the engine middleware

mod holder;
mod lookup;

pub use holder::{EngineSessionHolder, HolderMap, LinkOutcome};
pub use lookup::{SessionLookup, StoreSessionLookup};

//! # tabforest-core - Core Domain Types
//!
//! Foundation crate for tabforest. Provides tab identifiers, content and
//! security descriptors, the snapshot DTOs used for crash recovery, error
//! handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, serde_json, chrono, thiserror, tracing, uuid).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`TabId`] - Opaque tab identifier
//! - [`ContentState`] - URL, title, progress and navigation flags of a tab
//! - [`SecurityInfo`] - Security descriptor of the loaded page
//! - [`ReaderState`] - Reader mode flags
//! - [`MemoryPressure`] - Host memory pressure level
//!
//! ### Snapshots (`snapshot`)
//! - [`RecoverableTab`], [`RecoverableBrowserState`] - Tabs recovered from disk
//! - [`EngineSessionState`] - Opaque serialized engine state
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use tabforest_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod prelude;
pub mod snapshot;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use snapshot::{EngineSessionState, RecoverableBrowserState, RecoverableTab};
pub use types::{ContentState, MemoryPressure, ReaderState, SecurityInfo, TabId};

/// Current time in epoch milliseconds, the unit of `last_access`
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

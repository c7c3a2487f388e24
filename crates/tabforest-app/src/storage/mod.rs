//! Snapshot persistence
//!
//! - `reader` / `writer`: the JSON document format
//! - `session_storage`: atomic file storage of that document
//! - `autosave`: debounced saving driven by the store

pub mod autosave;
pub mod reader;
pub mod session_storage;
pub mod writer;

pub use autosave::AutoSave;
pub use reader::{BrowserStateReader, ReadOptions, TabPredicate};
pub use session_storage::SessionStorage;
pub use writer::{BrowserStateWriter, SNAPSHOT_VERSION};

//! tabforest
//!
//! Browser tab forest with engine session linking and crash-recovery
//! snapshots. This crate re-exports the workspace crates:
//!
//! - [`core`] - domain types, errors and logging
//! - [`engine`] - the rendering engine boundary
//! - [`app`] - store, middleware and persistence

pub use tabforest_app as app;
pub use tabforest_core as core;
pub use tabforest_engine as engine;

pub use tabforest_app::{
    Action, AutoSave, BrowserState, Dispatcher, EngineMiddleware, LastAccessMiddleware,
    ReadOptions, SessionStorage, Settings, Store, StoreEvent, TabRecord,
};
pub use tabforest_core::{Error, Result, TabId};

//! tabforest-app - Browser state store for tabforest
//!
//! Holds the tab forest in an immutable [`BrowserState`] that only the
//! [`Store`] replaces, by running dispatched actions through the reducer.
//! Middleware observes every action; the engine middleware links tabs to
//! native engine sessions and the storage module persists and restores
//! snapshots.

pub mod action;
pub mod config;
pub mod event;
pub mod middleware;
pub mod observer;
pub mod reducer;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;

// Re-export primary types
pub use action::{Action, ContentAction, EngineAction, TabListAction};
pub use config::Settings;
pub use event::StoreEvent;
pub use middleware::{EngineMiddleware, Flow, LastAccessMiddleware, Middleware};
pub use observer::EngineObserver;
pub use state::{BrowserState, EngineState, TabRecord};
pub use storage::{AutoSave, ReadOptions, SessionStorage};
pub use store::{Dispatcher, Store};

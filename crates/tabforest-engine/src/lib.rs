//! # tabforest-engine - Rendering Engine Boundary
//!
//! Defines what tabforest needs from a rendering engine: a factory for
//! native sessions, the session handle itself, and the callback interface
//! sessions report through.
//!
//! Depends on [`tabforest_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! - [`Engine`] / [`LocalEngine`] - Async session factory and state parser
//! - [`EngineSession`] - A live native session
//! - [`EngineSessionHandle`] - Shared, identity-compared session handle
//! - [`EngineSessionObserver`] - Callbacks delivered by a session
//!
//! With the `test-helpers` feature, `test_utils` provides `FakeEngine` and
//! `FakeEngineSession`.

pub mod engine;
pub mod observer;
pub mod session;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use engine::{Engine, LocalEngine};
pub use observer::EngineSessionObserver;
pub use session::{EngineSession, EngineSessionHandle};

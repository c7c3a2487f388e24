//! Configuration file parsing for tabforest
//!
//! Settings live in `<dir>/config.toml`; every key is optional.

pub mod settings;
pub mod types;

pub use settings::{load_settings, save_settings, CONFIG_FILENAME};
pub use types::*;

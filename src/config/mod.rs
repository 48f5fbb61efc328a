//! Configuration module for the lottigen pipeline
//!
//! Provides types and parsing for `lottigen.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::{find_config, load_config, load_or_default, ConfigError};
pub use schema::*;

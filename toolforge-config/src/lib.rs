//! Configuration management for the plugin runtime.
//!
//! Configuration is read from a TOML file and then overridden by
//! `TOOLFORGE_*` environment variables.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

pub use loader::{ENV_ARCHIVE_EXTENSION, ENV_LOG, ENV_PARALLEL_LOAD, ENV_PLUGIN_DIR};
pub use schema::{AccessConfig, RuntimeConfig};

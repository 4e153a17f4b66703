//! Observability utilities for the plugin runtime.

#![warn(missing_docs, clippy::pedantic)]

pub mod tracing_support;

pub use tracing_support::{env_filter, init_tracing};

//! Core shared types for the toolforge plugin runtime.

#![warn(missing_docs, clippy::pedantic)]

mod access;
mod descriptor;
mod error;
mod identity;
mod ids;

/// Required access levels and caller tiers.
pub use access::{AccessLevel, Tier};
/// Self-describing tool metadata.
pub use descriptor::{ToolDescriptor, ToolDescriptorBuilder};
/// Error type and result alias shared across the runtime.
pub use error::{Error, Result};
/// Authenticated caller supplied by the upstream auth layer.
pub use identity::Identity;
/// Identifiers for tools and isolation contexts.
pub use ids::{ContextId, ToolName};

/// Loosely typed field map exchanged with tools on input and output.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

//! Tool contract, provider discovery, and the plugin registry.
//!
//! Tools are self-describing units implementing [`Tool`]. Providers that
//! construct them are registered at compile time (see [`provider`]) and
//! instantiated once per [`IsolationContext`], so two archives never share
//! instance state. Loaded instances are published in the [`PluginRegistry`].

#![warn(missing_docs, clippy::pedantic)]

extern crate self as toolforge_tools;

pub mod context;
pub mod lifecycle;
pub mod output;
pub mod provider;
pub mod registry;
pub mod tool;

pub use context::{IsolationContext, IsolationContextBuilder};
pub use lifecycle::{LifecycleError, ToolEvent, ToolLifecycle, ToolState};
pub use provider::{ProviderContext, ProviderFactory, ProviderRegistration, ProviderTable};
pub use registry::{PluginRegistry, RegistryEntry};
pub use tool::{Tool, ToolError, ToolResult, guarded};
pub use toolforge_tools_macros::provider;

#[doc(hidden)]
pub use inventory;

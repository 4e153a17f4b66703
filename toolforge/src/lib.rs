//! Plugin runtime facade.
//!
//! Depend on this crate via `cargo add toolforge`. It bundles the runtime
//! crates behind feature flags so hosts can pull in only the pieces they
//! use. Tool authors usually need nothing beyond [`tools`] and
//! [`primitives`].

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use toolforge_primitives as primitives;

/// Tool contract, provider registration, and registry.
pub use toolforge_tools as tools;

/// Registers a provider factory under an id archives can name.
pub use toolforge_tools::provider;

/// Archive loading, dispatch, and the runtime object (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use toolforge_kernel as kernel;

/// Access policy evaluation (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use toolforge_policy as policy;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use toolforge_telemetry as telemetry;

/// Configuration management (enabled by `config` feature).
#[cfg(feature = "config")]
pub use toolforge_config as config;

#[cfg(feature = "bootstrap")]
mod bootstrap;

#[cfg(feature = "bootstrap")]
pub use bootstrap::bootstrap;

/// Common imports for tool authors and hosts.
pub mod prelude {
    pub use toolforge_primitives::{
        AccessLevel, FieldMap, Identity, Tier, ToolDescriptor, ToolName,
    };
    pub use toolforge_tools::{ProviderContext, Tool, ToolError, ToolResult, output, provider};

    #[cfg(feature = "kernel")]
    pub use toolforge_kernel::{
        DispatchError, DispatchService, LoadError, LoadReport, PluginRuntime, ToolCatalog,
    };
}

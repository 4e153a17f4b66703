//! Compile-time provider registration.
//!
//! Providers are registered with [`inventory`] under a string id, usually
//! through the `#[provider("id")]` attribute. Archives name the ids they
//! want; the loader resolves them here and runs each factory once per
//! isolation context. This trades runtime extensibility for safety: only
//! providers compiled into the host can be loaded.

use std::collections::HashMap;

use toolforge_primitives::{ContextId, FieldMap};
use tracing::{debug, warn};

use crate::tool::{Tool, ToolError, ToolResult, guarded};

/// Factory constructing one tool instance for an isolation context.
pub type ProviderFactory = fn(&ProviderContext<'_>) -> ToolResult<Box<dyn Tool>>;

/// Static registration submitted to the provider inventory.
#[derive(Debug)]
pub struct ProviderRegistration {
    id: &'static str,
    factory: ProviderFactory,
}

impl ProviderRegistration {
    /// Creates a registration for `id`.
    #[must_use]
    pub const fn new(id: &'static str, factory: ProviderFactory) -> Self {
        Self { id, factory }
    }

    /// Returns the provider id.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// Returns the factory.
    #[must_use]
    pub const fn factory(&self) -> ProviderFactory {
        self.factory
    }
}

inventory::collect!(ProviderRegistration);

/// View of an isolation context handed to provider factories.
#[derive(Debug, Clone, Copy)]
pub struct ProviderContext<'a> {
    context_id: ContextId,
    archive: &'a str,
    config: &'a FieldMap,
}

impl<'a> ProviderContext<'a> {
    /// Creates a provider context.
    #[must_use]
    pub const fn new(context_id: ContextId, archive: &'a str, config: &'a FieldMap) -> Self {
        Self {
            context_id,
            archive,
            config,
        }
    }

    /// Returns the owning context id.
    #[must_use]
    pub const fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Returns the archive name declared in its manifest.
    #[must_use]
    pub const fn archive(&self) -> &'a str {
        self.archive
    }

    /// Returns the archive's private configuration table.
    #[must_use]
    pub const fn config(&self) -> &'a FieldMap {
        self.config
    }
}

/// Lookup table from provider id to factory.
#[derive(Debug, Clone, Default)]
pub struct ProviderTable {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from every provider submitted to the inventory.
    ///
    /// When two registrations share an id the first one seen is kept.
    #[must_use]
    pub fn from_inventory() -> Self {
        let mut table = Self::new();
        for registration in inventory::iter::<ProviderRegistration> {
            if table.factories.contains_key(registration.id()) {
                warn!(provider = registration.id(), "duplicate provider registration ignored");
                continue;
            }
            table
                .factories
                .insert(registration.id().to_owned(), registration.factory());
        }
        debug!(providers = table.len(), "provider table built from inventory");
        table
    }

    /// Adds or replaces a provider and returns the table.
    #[must_use]
    pub fn with_provider(mut self, id: impl Into<String>, factory: ProviderFactory) -> Self {
        self.register(id, factory);
        self
    }

    /// Adds or replaces a provider.
    pub fn register(&mut self, id: impl Into<String>, factory: ProviderFactory) {
        self.factories.insert(id.into(), factory);
    }

    /// Returns the factory for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ProviderFactory> {
        self.factories.get(id).copied()
    }

    /// Returns `true` when `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Returns the registered ids in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Runs the factory for `id` inside the panic guard.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownProvider`] when `id` is not registered and
    /// [`ToolError::Provider`] when the factory fails or panics.
    pub fn instantiate(&self, id: &str, ctx: &ProviderContext<'_>) -> ToolResult<Box<dyn Tool>> {
        let factory = self.get(id).ok_or_else(|| ToolError::UnknownProvider { id: id.into() })?;
        guarded(|| factory(ctx)).map_err(|err| match err {
            ToolError::Provider { .. } => err,
            other => ToolError::Provider {
                id: id.into(),
                reason: other.to_string(),
            },
        })
    }
}

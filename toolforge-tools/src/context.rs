//! Isolation contexts: the exclusive owners of one archive's tool instances.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use toolforge_primitives::{ContextId, FieldMap, ToolName};
use tracing::{debug, info, warn};

use crate::provider::{ProviderContext, ProviderTable};
use crate::tool::{Tool, ToolError, ToolResult, guarded};

/// Owns the configuration and tool instances created for one archive.
///
/// Every archive gets a fresh context, and providers are instantiated once
/// per context, so instances never share state across archives. The context
/// is released when the last registry entry and the last in-flight call
/// holding it are dropped.
pub struct IsolationContext {
    id: ContextId,
    archive: String,
    source: PathBuf,
    config: FieldMap,
    created_at: DateTime<Utc>,
    instances: Vec<(ToolName, Arc<dyn Tool>)>,
}

impl IsolationContext {
    /// Starts building a context for the named archive.
    #[must_use]
    pub fn builder(
        archive: impl Into<String>,
        source: impl Into<PathBuf>,
        config: FieldMap,
    ) -> IsolationContextBuilder {
        IsolationContextBuilder {
            id: ContextId::random(),
            archive: archive.into(),
            source: source.into(),
            config,
            instances: Vec::new(),
        }
    }

    /// Returns the context identifier.
    #[must_use]
    pub const fn id(&self) -> ContextId {
        self.id
    }

    /// Returns the archive name declared in the manifest.
    #[must_use]
    pub fn archive(&self) -> &str {
        &self.archive
    }

    /// Returns the path the archive was loaded from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns the archive's private configuration.
    #[must_use]
    pub fn config(&self) -> &FieldMap {
        &self.config
    }

    /// Returns when the context was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the owned instances in provider order.
    pub fn instances(&self) -> impl Iterator<Item = (&ToolName, &Arc<dyn Tool>)> {
        self.instances.iter().map(|(name, tool)| (name, tool))
    }

    /// Returns the instance registered under `name`.
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.instances
            .iter()
            .find(|(owned, _)| owned.as_str() == name)
            .map(|(_, tool)| tool)
    }

    /// Returns the names of the owned instances.
    #[must_use]
    pub fn tool_names(&self) -> Vec<ToolName> {
        self.instances.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of owned instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the context owns no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl fmt::Debug for IsolationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolationContext")
            .field("id", &self.id)
            .field("archive", &self.archive)
            .field("source", &self.source)
            .field("tools", &self.tool_names())
            .finish_non_exhaustive()
    }
}

impl Drop for IsolationContext {
    fn drop(&mut self) {
        info!(
            context = %self.id,
            archive = %self.archive,
            tools = self.instances.len(),
            "isolation context released"
        );
    }
}

/// Builder that instantiates providers into a new [`IsolationContext`].
pub struct IsolationContextBuilder {
    id: ContextId,
    archive: String,
    source: PathBuf,
    config: FieldMap,
    instances: Vec<(ToolName, Arc<dyn Tool>)>,
}

impl IsolationContextBuilder {
    /// Returns the id the finished context will carry.
    #[must_use]
    pub const fn id(&self) -> ContextId {
        self.id
    }

    /// Instantiates `provider` inside this context.
    ///
    /// When the new instance reuses a name already owned by this context the
    /// later instance wins.
    ///
    /// # Errors
    ///
    /// Returns the provider's failure, or [`ToolError::Provider`] when the
    /// instance reports an invalid name or panics while reporting it.
    pub fn instantiate(&mut self, table: &ProviderTable, provider: &str) -> ToolResult<ToolName> {
        let ctx = ProviderContext::new(self.id, &self.archive, &self.config);
        let tool = table.instantiate(provider, &ctx)?;
        let name = guarded(|| {
            ToolName::new(tool.name()).map_err(|err| ToolError::Provider {
                id: provider.into(),
                reason: err.to_string(),
            })
        })
        .map_err(|err| match err {
            ToolError::Provider { .. } => err,
            other => ToolError::Provider {
                id: provider.into(),
                reason: other.to_string(),
            },
        })?;

        if let Some(slot) = self.instances.iter_mut().find(|(owned, _)| *owned == name) {
            warn!(
                archive = %self.archive,
                tool = %name,
                provider,
                "archive declares the same tool name twice; keeping the later instance"
            );
            slot.1 = Arc::from(tool);
        } else {
            self.instances.push((name.clone(), Arc::from(tool)));
        }

        debug!(archive = %self.archive, tool = %name, provider, "provider instantiated");
        Ok(name)
    }

    /// Finishes the context.
    #[must_use]
    pub fn build(self) -> Arc<IsolationContext> {
        Arc::new(IsolationContext {
            id: self.id,
            archive: self.archive,
            source: self.source,
            config: self.config,
            created_at: Utc::now(),
            instances: self.instances,
        })
    }
}

impl fmt::Debug for IsolationContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolationContextBuilder")
            .field("id", &self.id)
            .field("archive", &self.archive)
            .field("instances", &self.instances.len())
            .finish_non_exhaustive()
    }
}

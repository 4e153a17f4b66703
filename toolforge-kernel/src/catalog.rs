//! Operational surface: listing, describing, and invoking tools.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use toolforge_primitives::{ContextId, Identity, ToolDescriptor};
use tracing::debug;

use crate::dispatch::DispatchService;
use crate::error::{DispatchError, DispatchResult};

/// Point-in-time view of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatus {
    /// Registered tool name.
    pub name: String,
    /// Archive that contributed the tool.
    pub archive: String,
    /// Isolation context owning the instance.
    pub context: ContextId,
    /// Path the archive was loaded from.
    pub source: PathBuf,
    /// When the entry was published.
    pub registered_at: DateTime<Utc>,
}

/// Catalog and invocation surface built on the dispatch service.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    dispatcher: DispatchService,
}

impl ToolCatalog {
    /// Creates a catalog sharing `dispatcher`'s registry and policy.
    #[must_use]
    pub fn new(dispatcher: DispatchService) -> Self {
        Self { dispatcher }
    }

    /// Returns the descriptors `identity` may invoke, sorted by id.
    ///
    /// Tools without an available descriptor are omitted.
    #[must_use]
    pub fn list_accessible(&self, identity: Option<&Identity>) -> Vec<Arc<ToolDescriptor>> {
        let policy = self.dispatcher.policy();
        let tier = policy.tier_of(identity);

        let mut listed: Vec<Arc<ToolDescriptor>> = self
            .dispatcher
            .registry()
            .snapshot()
            .into_iter()
            .filter_map(|entry| {
                let Some(descriptor) = entry.descriptor() else {
                    debug!(tool = %entry.name(), "omitting tool without descriptor from listing");
                    return None;
                };
                let required = policy.required_level_of(Some(descriptor.as_ref()));
                policy.decide(tier, required).is_allow().then_some(descriptor)
            })
            .collect();
        listed.sort_by(|a, b| a.id().cmp(b.id()));
        listed
    }

    /// Returns the descriptor of `name`, or `None` when it is unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotFound`] when no tool has that name.
    pub fn describe(&self, name: &str) -> DispatchResult<Option<Arc<ToolDescriptor>>> {
        self.dispatcher
            .registry()
            .entry(name)
            .map(|entry| entry.descriptor())
            .ok_or_else(|| DispatchError::NotFound { name: name.into() })
    }

    /// Invokes `name` with a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidRequest`] when `body` is not a JSON
    /// object, otherwise whatever [`DispatchService::process`] returns.
    pub fn invoke(
        &self,
        name: &str,
        identity: Option<&Identity>,
        body: Value,
    ) -> DispatchResult<Value> {
        let Value::Object(input) = body else {
            return Err(DispatchError::InvalidRequest {
                reason: format!("request body must be a JSON object, got {}", kind_of(&body)),
            });
        };
        self.dispatcher
            .process(name, identity, input)
            .map(Value::Object)
    }

    /// Returns the status of every registered tool, sorted by name.
    ///
    /// Only published entries appear; an unloaded tool is simply absent.
    #[must_use]
    pub fn status(&self) -> Vec<EntryStatus> {
        self.dispatcher
            .registry()
            .snapshot()
            .into_iter()
            .map(|entry| EntryStatus {
                name: entry.name().to_string(),
                archive: entry.context().archive().to_owned(),
                context: entry.context_id(),
                source: entry.context().source().to_path_buf(),
                registered_at: entry.registered_at(),
            })
            .collect()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

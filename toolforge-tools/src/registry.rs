//! Runtime registry of loaded tool instances.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use toolforge_primitives::{ContextId, ToolDescriptor, ToolName};
use tracing::{debug, info, warn};

use crate::context::IsolationContext;
use crate::lifecycle::{ToolEvent, ToolLifecycle, ToolState};
use crate::tool::{Tool, guarded};

/// One published tool: its instance, owning context, and cached descriptor.
pub struct RegistryEntry {
    name: ToolName,
    instance: Arc<dyn Tool>,
    context: Arc<IsolationContext>,
    descriptor: RwLock<Option<Arc<ToolDescriptor>>>,
    lifecycle: Mutex<ToolLifecycle>,
    registered_at: DateTime<Utc>,
}

impl RegistryEntry {
    fn new(name: ToolName, instance: Arc<dyn Tool>, context: Arc<IsolationContext>) -> Self {
        let mut lifecycle = ToolLifecycle::new(name.clone());
        if let Err(err) = lifecycle.transition(ToolEvent::Discover) {
            warn!(error = %err, "unexpected lifecycle state for new entry");
        }

        Self {
            name,
            instance,
            context,
            descriptor: RwLock::new(None),
            lifecycle: Mutex::new(lifecycle),
            registered_at: Utc::now(),
        }
    }

    /// Returns the registry key.
    #[must_use]
    pub fn name(&self) -> &ToolName {
        &self.name
    }

    /// Returns the tool instance.
    #[must_use]
    pub fn instance(&self) -> &Arc<dyn Tool> {
        &self.instance
    }

    /// Returns the owning isolation context.
    #[must_use]
    pub fn context(&self) -> &Arc<IsolationContext> {
        &self.context
    }

    /// Returns the owning context id.
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.context.id()
    }

    /// Returns when the entry was published.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ToolState {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state()
    }

    /// Returns the descriptor, fetching and caching it on first use.
    ///
    /// Any failure from the tool's metadata accessor, including a panic, is
    /// logged and reported as `None` ("descriptor unavailable"). Failures are
    /// not cached, so the next call retries.
    #[must_use]
    pub fn descriptor(&self) -> Option<Arc<ToolDescriptor>> {
        let cached = self
            .descriptor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        cached.or_else(|| self.fetch_descriptor())
    }

    /// Drops the cached descriptor and fetches it again.
    #[must_use]
    pub fn refresh_descriptor(&self) -> Option<Arc<ToolDescriptor>> {
        self.descriptor
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.fetch_descriptor()
    }

    fn fetch_descriptor(&self) -> Option<Arc<ToolDescriptor>> {
        match guarded(|| self.instance.metadata()) {
            Ok(descriptor) => {
                let descriptor = Arc::new(descriptor);
                *self
                    .descriptor
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&descriptor));
                debug!(tool = %self.name, level = %descriptor.access_level(), "descriptor cached");
                Some(descriptor)
            }
            Err(err) => {
                warn!(tool = %self.name, error = %err, "tool descriptor unavailable");
                None
            }
        }
    }

    fn apply(&self, event: ToolEvent) {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = lifecycle.transition(event) {
            warn!(error = %err, "ignoring lifecycle transition");
        }
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("context", &self.context.id())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Registry that stores loaded tools keyed by name.
///
/// Readers clone an `Arc<RegistryEntry>` out of a short read section and
/// invoke the tool without holding the lock, so concurrent dispatches only
/// contend briefly with loads and unloads.
#[derive(Default)]
pub struct PluginRegistry {
    inner: RwLock<HashMap<ToolName, Arc<RegistryEntry>>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("registered", &self.names())
            .finish()
    }
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `instance` under `name`, returning the entry it replaced.
    ///
    /// The swap is atomic. A replaced entry moves to
    /// [`ToolState::Unloaded`]; its context is released once nothing else
    /// holds it.
    pub fn put(
        &self,
        name: ToolName,
        instance: Arc<dyn Tool>,
        context: Arc<IsolationContext>,
    ) -> Option<Arc<RegistryEntry>> {
        let entry = Arc::new(RegistryEntry::new(name, instance, context));
        let previous = self.write().insert(entry.name().clone(), Arc::clone(&entry));
        Self::announce(&entry, previous.as_ref());
        previous
    }

    /// Publishes every instance owned by `context`.
    ///
    /// All of the archive's tools become visible under a single write lock,
    /// so readers see either none or all of them. Returns the published
    /// names in provider order.
    pub fn put_context(&self, context: &Arc<IsolationContext>) -> Vec<ToolName> {
        let entries: Vec<_> = context
            .instances()
            .map(|(name, tool)| {
                Arc::new(RegistryEntry::new(
                    name.clone(),
                    Arc::clone(tool),
                    Arc::clone(context),
                ))
            })
            .collect();

        let replaced: Vec<_> = {
            let mut map = self.write();
            entries
                .iter()
                .map(|entry| map.insert(entry.name().clone(), Arc::clone(entry)))
                .collect()
        };

        entries
            .iter()
            .zip(&replaced)
            .map(|(entry, previous)| {
                Self::announce(entry, previous.as_ref());
                entry.name().clone()
            })
            .collect()
    }

    fn announce(entry: &RegistryEntry, previous: Option<&Arc<RegistryEntry>>) {
        match previous {
            Some(old) => {
                old.apply(ToolEvent::Replace);
                info!(
                    tool = %entry.name(),
                    context = %entry.context_id(),
                    replaced_context = %old.context_id(),
                    "replaced tool"
                );
            }
            None => info!(tool = %entry.name(), context = %entry.context_id(), "registered tool"),
        }
    }

    /// Returns the tool instance registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.entry(name).map(|entry| Arc::clone(entry.instance()))
    }

    /// Returns the full entry registered under `name`.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<Arc<RegistryEntry>> {
        self.read().get(name).cloned()
    }

    /// Returns the descriptor for `name`.
    ///
    /// `None` covers both an unknown name and an unavailable descriptor; use
    /// [`Self::entry`] first when the two must be told apart.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<Arc<ToolDescriptor>> {
        self.entry(name).and_then(|entry| entry.descriptor())
    }

    /// Re-fetches the descriptor for `name`, bypassing the cache.
    #[must_use]
    pub fn refresh_descriptor(&self, name: &str) -> Option<Arc<ToolDescriptor>> {
        self.entry(name).and_then(|entry| entry.refresh_descriptor())
    }

    /// Removes the entry for `name`, returning it if present.
    ///
    /// New lookups stop seeing the tool immediately; calls already holding
    /// the entry may still complete.
    pub fn remove(&self, name: &str) -> Option<Arc<RegistryEntry>> {
        let removed = self.write().remove(name);
        if let Some(entry) = &removed {
            entry.apply(ToolEvent::Unload);
            info!(tool = %entry.name(), context = %entry.context_id(), "unregistered tool");
        }
        removed
    }

    /// Removes every entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let drained: Vec<_> = self.write().drain().map(|(_, entry)| entry).collect();
        for entry in &drained {
            entry.apply(ToolEvent::Unload);
        }
        info!(removed = drained.len(), "registry cleared");
        drained.len()
    }

    /// Returns a point-in-time copy of every entry, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<RegistryEntry>> {
        let mut entries: Vec<_> = self.read().values().cloned().collect();
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        entries
    }

    /// Returns the registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<ToolName> {
        let mut names: Vec<_> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ToolName, Arc<RegistryEntry>>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ToolName, Arc<RegistryEntry>>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

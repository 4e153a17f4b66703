//! Plugin runtime kernel: archive scanning, isolated loading, registration,
//! and access-checked dispatch.
//!
//! [`PluginRuntime`] wires the pieces together. At startup it scans the
//! plugin directory, loads each archive into its own isolation context, and
//! publishes the resulting tools. A failing archive is logged and skipped;
//! it never aborts the scan.

#![warn(missing_docs, clippy::pedantic)]

pub mod archive;
mod catalog;
mod dispatch;
mod error;
mod loader;
mod scheduler;

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use toolforge_config::RuntimeConfig;
use toolforge_policy::{AccessPolicy, PolicyResult, RoleMapping, TierPolicy};
use toolforge_primitives::ToolName;
use toolforge_tools::{IsolationContext, PluginRegistry, ProviderTable};
use tracing::{error, info, warn};

pub use archive::{ArchiveManifest, scan};
pub use catalog::{EntryStatus, ToolCatalog};
pub use dispatch::DispatchService;
pub use error::{DispatchError, DispatchResult, LoadError, LoadResult};
pub use loader::ArchiveLoader;
pub use scheduler::{LoadScheduler, SchedulerConfig, SchedulerError, SchedulerResult};

/// Outcome of scanning and loading the plugin directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Tool names published, in load order.
    pub loaded: Vec<ToolName>,
    /// Archives that were skipped, with the reason.
    pub failures: Vec<LoadError>,
}

impl LoadReport {
    /// Returns `true` when no archive failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, outcome: LoadResult<Vec<ToolName>>) {
        match outcome {
            Ok(names) => self.loaded.extend(names),
            Err(err) => self.failures.push(err),
        }
    }
}

/// Owns the registry, provider table, loader, and access policy.
#[derive(Clone)]
pub struct PluginRuntime {
    config: RuntimeConfig,
    registry: Arc<PluginRegistry>,
    loader: ArchiveLoader,
    policy: Arc<dyn AccessPolicy>,
}

impl PluginRuntime {
    /// Creates a runtime from explicit parts.
    #[must_use]
    pub fn new(
        mut config: RuntimeConfig,
        providers: ProviderTable,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        config.normalize();
        Self {
            config,
            registry: Arc::new(PluginRegistry::new()),
            loader: ArchiveLoader::new(Arc::new(providers)),
            policy,
        }
    }

    /// Creates a runtime using every provider linked into the binary and a
    /// [`TierPolicy`] built from the access section of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`](toolforge_policy::PolicyError) when the
    /// configured role names are invalid.
    pub fn from_config(config: RuntimeConfig) -> PolicyResult<Self> {
        let roles = RoleMapping::new(&config.access.admin_roles, &config.access.premium_roles)?;
        let policy = TierPolicy::new(roles, config.access.fallback_level);
        Ok(Self::new(config, ProviderTable::from_inventory(), Arc::new(policy)))
    }

    /// Returns the runtime configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Returns the shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Returns the provider table archives are resolved against.
    #[must_use]
    pub fn providers(&self) -> &Arc<ProviderTable> {
        self.loader.providers()
    }

    /// Returns the access policy in force.
    #[must_use]
    pub fn policy(&self) -> &Arc<dyn AccessPolicy> {
        &self.policy
    }

    /// Lists the archives in the configured plugin directory.
    #[must_use]
    pub fn scan(&self) -> Vec<std::path::PathBuf> {
        scan(&self.config.plugin_dir, &self.config.archive_extension)
    }

    /// Scans and loads every archive sequentially.
    pub fn initialize(&self) -> LoadReport {
        let archives = self.scan();
        info!(
            dir = %self.config.plugin_dir.display(),
            archives = archives.len(),
            "loading archives"
        );

        let mut report = LoadReport::default();
        for path in &archives {
            report.record(self.load_archive(path));
        }
        self.log_report(&report);
        report
    }

    /// Scans the plugin directory and loads archives on the blocking pool.
    ///
    /// At most `max_parallel_loads` archives load at once. Results are
    /// published in scan order, one registry update per archive, so the
    /// outcome matches [`Self::initialize`].
    pub async fn initialize_parallel(&self) -> LoadReport {
        let archives = self.scan();
        let scheduler = LoadScheduler::new(SchedulerConfig::clamped(self.config.max_parallel_loads));
        info!(
            dir = %self.config.plugin_dir.display(),
            archives = archives.len(),
            max_concurrency = scheduler.config().max_concurrency().get(),
            "loading archives in parallel"
        );

        let jobs = archives.iter().map(|path| {
            let loader = self.loader.clone();
            let owned = path.clone();
            let queued = scheduler.spawn_blocking(move || loader.load(&owned));
            async move {
                let handle = queued.map_err(|err| aborted(path, &err))?;
                match handle.await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(err)) => Err(aborted(path, &err)),
                    Err(err) => Err(aborted(path, &err)),
                }
            }
        });
        let outcomes = join_all(jobs).await;

        let mut report = LoadReport::default();
        for outcome in outcomes {
            report.record(outcome.map(|context| self.publish(&context)).inspect_err(log_failure));
        }
        self.log_report(&report);
        report
    }

    /// Loads according to the configuration: in parallel when
    /// `parallel_load` is set, sequentially otherwise.
    pub async fn start(&self) -> LoadReport {
        if self.config.parallel_load {
            self.initialize_parallel().await
        } else {
            self.initialize()
        }
    }

    /// Loads one archive and publishes its tools.
    ///
    /// A tool name already registered is replaced; the previous context is
    /// released once no entry or in-flight call holds it.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] that caused the archive to be skipped.
    pub fn load_archive(&self, path: &Path) -> LoadResult<Vec<ToolName>> {
        self.loader
            .load(path)
            .map(|context| self.publish(&context))
            .inspect_err(log_failure)
    }

    /// Unregisters `name`, returning whether it was registered.
    pub fn unload(&self, name: &str) -> bool {
        self.registry.remove(name).is_some()
    }

    /// Unregisters every tool. Safe to call more than once.
    pub fn shutdown(&self) -> usize {
        let removed = self.registry.clear();
        info!(removed, "plugin runtime shut down");
        removed
    }

    /// Returns a dispatch service over this runtime's registry and policy.
    #[must_use]
    pub fn dispatcher(&self) -> DispatchService {
        DispatchService::new(Arc::clone(&self.registry), Arc::clone(&self.policy))
    }

    /// Returns the operational catalog over this runtime's registry.
    #[must_use]
    pub fn catalog(&self) -> ToolCatalog {
        ToolCatalog::new(self.dispatcher())
    }

    fn publish(&self, context: &Arc<IsolationContext>) -> Vec<ToolName> {
        self.registry.put_context(context)
    }

    fn log_report(&self, report: &LoadReport) {
        if report.is_clean() {
            info!(tools = report.loaded.len(), registered = self.registry.len(), "archives loaded");
        } else {
            warn!(
                tools = report.loaded.len(),
                failures = report.failures.len(),
                registered = self.registry.len(),
                "archives loaded with failures"
            );
        }
    }
}

impl std::fmt::Debug for PluginRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRuntime")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn aborted(path: &Path, err: &dyn std::fmt::Display) -> LoadError {
    LoadError::Aborted {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn log_failure(err: &LoadError) {
    error!(archive = %err.path().display(), error = %err, "skipping archive");
}

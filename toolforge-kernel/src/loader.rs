//! Loads one archive into its own isolation context.

use std::path::Path;
use std::sync::Arc;

use toolforge_tools::{IsolationContext, ProviderTable};
use tracing::info;

use crate::archive::ArchiveManifest;
use crate::error::{LoadError, LoadResult};

/// Turns archive files into populated isolation contexts.
///
/// Loading is all-or-nothing per archive: if any declared provider fails,
/// the instances already created for that archive are dropped with it.
#[derive(Debug, Clone)]
pub struct ArchiveLoader {
    providers: Arc<ProviderTable>,
}

impl ArchiveLoader {
    /// Creates a loader resolving provider ids against `providers`.
    #[must_use]
    pub fn new(providers: Arc<ProviderTable>) -> Self {
        Self { providers }
    }

    /// Returns the provider table used for resolution.
    #[must_use]
    pub fn providers(&self) -> &Arc<ProviderTable> {
        &self.providers
    }

    /// Loads the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the archive cannot be read, its manifest
    /// is malformed, or any declared provider fails to instantiate.
    pub fn load(&self, path: &Path) -> LoadResult<Arc<IsolationContext>> {
        let (archive, providers, config) = ArchiveManifest::read(path)?.into_parts();
        let mut builder = IsolationContext::builder(archive, path, config);

        for provider in &providers {
            builder
                .instantiate(&self.providers, provider)
                .map_err(|source| LoadError::Provider {
                    path: path.to_path_buf(),
                    provider: provider.clone(),
                    source,
                })?;
        }

        let context = builder.build();
        info!(
            archive = context.archive(),
            path = %path.display(),
            context = %context.id(),
            tools = context.len(),
            "archive loaded"
        );
        Ok(context)
    }
}

//! Archive discovery and provider manifests.
//!
//! An archive is a TOML file naming the providers it contributes:
//!
//! ```toml
//! [archive]
//! name = "codec-tools"
//! version = "1.2.0"
//! providers = ["codec.base64", "codec.hex"]
//!
//! [config]
//! alphabet = "url-safe"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use toolforge_primitives::FieldMap;
use tracing::{debug, warn};

use crate::error::{LoadError, LoadResult};

/// Lists the archives directly inside `dir` whose extension matches.
///
/// Matching ignores ASCII case and the result is sorted so load order is
/// stable. A missing or unreadable directory yields no archives.
#[must_use]
pub fn scan(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "archive directory unavailable");
            return Vec::new();
        }
    };

    let mut archives: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| has_extension(path, extension) && path.is_file())
        .collect();
    archives.sort();

    debug!(dir = %dir.display(), count = archives.len(), "scanned archive directory");
    archives
}

fn has_extension(path: &Path, extension: &str) -> bool {
    let extension = extension.trim().trim_start_matches('.');
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Parsed provider manifest of one archive.
#[derive(Debug, Clone)]
pub struct ArchiveManifest {
    name: String,
    version: Option<String>,
    providers: Vec<String>,
    config: FieldMap,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    archive: RawArchive,
    #[serde(default)]
    config: toml::Table,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArchive {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    providers: Vec<String>,
}

impl ArchiveManifest {
    /// Reads and validates the manifest stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Unreadable`] when the file cannot be read and
    /// [`LoadError::MalformedManifest`] when it does not parse or declares
    /// no providers.
    pub fn read(path: &Path) -> LoadResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    /// Parses manifest text attributed to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedManifest`] on invalid TOML, a blank
    /// archive name, or an empty or blank provider list.
    pub fn parse(path: &Path, raw: &str) -> LoadResult<Self> {
        let manifest: RawManifest =
            toml::from_str(raw).map_err(|err| LoadError::malformed(path, err.message()))?;

        let name = manifest.archive.name.trim();
        if name.is_empty() {
            return Err(LoadError::malformed(path, "archive.name cannot be empty"));
        }
        if manifest.archive.providers.is_empty() {
            return Err(LoadError::malformed(path, "archive.providers cannot be empty"));
        }
        if manifest.archive.providers.iter().any(|id| id.trim().is_empty()) {
            return Err(LoadError::malformed(path, "archive.providers contains a blank id"));
        }

        let config = match serde_json::to_value(&manifest.config) {
            Ok(Value::Object(map)) => map,
            Ok(_) => FieldMap::new(),
            Err(err) => return Err(LoadError::malformed(path, format!("config: {err}"))),
        };

        Ok(Self {
            name: name.to_owned(),
            version: manifest.archive.version,
            providers: manifest
                .archive
                .providers
                .into_iter()
                .map(|id| id.trim().to_owned())
                .collect(),
            config,
        })
    }

    /// Archive name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional archive version.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Provider ids in declaration order.
    #[must_use]
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    /// Archive-private configuration handed to every provider.
    #[must_use]
    pub fn config(&self) -> &FieldMap {
        &self.config
    }

    pub(crate) fn into_parts(self) -> (String, Vec<String>, FieldMap) {
        (self.name, self.providers, self.config)
    }
}

//! Strongly typed configuration schema.

use std::path::PathBuf;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use toolforge_primitives::AccessLevel;

const DEFAULT_PLUGIN_DIR: &str = "plugins";
const DEFAULT_ARCHIVE_EXTENSION: &str = "tpk";
const DEFAULT_MAX_PARALLEL_LOADS: usize = 4;
const DEFAULT_LOG_FILTER: &str = "info";

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Directory scanned for archives at startup.
    pub plugin_dir: PathBuf,
    /// File extension identifying archives, without the dot.
    pub archive_extension: String,
    /// Load archives on the blocking pool instead of sequentially.
    pub parallel_load: bool,
    /// Upper bound on concurrent archive loads when `parallel_load` is set.
    pub max_parallel_loads: usize,
    /// Role mapping and descriptor fallback.
    pub access: AccessConfig,
    /// Default `tracing` filter directive, used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            plugin_dir: PathBuf::from(DEFAULT_PLUGIN_DIR),
            archive_extension: DEFAULT_ARCHIVE_EXTENSION.into(),
            parallel_load: false,
            max_parallel_loads: DEFAULT_MAX_PARALLEL_LOADS,
            access: AccessConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

impl RuntimeConfig {
    /// Canonicalizes values that have more than one accepted spelling.
    ///
    /// The archive extension loses surrounding whitespace and any leading
    /// dots, so `" tpk"`, `".tpk"` and `"tpk"` all select the same files.
    pub fn normalize(&mut self) {
        let extension = self.archive_extension.trim().trim_start_matches('.').trim();
        if extension != self.archive_extension {
            self.archive_extension = extension.to_owned();
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Fails when the archive extension is empty or still contains a dot
    /// after [`Self::normalize`], when the
    /// load parallelism is zero, or when the access section is invalid.
    pub fn validate(&self) -> Result<()> {
        let extension = self.archive_extension.trim();
        if extension.is_empty() {
            bail!("archive_extension cannot be empty");
        }
        if extension.contains('.') {
            bail!("archive_extension must not contain a dot: `{extension}`");
        }
        if self.max_parallel_loads == 0 {
            bail!("max_parallel_loads must be greater than zero");
        }
        self.access.validate()
    }
}

/// Access policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// Roles granting the admin tier.
    pub admin_roles: Vec<String>,
    /// Roles granting the premium tier.
    pub premium_roles: Vec<String>,
    /// Level required from callers when a tool's descriptor is unavailable.
    ///
    /// Defaults to `normal`. This keeps tools with broken metadata
    /// reachable and should only be changed deliberately.
    pub fallback_level: AccessLevel,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_roles: vec!["admin".into()],
            premium_roles: vec!["premium".into()],
            fallback_level: AccessLevel::Normal,
        }
    }
}

impl AccessConfig {
    /// Validates the role lists.
    ///
    /// # Errors
    ///
    /// Fails when either list has no non-blank role.
    pub fn validate(&self) -> Result<()> {
        if self.admin_roles.iter().all(|role| role.trim().is_empty()) {
            bail!("access.admin_roles must name at least one role");
        }
        if self.premium_roles.iter().all(|role| role.trim().is_empty()) {
            bail!("access.premium_roles must name at least one role");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RuntimeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.archive_extension, "tpk");
        assert_eq!(config.access.fallback_level, AccessLevel::Normal);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: RuntimeConfig = toml::from_str(
            r#"
plugin_dir = "/opt/tools"

[access]
admin_roles = ["ROLE_ADMIN"]
"#,
        )
        .unwrap();

        assert_eq!(config.plugin_dir, PathBuf::from("/opt/tools"));
        assert_eq!(config.access.admin_roles, ["ROLE_ADMIN"]);
        assert_eq!(config.access.premium_roles, ["premium"]);
        assert!(!config.parallel_load);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = RuntimeConfig {
            archive_extension: " ".into(),
            ..RuntimeConfig::default()
        };
        assert!(config.validate().is_err());

        config.archive_extension = "tar.gz".into();
        assert!(config.validate().is_err());

        config.archive_extension = "tpk".into();
        config.max_parallel_loads = 0;
        assert!(config.validate().is_err());

        config.max_parallel_loads = 1;
        config.access.premium_roles = vec![String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = toml::from_str::<RuntimeConfig>("plugin_directory = \"x\"");
        assert!(result.is_err());
    }
}

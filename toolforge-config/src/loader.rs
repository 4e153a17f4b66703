//! Configuration loading from files and the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::schema::RuntimeConfig;

/// Overrides [`RuntimeConfig::plugin_dir`].
pub const ENV_PLUGIN_DIR: &str = "TOOLFORGE_PLUGIN_DIR";
/// Overrides [`RuntimeConfig::archive_extension`].
pub const ENV_ARCHIVE_EXTENSION: &str = "TOOLFORGE_ARCHIVE_EXTENSION";
/// Overrides [`RuntimeConfig::parallel_load`].
pub const ENV_PARALLEL_LOAD: &str = "TOOLFORGE_PARALLEL_LOAD";
/// Overrides [`RuntimeConfig::log_filter`].
pub const ENV_LOG: &str = "TOOLFORGE_LOG";

impl RuntimeConfig {
    /// Reads, normalizes and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, does not parse, or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.normalize();
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        info!(path = %path.display(), "loaded runtime configuration");
        Ok(config)
    }

    /// Loads configuration from `path` when given, else defaults, then
    /// applies process environment overrides.
    ///
    /// # Errors
    ///
    /// Fails when the file is unreadable or invalid, or an override does not
    /// parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `TOOLFORGE_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Fails when an override does not parse or leaves the configuration
    /// invalid.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_PLUGIN_DIR) {
            debug!(key = ENV_PLUGIN_DIR, value = %dir, "config override");
            self.plugin_dir = PathBuf::from(dir);
        }
        if let Some(extension) = lookup(ENV_ARCHIVE_EXTENSION) {
            debug!(key = ENV_ARCHIVE_EXTENSION, value = %extension, "config override");
            self.archive_extension = extension;
        }
        if let Some(flag) = lookup(ENV_PARALLEL_LOAD) {
            self.parallel_load = parse_flag(&flag)
                .with_context(|| format!("invalid value for {ENV_PARALLEL_LOAD}"))?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        self.normalize();
        self.validate()
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got `{other}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "archive_extension = \"plugin\"\nparallel_load = true").unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.archive_extension, "plugin");
        assert!(config.parallel_load);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RuntimeConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = RuntimeConfig::default();
        config
            .apply_env(env(&[
                (ENV_PLUGIN_DIR, "/srv/tools"),
                (ENV_ARCHIVE_EXTENSION, ".jar"),
                (ENV_PARALLEL_LOAD, "yes"),
                (ENV_LOG, "debug"),
            ]))
            .unwrap();

        assert_eq!(config.plugin_dir, PathBuf::from("/srv/tools"));
        assert_eq!(config.archive_extension, "jar");
        assert!(config.parallel_load);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn extension_spellings_agree_between_file_and_env() {
        for spelling in [" tpk", ".tpk", "tpk ", "TPK"] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "archive_extension = \"{spelling}\"").unwrap();
            let from_file = RuntimeConfig::from_file(file.path()).unwrap();

            let mut from_env = RuntimeConfig::default();
            from_env
                .apply_env(env(&[(ENV_ARCHIVE_EXTENSION, spelling)]))
                .unwrap();

            assert_eq!(from_file.archive_extension, from_env.archive_extension);
            assert!(from_file.archive_extension.eq_ignore_ascii_case("tpk"));
        }
    }

    #[test]
    fn dotted_extension_is_rejected_everywhere() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "archive_extension = \"tar.gz\"").unwrap();
        assert!(RuntimeConfig::from_file(file.path()).is_err());

        let mut config = RuntimeConfig::default();
        assert!(config.apply_env(env(&[(ENV_ARCHIVE_EXTENSION, ".tar.gz")])).is_err());
    }

    #[test]
    fn bad_flag_is_an_error() {
        let mut config = RuntimeConfig::default();
        let err = config
            .apply_env(env(&[(ENV_PARALLEL_LOAD, "sometimes")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("sometimes"));
    }
}

//! One-call host startup.

use std::path::Path;

use anyhow::{Context, Result};
use toolforge_config::RuntimeConfig;
use toolforge_kernel::{LoadReport, PluginRuntime};
use tracing::info;

/// Loads configuration, installs tracing, builds the runtime, and performs
/// the initial archive load.
///
/// Configuration comes from `config_path` when given, otherwise defaults,
/// with `TOOLFORGE_*` environment overrides applied on top. Archives that
/// fail to load are reported, not fatal.
///
/// # Errors
///
/// Fails when the configuration cannot be read or is invalid, when the log
/// filter is invalid, or when the configured role names are rejected.
pub async fn bootstrap(config_path: Option<&Path>) -> Result<(PluginRuntime, LoadReport)> {
    let config = RuntimeConfig::load(config_path)?;
    toolforge_telemetry::init_tracing(&config.log_filter)?;

    let runtime =
        PluginRuntime::from_config(config).context("invalid access configuration")?;
    info!(
        providers = runtime.providers().len(),
        dir = %runtime.config().plugin_dir.display(),
        "plugin runtime starting"
    );

    let report = runtime.start().await;
    Ok((runtime, report))
}

//! Structured tracing helpers.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Builds a filter from `RUST_LOG`, falling back to `default_directive`.
///
/// # Errors
///
/// Fails when `RUST_LOG` is unset and `default_directive` does not parse.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive)
            .with_context(|| format!("invalid log filter `{default_directive}`")),
    }
}

/// Installs a global fmt subscriber.
///
/// Returns `Ok(false)` when a global subscriber was already installed, so
/// repeated calls are harmless.
///
/// # Errors
///
/// Fails when the filter directive does not parse.
pub fn init_tracing(default_directive: &str) -> Result<bool> {
    let filter = env_filter(default_directive)?;
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(default_directive, "tracing subscriber installed");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directive() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(env_filter("toolforge=verbose").is_err());
        }
    }

    #[test]
    fn second_init_is_harmless() {
        let _ = init_tracing("warn").unwrap();
        assert!(!init_tracing("warn").unwrap());
    }
}

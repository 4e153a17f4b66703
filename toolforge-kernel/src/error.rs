//! Load-time and dispatch-time error taxonomy.

use std::path::{Path, PathBuf};

use thiserror::Error;
use toolforge_primitives::{AccessLevel, Tier};
use toolforge_tools::ToolError;

/// Failure to load one archive. Never fatal to a scan.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The archive file could not be read.
    #[error("archive {} is unreadable: {source}", path.display())]
    Unreadable {
        /// Archive path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The provider manifest is missing, malformed, or incomplete.
    #[error("archive {} has a malformed manifest: {reason}", path.display())]
    MalformedManifest {
        /// Archive path.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },

    /// A declared provider could not be resolved or instantiated.
    #[error("archive {} failed to instantiate provider `{provider}`: {source}", path.display())]
    Provider {
        /// Archive path.
        path: PathBuf,
        /// Provider id declared in the manifest.
        provider: String,
        /// Underlying provider failure.
        #[source]
        source: ToolError,
    },

    /// The load task was cancelled or crashed before finishing.
    #[error("loading archive {} was aborted: {reason}", path.display())]
    Aborted {
        /// Archive path.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },
}

impl LoadError {
    /// Returns the archive the error concerns.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Unreadable { path, .. }
            | Self::MalformedManifest { path, .. }
            | Self::Provider { path, .. }
            | Self::Aborted { path, .. } => path,
        }
    }

    pub(crate) fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedManifest {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Result alias for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Classified failure returned by the dispatch service.
///
/// Tool execution failures are not errors here: they are normalized into a
/// failure output instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// No tool is registered under the requested name.
    #[error("tool `{name}` not found")]
    NotFound {
        /// Requested name.
        name: String,
    },

    /// The caller's tier does not meet the tool's required level.
    #[error("access denied: tool requires {required} access, caller tier is {tier}")]
    AccessDenied {
        /// Tier the caller was evaluated at.
        tier: Tier,
        /// Level the tool demands.
        required: AccessLevel,
    },

    /// The request could not be turned into tool input.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Human-readable reason.
        reason: String,
    },
}

impl DispatchError {
    /// HTTP-style status an external transport should surface.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::AccessDenied { .. } => 403,
            Self::InvalidRequest { .. } => 400,
        }
    }

    /// Short machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AccessDenied { .. } => "forbidden",
            Self::InvalidRequest { .. } => "bad_request",
        }
    }
}

/// Result alias for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_errors_map_to_statuses() {
        let not_found = DispatchError::NotFound { name: "x".into() };
        assert_eq!(not_found.status_code(), 404);
        assert_eq!(not_found.kind(), "not_found");

        let denied = DispatchError::AccessDenied {
            tier: Tier::Normal,
            required: AccessLevel::Admin,
        };
        assert_eq!(denied.status_code(), 403);
        assert_eq!(
            denied.to_string(),
            "access denied: tool requires admin access, caller tier is normal"
        );
    }

    #[test]
    fn load_errors_expose_path() {
        let err = LoadError::malformed(Path::new("/p/a.tpk"), "no providers");
        assert_eq!(err.path(), Path::new("/p/a.tpk"));
        assert!(err.to_string().contains("no providers"));
    }
}

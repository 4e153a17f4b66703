//! The tool contract and the panic guard applied around tool code.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use toolforge_primitives::{FieldMap, ToolDescriptor};

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Contract every loadable tool implements.
///
/// Tools are expected to be synchronous, pure, and fast. The runtime imposes
/// no timeout; a slow tool only stalls its own caller.
pub trait Tool: Send + Sync {
    /// Name the tool is registered under.
    fn name(&self) -> &str;

    /// Returns the tool's self-description.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the registry treats a failure as
    /// "descriptor unavailable".
    fn metadata(&self) -> ToolResult<ToolDescriptor>;

    /// Processes input fields into output fields.
    ///
    /// Output conventionally carries a boolean `success` flag and, on
    /// failure, an `error` message (see [`crate::output`]).
    ///
    /// # Errors
    ///
    /// Any error is normalized into a failure output by the dispatch layer.
    fn process(&self, input: FieldMap) -> ToolResult<FieldMap>;
}

impl std::fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Errors produced by tools, providers, and the guard around them.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool metadata could not be produced.
    #[error("invalid tool metadata: {reason}")]
    InvalidMetadata {
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// Tool execution failed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },

    /// Requested provider is not in the registration table.
    #[error("provider `{id}` is not registered")]
    UnknownProvider {
        /// Identifier that failed to resolve.
        id: String,
    },

    /// A provider factory could not construct its tool.
    #[error("provider `{id}` failed: {reason}")]
    Provider {
        /// Provider identifier.
        id: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// Tool code panicked.
    #[error("tool panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Creates a metadata error from the supplied reason.
    #[must_use]
    pub fn invalid_metadata(reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            reason: reason.into(),
        }
    }
}

/// Runs tool code, converting a panic into [`ToolError::Panicked`].
///
/// Panics are only caught when the binary unwinds; with `panic = "abort"`
/// the process still terminates.
///
/// # Errors
///
/// Returns the closure's own error, or [`ToolError::Panicked`] when it
/// unwinds.
pub fn guarded<T>(f: impl FnOnce() -> ToolResult<T>) -> ToolResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(ToolError::Panicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

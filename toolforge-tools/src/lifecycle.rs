//! Lifecycle state machine for loaded tool instances.

use thiserror::Error;
use toolforge_primitives::ToolName;
use tracing::debug;

/// States a tool instance can occupy. There is no upgrade in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    /// Not reachable through the registry.
    Unloaded,
    /// Published in the registry and dispatchable.
    Loaded,
}

impl ToolState {
    /// Returns `true` while the instance is dispatchable.
    #[must_use]
    pub const fn is_loaded(self) -> bool {
        matches!(self, Self::Loaded)
    }
}

/// Events that trigger lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEvent {
    /// The instance was discovered and registered.
    Discover,
    /// The instance was removed by an explicit unload.
    Unload,
    /// Another instance took over the same name.
    Replace,
}

/// Lifecycle state manager for one registry entry.
#[derive(Debug, Clone)]
pub struct ToolLifecycle {
    name: ToolName,
    state: ToolState,
}

impl ToolLifecycle {
    /// Constructs a lifecycle controller in the [`ToolState::Unloaded`] state.
    #[must_use]
    pub const fn new(name: ToolName) -> Self {
        Self {
            name,
            state: ToolState::Unloaded,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ToolState {
        self.state
    }

    /// Applies an event, returning the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] when the event is not
    /// allowed from the current state.
    pub fn transition(&mut self, event: ToolEvent) -> Result<ToolState, LifecycleError> {
        let next = match (self.state, event) {
            (ToolState::Unloaded, ToolEvent::Discover) => ToolState::Loaded,
            (ToolState::Loaded, ToolEvent::Unload | ToolEvent::Replace) => ToolState::Unloaded,
            (from, event) => {
                return Err(LifecycleError::InvalidTransition {
                    name: self.name.clone(),
                    from,
                    event,
                });
            }
        };

        debug!(tool = %self.name, from = ?self.state, to = ?next, ?event, "tool lifecycle transition");
        self.state = next;
        Ok(next)
    }
}

/// Errors emitted by the lifecycle controller.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Transition was not permitted from the current state.
    #[error("invalid lifecycle transition from {from:?} via {event:?} for tool `{name}`")]
    InvalidTransition {
        /// Tool whose transition failed.
        name: ToolName,
        /// State prior to the attempted transition.
        from: ToolState,
        /// Event that triggered the failure.
        event: ToolEvent,
    },
}

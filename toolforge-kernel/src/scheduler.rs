//! Bounded scheduler for archive loads on the blocking pool.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Maximum number of archives loaded at once.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    max_concurrency: NonZeroUsize,
}

impl SchedulerConfig {
    /// Creates a new configuration with the supplied concurrency limit.
    #[must_use]
    pub const fn new(max_concurrency: NonZeroUsize) -> Self {
        Self { max_concurrency }
    }

    /// Creates a configuration from a plain count, clamping zero to one.
    #[must_use]
    pub fn clamped(max_concurrency: usize) -> Self {
        Self::new(NonZeroUsize::new(max_concurrency).unwrap_or(NonZeroUsize::MIN))
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub const fn max_concurrency(self) -> NonZeroUsize {
        self.max_concurrency
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::clamped(4)
    }
}

/// Runs blocking load jobs while enforcing a concurrency limit.
///
/// Archive loading reads files and runs provider factories, both blocking,
/// so jobs execute on tokio's blocking pool behind a semaphore permit.
#[derive(Debug, Clone)]
pub struct LoadScheduler {
    semaphore: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
    config: SchedulerConfig,
}

impl LoadScheduler {
    /// Constructs a scheduler using the provided configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        let permits = config.max_concurrency().get();
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            closed: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Returns the associated configuration.
    #[must_use]
    pub const fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Returns `true` if the scheduler has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the scheduler. Jobs still waiting for a permit resolve to
    /// [`SchedulerError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.semaphore.close();
    }

    /// Queues a blocking job.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] when the scheduler is closed before
    /// the job is queued. The returned handle resolves to
    /// [`SchedulerError::Closed`] if the scheduler closes while the job waits
    /// for a permit, and to [`SchedulerError::Crashed`] if the job panics.
    pub fn spawn_blocking<F, T>(&self, job: F) -> SchedulerResult<JoinHandle<SchedulerResult<T>>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(SchedulerError::Closed);
        }

        let semaphore = Arc::clone(&self.semaphore);

        let handle = tokio::spawn(async move {
            let permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| SchedulerError::Closed)?;
            let output = tokio::task::spawn_blocking(job).await;
            drop(permit);
            output.map_err(|err| SchedulerError::Crashed(err.to_string()))
        });

        Ok(handle)
    }
}

impl Default for LoadScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

/// Errors produced by the scheduler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Scheduler is closed and will not accept new jobs.
    #[error("scheduler closed")]
    Closed,

    /// The job panicked or was cancelled.
    #[error("load job crashed: {0}")]
    Crashed(String),
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

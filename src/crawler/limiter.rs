use std::sync::Arc;
use anyhow::{Context, Result};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed pool of permits capping how many page tasks touch the network,
/// the disk or the parser at the same time. Spawning stays unbounded.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    permits: Arc<Semaphore>,
    size: usize,
}

impl ConcurrencyLimiter {
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Waits for a free permit. The permit goes back to the pool when dropped,
    /// whichever way the holder exits.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .context("concurrency limiter was closed")
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

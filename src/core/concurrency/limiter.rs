//! Concurrency limiter for heavy export operations
//!
//! A counting semaphore bounds how many batch, archive and portfolio
//! operations run at once. Acquisition waits at most `acquire_timeout`; past
//! that the request fails fast with `ConcurrencyExceeded` instead of queuing.

use crate::domain::errors::CourierError;
use crate::domain::result::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Slot held by a running heavy operation
///
/// The slot is released when the permit is dropped, on every exit path of the
/// worker including panics and cancellation.
#[derive(Debug)]
pub struct ExportPermit {
    _permit: OwnedSemaphorePermit,
}

/// Bounds the number of heavy exports running at once
#[derive(Debug, Clone)]
pub struct ConcurrencyController {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    acquire_timeout: Duration,
}

impl ConcurrencyController {
    pub fn new(max_concurrent: usize, acquire_timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            acquire_timeout,
        }
    }

    /// Waits up to the acquire timeout for a free slot
    ///
    /// # Errors
    ///
    /// Returns `ConcurrencyExceeded` when no slot frees up in time, or when
    /// the controller has been closed.
    pub async fn acquire(&self) -> Result<ExportPermit> {
        let acquire = self.semaphore.clone().acquire_owned();
        match tokio::time::timeout(self.acquire_timeout, acquire).await {
            Ok(Ok(permit)) => {
                tracing::debug!(
                    active = self.active(),
                    max = self.max_concurrent,
                    "Acquired export slot"
                );
                Ok(ExportPermit { _permit: permit })
            }
            Ok(Err(_)) => Err(CourierError::ConcurrencyExceeded(
                "export slots are closed".to_string(),
            )),
            Err(_) => Err(CourierError::ConcurrencyExceeded(format!(
                "concurrency limit reached: {} exports already running",
                self.active()
            ))),
        }
    }

    /// Number of slots currently held
    pub fn active(&self) -> usize {
        self.max_concurrent
            .saturating_sub(self.semaphore.available_permits())
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Rejects every pending and future acquisition
    pub fn close(&self) {
        self.semaphore.close();
    }
}

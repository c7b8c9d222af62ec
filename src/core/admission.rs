//! Download admission gate.
//!
//! A counting semaphore capping the number of simultaneous external download
//! calls. The permit is an owned RAII guard: whichever way the guarded
//! download exits (success, error, task cancellation), dropping the guard
//! returns the slot.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{timeout, Duration};

use crate::core::error::AppError;

/// A held download slot. Dropping it frees the slot.
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

#[derive(Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    wait_limit: Option<Duration>,
}

impl AdmissionGate {
    /// Creates a gate with `max_parallel` slots and an optional bounded wait.
    ///
    /// With `wait_limit = None` callers queue indefinitely, matching the
    /// plain-semaphore behavior. With a limit set, a caller that waits longer
    /// is rejected with [`AppError::Overloaded`] instead of queuing forever.
    pub fn new(max_parallel: usize, wait_limit: Option<Duration>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_parallel)),
            wait_limit,
        }
    }

    /// Waits for a free slot and takes it.
    pub async fn acquire(&self) -> Result<AdmissionPermit, AppError> {
        let acquired = match self.wait_limit {
            Some(limit) => timeout(limit, Arc::clone(&self.semaphore).acquire_owned())
                .await
                .map_err(|_| AppError::Overloaded)?,
            None => Arc::clone(&self.semaphore).acquire_owned().await,
        };
        // The semaphore is never closed, so acquire_owned only fails if it
        // were; treat that as the gate being unavailable.
        let permit = acquired.map_err(|_| AppError::Overloaded)?;
        Ok(AdmissionPermit { _permit: permit })
    }

    /// Slots currently free.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

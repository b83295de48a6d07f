//! Concurrency limiting for probes.
//!
//! A `ProbeLimiter` hands out a fixed number of slots. Every probe holds one
//! slot for the duration of its HTTP fetch, so the number of outstanding
//! requests never exceeds the capacity no matter how many sites or handles
//! are being probed. Share one limiter (via `Arc`) between engines to keep a
//! single process-wide cap.

use crate::error::InvestigoError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounded pool of probe slots.
#[derive(Debug)]
pub struct ProbeLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One acquired slot. The slot is returned when this value is dropped.
#[derive(Debug)]
pub struct SlotPermit {
    _permit: OwnedSemaphorePermit,
}

impl SlotPermit {
    /// Return the slot to the limiter.
    pub fn release(self) {}
}

impl ProbeLimiter {
    /// Create a limiter with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a slot is free and take it.
    ///
    /// Waiters are served in FIFO order, so no task starves.
    pub async fn acquire(&self) -> Result<SlotPermit, InvestigoError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| InvestigoError::internal("probe limiter was closed"))?;
        Ok(SlotPermit { _permit: permit })
    }

    /// Take a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<SlotPermit> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| SlotPermit { _permit: permit })
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}

impl Default for ProbeLimiter {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_CONCURRENCY)
    }
}

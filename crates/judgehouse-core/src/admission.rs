//! Admission Controller (C5): a non-blocking ceiling on concurrent
//! judgments.
//!
//! Backed by a [`tokio::sync::Semaphore`] used with
//! [`try_acquire_owned`](Semaphore::try_acquire_owned), not
//! [`acquire_owned`](Semaphore::acquire_owned) — admission is a try-and-fail
//! check, not a queue. The returned [`AdmissionPermit`] holds the permit for
//! the caller's Execution lifetime and releases it on drop, unconditionally,
//! which is what makes "release on every exit path including panics"
//! structural rather than something every call site has to remember.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Raised when the admission ceiling is already saturated.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Request throttled, service reached max allowed requests")]
pub struct AdmissionError;

/// A held admission slot. In-flight gauge and throttle counter are updated
/// through the `metrics` facade, not this type directly, so a metrics
/// backend can be wired in (or swapped) without touching admission logic.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

/// Bounds concurrent judgments to a fixed ceiling.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    semaphore: Arc<Semaphore>,
    max_requests: usize,
}

impl AdmissionController {
    /// Create a controller that admits at most `max_requests` concurrent
    /// judgments.
    pub fn new(max_requests: usize) -> Self {
        metrics::gauge!("judgehouse.admission.in_flight").set(0.0);
        Self {
            semaphore: Arc::new(Semaphore::new(max_requests)),
            max_requests,
        }
    }

    /// Try to admit one more judgment.
    ///
    /// Returns immediately: either an [`AdmissionPermit`] is admitted, or
    /// [`AdmissionError`] is returned and the throttle counter is
    /// incremented. Never blocks waiting for a slot to free up.
    pub fn try_admit(&self) -> Result<AdmissionPermit, AdmissionError> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => {
                metrics::gauge!("judgehouse.admission.in_flight").increment(1.0);
                Ok(AdmissionPermit { _permit: permit })
            }
            Err(_) => {
                metrics::counter!("judgehouse.admission.throttled").increment(1);
                Err(AdmissionError)
            }
        }
    }

    /// The configured ceiling.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Number of slots currently available (not in flight).
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        metrics::gauge!("judgehouse.admission.in_flight").decrement(1.0);
    }
}

//! Emergency fast path: a dedicated worker lane over the emergency sub-queue.
//!
//! Fast-path workers use the shortened occupancy and share the runway pool
//! with the main lane, so an emergency can still wait for a runway; the
//! pool's wait ordering guarantees it is served before less urgent waiters.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::core::context::SchedulerContext;
use crate::core::landing_queue::LandingRequest;
use crate::core::worker_pool::{Lane, PoolStats, WorkerPool};
use crate::core::SchedulerError;
use crate::util::ids::{AircraftId, Priority};

/// Worker pool bound to the emergency lane.
#[derive(Debug)]
pub struct EmergencyFastPath {
    pool: WorkerPool,
}

impl EmergencyFastPath {
    /// Spawn the configured number of emergency workers.
    pub fn start(ctx: &Arc<SchedulerContext>) -> Result<Self, SchedulerError> {
        let pool = WorkerPool::start(Lane::Emergency, ctx, ctx.config.emergency_worker_count)?;
        Ok(Self { pool })
    }

    /// Counter snapshot of the emergency lane.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Join the emergency workers; see [`WorkerPool::join`].
    pub fn join(&self, timeout: Duration) -> usize {
        self.pool.join(timeout)
    }
}

/// Move a pending request from the main queue to the emergency sub-queue at
/// `priority`, keeping its enqueue sequence. Returns `false` when the aircraft
/// has no pending main-queue request (already dequeued or never queued).
pub fn promote(ctx: &SchedulerContext, aircraft_id: &AircraftId, priority: Priority) -> bool {
    let Some(mut request) = ctx.main_queue.remove(aircraft_id) else {
        return false;
    };
    request.priority = priority;
    let sequence = request.sequence;
    match ctx.emergency_queue.enqueue(request) {
        Ok(()) => {
            info!(aircraft_id = %aircraft_id, priority, sequence, "request moved to emergency fast path");
            true
        }
        Err(SchedulerError::AlreadyQueued(_)) => true,
        Err(e) => {
            // Queue closed during shutdown; the request is dropped with it.
            tracing::debug!(aircraft_id = %aircraft_id, error = %e, "fast path unavailable");
            false
        }
    }
}

/// Enqueue a request directly on the fast path, bypassing the main queue.
pub fn enqueue_immediate(
    ctx: &SchedulerContext,
    request: LandingRequest,
) -> Result<(), SchedulerError> {
    ctx.emergency_queue.enqueue(request)
}

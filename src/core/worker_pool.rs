//! Landing workers on dedicated OS threads.
//!
//! Each worker loops: dequeue (blocking) → acquire a runway (blocking) →
//! `LANDING` → occupy the runway → `LANDED` → release → record. A worker
//! never lets one request's error or panic end its loop; it exits only when
//! its queue closes or the pool shuts down.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::core::aircraft::AircraftStatus;
use crate::core::context::SchedulerContext;
use crate::core::landing_queue::{LandingQueue, LandingRequest};
use crate::core::runway_pool::AcquireTicket;
use crate::core::sink::{EventCategory, LandingRecord, Severity};
use crate::core::SchedulerError;
use crate::util::clock::now_ms;
use crate::util::ids::RunwayId;

/// Which queue a pool serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    /// The main landing queue.
    Main,
    /// The emergency sub-queue.
    Emergency,
}

impl Lane {
    /// Short lane name used in thread names and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Emergency => "emergency",
        }
    }

    /// The queue this lane drains.
    #[must_use]
    pub const fn queue(self, ctx: &SchedulerContext) -> &LandingQueue {
        match self {
            Self::Main => &ctx.main_queue,
            Self::Emergency => &ctx.emergency_queue,
        }
    }

    /// Runway occupancy for a landing served by this lane.
    #[must_use]
    pub const fn landing_duration(self, config: &SchedulerConfig) -> Duration {
        match self {
            Self::Main => config.landing_duration(),
            Self::Emergency => config.emergency_landing_duration(),
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to one dequeued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingOutcome {
    /// The aircraft landed on `runway`.
    Landed {
        /// Runway used.
        runway: RunwayId,
    },
    /// The request was stale and dropped without landing.
    Discarded {
        /// Why it was dropped.
        reason: &'static str,
    },
}

/// Statistics about one worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Lane served.
    pub lane: Lane,
    /// Number of worker threads.
    pub worker_count: usize,
    /// Landings currently being handled.
    pub active_landings: u64,
    /// Completed landings.
    pub completed_landings: u64,
    /// Stale requests dropped.
    pub discarded_requests: u64,
    /// Requests whose handling failed or panicked.
    pub failed_requests: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_landings: AtomicU64,
    pub completed_landings: AtomicU64,
    pub discarded_requests: AtomicU64,
    pub failed_requests: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, lane: Lane, worker_count: usize) -> PoolStats {
        PoolStats {
            lane,
            worker_count,
            active_landings: self.active_landings.load(Ordering::Relaxed),
            completed_landings: self.completed_landings.load(Ordering::Relaxed),
            discarded_requests: self.discarded_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
        }
    }
}

/// Fixed-size set of landing workers bound to one lane.
pub struct WorkerPool {
    lane: Lane,
    worker_count: usize,
    counters: Arc<PoolCounters>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers draining `lane`'s queue.
    pub fn start(
        lane: Lane,
        ctx: &Arc<SchedulerContext>,
        worker_count: usize,
    ) -> Result<Self, SchedulerError> {
        let counters = Arc::new(PoolCounters::default());
        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let ctx = Arc::clone(ctx);
            let counters = Arc::clone(&counters);
            let handle = thread::Builder::new()
                .name(format!("atc-{}-{worker_id}", lane.name()))
                .spawn(move || worker_loop(&ctx, lane, worker_id, &counters))
                .map_err(|e| SchedulerError::WorkerSpawn(e.to_string()))?;
            workers.push(handle);
        }
        info!(lane = %lane, worker_count, "worker pool started");
        Ok(Self {
            lane,
            worker_count,
            counters,
            workers: Mutex::new(workers),
        })
    }

    /// Lane served.
    #[must_use]
    pub const fn lane(&self) -> Lane {
        self.lane
    }

    /// Number of workers.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.lane, self.worker_count)
    }

    /// Join every worker, waiting at most `timeout` for each; workers that
    /// do not exit in time are detached. The queue must be closed first.
    /// Returns the number of workers that exited cleanly.
    pub fn join(&self, timeout: Duration) -> usize {
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        let mut joined = 0;
        for (worker_id, worker) in workers.into_iter().enumerate() {
            // Join on a helper thread so a stuck worker cannot hang shutdown.
            let (tx, rx) = std::sync::mpsc::channel();
            let join_thread = thread::spawn(move || {
                let _ = tx.send(worker.join().is_ok());
            });
            match rx.recv_timeout(timeout) {
                Ok(true) => {
                    joined += 1;
                    debug!(lane = %self.lane, worker_id, "worker joined");
                }
                Ok(false) => warn!(lane = %self.lane, worker_id, "worker panicked"),
                Err(_) => {
                    warn!(lane = %self.lane, worker_id, "worker did not exit within timeout, detaching");
                    continue;
                }
            }
            let _ = join_thread.join();
        }
        info!(lane = %self.lane, joined, "worker pool shut down");
        joined
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("lane", &self.lane)
            .field("worker_count", &self.worker_count)
            .finish_non_exhaustive()
    }
}

fn worker_loop(ctx: &SchedulerContext, lane: Lane, worker_id: usize, counters: &PoolCounters) {
    debug!(lane = %lane, worker_id, "worker thread started");
    let queue = lane.queue(ctx);
    while let Some(request) = queue.dequeue_blocking() {
        if ctx.stop.is_triggered() {
            break;
        }
        let aircraft_id = request.aircraft_id.clone();
        counters.active_landings.fetch_add(1, Ordering::Relaxed);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            process_request(ctx, lane, worker_id, request)
        }));
        counters.active_landings.fetch_sub(1, Ordering::Relaxed);

        match result {
            Ok(Ok(LandingOutcome::Landed { runway })) => {
                counters.completed_landings.fetch_add(1, Ordering::Relaxed);
                info!(lane = %lane, worker_id, aircraft_id = %aircraft_id, runway = %runway, "landing complete");
            }
            Ok(Ok(LandingOutcome::Discarded { reason })) => {
                counters.discarded_requests.fetch_add(1, Ordering::Relaxed);
                warn!(lane = %lane, worker_id, aircraft_id = %aircraft_id, reason, "request discarded");
                ctx.reporter.event(
                    EventCategory::Discarded,
                    Some(&aircraft_id),
                    format!("request discarded: {reason}"),
                );
            }
            Ok(Err(SchedulerError::ShuttingDown)) => {
                debug!(lane = %lane, worker_id, aircraft_id = %aircraft_id, "runway pool shut down");
                break;
            }
            Ok(Err(e)) => {
                counters.failed_requests.fetch_add(1, Ordering::Relaxed);
                error!(lane = %lane, worker_id, aircraft_id = %aircraft_id, error = %e, "landing failed");
                ctx.reporter
                    .event(EventCategory::Failure, Some(&aircraft_id), e.to_string());
            }
            Err(_) => {
                counters.failed_requests.fetch_add(1, Ordering::Relaxed);
                error!(lane = %lane, worker_id, aircraft_id = %aircraft_id, "landing handler panicked");
                ctx.reporter.event(
                    EventCategory::Failure,
                    Some(&aircraft_id),
                    "landing handler panicked",
                );
            }
        }
    }
    debug!(lane = %lane, worker_id, "worker thread exiting");
}

/// Serve one request end to end. The runway is held through a lease, so it
/// is released on every exit path.
fn process_request(
    ctx: &SchedulerContext,
    lane: Lane,
    worker_id: usize,
    request: LandingRequest,
) -> Result<LandingOutcome, SchedulerError> {
    let aircraft = &request.aircraft;
    let aircraft_id = &request.aircraft_id;

    let priority = {
        let mut a = aircraft.lock();
        if a.status().is_terminal() {
            return Ok(LandingOutcome::Discarded {
                reason: "aircraft already terminal",
            });
        }
        if !a.status().awaiting_runway() {
            return Ok(LandingOutcome::Discarded {
                reason: "aircraft already landing",
            });
        }
        if !a.transition(AircraftStatus::Ready)? {
            // Another worker already holds this aircraft.
            return Ok(LandingOutcome::Discarded {
                reason: "duplicate request",
            });
        }
        a.priority()
    };

    debug!(lane = %lane, worker_id, aircraft_id = %aircraft_id, priority, "waiting for runway");
    let ticket = AcquireTicket {
        aircraft_id: aircraft_id.clone(),
        priority,
        sequence: request.sequence,
    };
    let lease = match ctx.runways.acquire_lease(&ticket) {
        Ok(lease) => lease,
        Err(SchedulerError::AcquireAbandoned(_)) => {
            return Ok(LandingOutcome::Discarded {
                reason: "runway wait abandoned",
            });
        }
        Err(e) => return Err(e),
    };
    let runway = lease.runway().clone();

    {
        let mut a = aircraft.lock();
        if a.status().is_terminal() {
            // Crashed or diverted between dequeue and grant; the lease drop
            // hands the runway back.
            return Ok(LandingOutcome::Discarded {
                reason: "aircraft terminal at runway grant",
            });
        }
        if !a.transition(AircraftStatus::Landing)? {
            return Ok(LandingOutcome::Discarded {
                reason: "duplicate request",
            });
        }
        a.assign_runway(runway.clone());
    }
    debug!(lane = %lane, worker_id, aircraft_id = %aircraft_id, runway = %runway, "landing");

    // A stop cuts occupancy short so shutdown fits inside the 2 s join
    // timeout. The aircraft still lands and releases its runway; a full-length
    // occupancy would outlast the join and leave the worker detached.
    ctx.stop.wait(lane.landing_duration(&ctx.config));

    let snapshot = {
        let mut a = aircraft.lock();
        a.transition(AircraftStatus::Landed)?;
        a.snapshot()
    };
    if let Err(e) = lease.release() {
        warn!(aircraft_id = %aircraft_id, runway = %runway, error = %e, "runway release failed");
    }

    let emergency = snapshot.emergency.is_emergency() || lane == Lane::Emergency;
    ctx.registry.record_landing(emergency);
    ctx.registry.deregister(aircraft_id);
    ctx.reporter.landing(&LandingRecord {
        aircraft: snapshot,
        runway: runway.clone(),
        lane,
        emergency,
        landed_at_ms: now_ms(),
    });
    ctx.reporter.event(
        EventCategory::Landing,
        Some(aircraft_id),
        format!("landed on {runway} via {lane} lane"),
    );
    ctx.reporter.notify(
        Some(aircraft_id),
        Severity::Info,
        format!("landed on {runway}"),
    );
    Ok(LandingOutcome::Landed { runway })
}

//! `LandingScheduler`: the entry point for controllers, triggers and the
//! presentation layer.
//!
//! Every method is safe to call concurrently with the workers and the
//! escalation loop. Snapshot accessors return copies, never live references.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::core::aircraft::{Aircraft, AircraftSnapshot, AircraftStatus, EmergencyLevel, SharedAircraft};
use crate::core::context::SchedulerContext;
use crate::core::escalation::{CycleReport, EscalationEngine};
use crate::core::fast_path::{self, EmergencyFastPath};
use crate::core::landing_queue::{LandingQueue, LandingRequest};
use crate::core::registry::{RegistryStats, ResourceRegistry};
use crate::core::runway_pool::{RunwayPool, RunwaySnapshot};
use crate::core::sink::{EventCategory, NotificationSink, PersistenceSink, Reporter, Severity};
use crate::core::worker_pool::{Lane, PoolStats, WorkerPool};
use crate::core::SchedulerError;
use crate::util::ids::{AircraftId, RunwayId};

/// Per-worker join timeout during shutdown.
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Scheduler-wide statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Whether workers are running.
    pub running: bool,
    /// Main lane counters, once started.
    pub main_pool: Option<PoolStats>,
    /// Emergency lane counters, once started.
    pub fast_path: Option<PoolStats>,
    /// Registry counters.
    pub registry: RegistryStats,
    /// Pending main-queue requests.
    pub main_queue_depth: usize,
    /// Pending emergency-queue requests.
    pub emergency_queue_depth: usize,
    /// Runway permits not held.
    pub runway_permits_available: usize,
    /// Runways held.
    pub runways_occupied: usize,
    /// Workers blocked waiting for a runway.
    pub runway_waiters: usize,
    /// Collaborator calls that failed.
    pub sink_failures: u64,
}

struct RunningWorkers {
    main: WorkerPool,
    fast_path: EmergencyFastPath,
    escalation: Option<JoinHandle<()>>,
}

/// Runway landing scheduler.
pub struct LandingScheduler {
    ctx: Arc<SchedulerContext>,
    engine: Arc<EscalationEngine>,
    workers: Mutex<Option<RunningWorkers>>,
    running: AtomicBool,
}

impl LandingScheduler {
    /// Create a stopped scheduler. Call [`start`](Self::start) to spawn workers.
    pub fn new(
        config: SchedulerConfig,
        persistence: Arc<dyn PersistenceSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, SchedulerError> {
        let reporter = Reporter::new(persistence, notifier);
        let ctx = Arc::new(SchedulerContext::new(config, reporter)?);
        let engine = Arc::new(EscalationEngine::new(Arc::clone(&ctx)));
        Ok(Self {
            ctx,
            engine,
            workers: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// Spawn the main workers, the fast-path workers and the escalation loop.
    pub fn start(&self) -> Result<(), SchedulerError> {
        if self.ctx.stop.is_triggered() {
            return Err(SchedulerError::ShuttingDown);
        }
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::AlreadyRunning);
        }
        let spawned = self.spawn_workers();
        match spawned {
            Ok(workers) => {
                *self.workers.lock() = Some(workers);
                info!(
                    runways = self.ctx.config.runways.len(),
                    permits = self.ctx.config.runway_permits,
                    workers = self.ctx.config.worker_count,
                    emergency_workers = self.ctx.config.emergency_worker_count,
                    "landing scheduler started"
                );
                Ok(())
            }
            Err(e) => {
                self.shutdown();
                Err(e)
            }
        }
    }

    fn spawn_workers(&self) -> Result<RunningWorkers, SchedulerError> {
        let main = WorkerPool::start(Lane::Main, &self.ctx, self.ctx.config.worker_count)?;
        let fast_path = EmergencyFastPath::start(&self.ctx)?;
        let escalation = Arc::clone(&self.engine).spawn()?;
        Ok(RunningWorkers {
            main,
            fast_path,
            escalation: Some(escalation),
        })
    }

    /// Stop every loop, wake every blocked worker and join them. In-flight
    /// landings finish (with shortened occupancy) and release their runways.
    /// Idempotent.
    pub fn shutdown(&self) {
        self.signal_stop();
        let Some(mut workers) = self.workers.lock().take() else {
            self.running.store(false, Ordering::Release);
            return;
        };
        info!("shutting down landing scheduler");
        let main_joined = workers.main.join(JOIN_TIMEOUT);
        let emergency_joined = workers.fast_path.join(JOIN_TIMEOUT);
        if let Some(handle) = workers.escalation.take() {
            join_with_timeout(handle, JOIN_TIMEOUT);
        }
        self.running.store(false, Ordering::Release);
        info!(main_joined, emergency_joined, "landing scheduler stopped");
    }

    fn signal_stop(&self) {
        self.ctx.stop.trigger();
        self.ctx.main_queue.close();
        self.ctx.emergency_queue.close();
        self.ctx.runways.shutdown();
    }

    /// Whether workers are running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Register an aircraft without requesting a landing.
    pub fn register_aircraft(&self, mut aircraft: Aircraft) -> Result<AircraftId, SchedulerError> {
        aircraft.apply_default_priority(&self.ctx.config.escalation);
        let id = self.ctx.registry.register(aircraft.into_shared())?;
        info!(aircraft_id = %id, "aircraft registered");
        Ok(id)
    }

    /// Register an aircraft and enqueue its landing request.
    pub fn request_landing(&self, aircraft: Aircraft) -> Result<AircraftId, SchedulerError> {
        let id = self.register_aircraft(aircraft)?;
        if let Err(e) = self.enqueue_landing(&id) {
            self.ctx.registry.deregister(&id);
            return Err(e);
        }
        Ok(id)
    }

    /// Enqueue a landing request for a registered aircraft. Aircraft that
    /// already need an immediate landing go straight to the fast path.
    /// Fails with `AlreadyQueued` while a request is pending or held by a
    /// worker, and with `Inactive` once the aircraft is landing or terminal.
    pub fn enqueue_landing(&self, aircraft_id: &AircraftId) -> Result<(), SchedulerError> {
        let aircraft = self.lookup(aircraft_id)?;
        let immediate = {
            let a = aircraft.lock();
            if a.status() == AircraftStatus::Ready {
                // A worker has dequeued it and waits for or holds a runway.
                return Err(SchedulerError::AlreadyQueued(aircraft_id.clone()));
            }
            if !a.status().awaiting_runway() {
                return Err(SchedulerError::Inactive(aircraft_id.clone()));
            }
            a.needs_immediate_landing(&self.ctx.config.escalation)
        };
        if self.ctx.main_queue.contains(aircraft_id) || self.ctx.emergency_queue.contains(aircraft_id) {
            return Err(SchedulerError::AlreadyQueued(aircraft_id.clone()));
        }
        let request = LandingRequest::new(aircraft);
        let priority = request.priority;
        if immediate {
            fast_path::enqueue_immediate(&self.ctx, request)?;
        } else {
            self.ctx.main_queue.enqueue(request)?;
        }
        info!(aircraft_id = %aircraft_id, priority, immediate, "landing requested");
        Ok(())
    }

    /// Declare MEDICAL, SECURITY, FIRE or WEATHER. The new priority applies
    /// to the pending request at once; a move to the fast path happens on the
    /// next escalation cycle. Returns `false` if the declaration changed
    /// nothing.
    pub fn declare_emergency(
        &self,
        aircraft_id: &AircraftId,
        level: EmergencyLevel,
    ) -> Result<bool, SchedulerError> {
        let aircraft = self.lookup(aircraft_id)?;
        let (changed, priority, status) = {
            let mut a = aircraft.lock();
            let changed = a.declare_emergency(level, &self.ctx.config.escalation)?;
            (changed, a.priority(), a.status())
        };
        if !changed {
            return Ok(false);
        }

        self.ctx.main_queue.reprioritize(aircraft_id, priority);
        self.ctx.emergency_queue.reprioritize(aircraft_id, priority);
        if status == AircraftStatus::Ready {
            self.ctx.runways.reprioritize_waiter(aircraft_id, priority);
        }

        let response = match level {
            EmergencyLevel::Fire => "fire suppression crews dispatched",
            EmergencyLevel::Medical => "medical team standing by",
            EmergencyLevel::Security => "security response dispatched",
            EmergencyLevel::Weather => "holding for weather",
            _ => "emergency declared",
        };
        warn!(aircraft_id = %aircraft_id, ?level, priority, "emergency declared");
        self.ctx.reporter.event(
            EventCategory::Emergency,
            Some(aircraft_id),
            format!("{level:?} declared: {response}"),
        );
        let severity = if level == EmergencyLevel::Fire {
            Severity::Critical
        } else {
            Severity::Warning
        };
        self.ctx
            .reporter
            .notify(Some(aircraft_id), severity, format!("{level:?}: {response}"));
        Ok(true)
    }

    /// Divert an aircraft that has not started landing. A pending request is
    /// dropped; a worker already holding the request discards it.
    pub fn divert(&self, aircraft_id: &AircraftId) -> Result<(), SchedulerError> {
        let aircraft = self.lookup(aircraft_id)?;
        aircraft.lock().transition(AircraftStatus::Diverted)?;
        self.ctx.main_queue.remove(aircraft_id);
        self.ctx.emergency_queue.remove(aircraft_id);
        self.ctx.runways.abandon(aircraft_id);
        self.ctx.registry.deregister(aircraft_id);
        self.ctx.registry.record_diversion();
        info!(aircraft_id = %aircraft_id, "aircraft diverted");
        self.ctx
            .reporter
            .event(EventCategory::Diversion, Some(aircraft_id), "diverted");
        self.ctx
            .reporter
            .notify(Some(aircraft_id), Severity::Warning, "diverted");
        Ok(())
    }

    /// Set or clear the weather restriction on a runway.
    pub fn set_weather_restriction(
        &self,
        runway_id: &RunwayId,
        restricted: bool,
    ) -> Result<(), SchedulerError> {
        self.ctx
            .runways
            .set_weather_restriction(runway_id, restricted)?;
        let message = if restricted {
            format!("{runway_id} restricted for weather")
        } else {
            format!("{runway_id} weather restriction lifted")
        };
        self.ctx.reporter.event(EventCategory::Runway, None, message);
        Ok(())
    }

    /// Close a runway for operational reasons.
    pub fn close_runway(&self, runway_id: &RunwayId) -> Result<(), SchedulerError> {
        self.ctx.runways.close(runway_id)?;
        self.ctx
            .reporter
            .event(EventCategory::Runway, None, format!("{runway_id} closed"));
        Ok(())
    }

    /// Reopen an operationally closed runway.
    pub fn open_runway(&self, runway_id: &RunwayId) -> Result<(), SchedulerError> {
        self.ctx.runways.open(runway_id)?;
        self.ctx
            .reporter
            .event(EventCategory::Runway, None, format!("{runway_id} opened"));
        Ok(())
    }

    /// Snapshots of every active aircraft, most urgent first.
    #[must_use]
    pub fn list_active_aircraft(&self) -> Vec<AircraftSnapshot> {
        self.ctx.registry.list_active()
    }

    /// Snapshots of every runway.
    #[must_use]
    pub fn list_runways(&self) -> Vec<RunwaySnapshot> {
        self.ctx.runways.snapshot()
    }

    /// Snapshot of one active aircraft.
    #[must_use]
    pub fn aircraft(&self, aircraft_id: &AircraftId) -> Option<AircraftSnapshot> {
        self.ctx
            .registry
            .get(aircraft_id)
            .map(|a| a.lock().snapshot())
    }

    /// Run one escalation cycle now, as if `elapsed` had passed.
    pub fn run_escalation_cycle(&self, elapsed: Duration) -> CycleReport {
        self.engine.run_cycle(elapsed)
    }

    /// Scheduler-wide statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let workers = self.workers.lock();
        SchedulerStats {
            running: self.is_running(),
            main_pool: workers.as_ref().map(|w| w.main.stats()),
            fast_path: workers.as_ref().map(|w| w.fast_path.stats()),
            registry: self.ctx.registry.stats(),
            main_queue_depth: self.ctx.main_queue.len(),
            emergency_queue_depth: self.ctx.emergency_queue.len(),
            runway_permits_available: self.ctx.runways.available_permits(),
            runways_occupied: self.ctx.runways.occupied_count(),
            runway_waiters: self.ctx.runways.waiting_count(),
            sink_failures: self.ctx.reporter.failures(),
        }
    }

    /// Shared context.
    #[must_use]
    pub const fn context(&self) -> &Arc<SchedulerContext> {
        &self.ctx
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.ctx.config
    }

    /// Main landing queue.
    #[must_use]
    pub fn main_queue(&self) -> &LandingQueue {
        &self.ctx.main_queue
    }

    /// Emergency sub-queue.
    #[must_use]
    pub fn emergency_queue(&self) -> &LandingQueue {
        &self.ctx.emergency_queue
    }

    /// Runway pool.
    #[must_use]
    pub fn runways(&self) -> &RunwayPool {
        &self.ctx.runways
    }

    /// Aircraft registry.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.ctx.registry
    }

    fn lookup(&self, aircraft_id: &AircraftId) -> Result<SharedAircraft, SchedulerError> {
        self.ctx
            .registry
            .get(aircraft_id)
            .ok_or_else(|| SchedulerError::UnknownAircraft(aircraft_id.clone()))
    }
}

impl std::fmt::Debug for LandingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LandingScheduler")
            .field("running", &self.is_running())
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

impl Drop for LandingScheduler {
    fn drop(&mut self) {
        // Wake and release everything but don't join; `shutdown` does that.
        if !self.ctx.stop.is_triggered() {
            self.signal_stop();
            tracing::debug!("LandingScheduler dropped without explicit shutdown");
        }
    }
}

fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) {
    let (tx, rx) = std::sync::mpsc::channel();
    let join_thread = thread::spawn(move || {
        let _ = tx.send(handle.join().is_ok());
    });
    match rx.recv_timeout(timeout) {
        Ok(true) => {
            let _ = join_thread.join();
        }
        Ok(false) => {
            warn!("escalation thread panicked");
            let _ = join_thread.join();
        }
        Err(_) => warn!("escalation thread did not exit within timeout, detaching"),
    }
}

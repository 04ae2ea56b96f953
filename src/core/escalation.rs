//! Periodic escalation engine.
//!
//! Every cycle advances each airborne aircraft by the elapsed (scaled) time,
//! re-derives its emergency level and priority, pushes priority changes into
//! whichever queue or runway wait holds it, and moves requests that now need
//! an immediate landing onto the emergency fast path. This is the only
//! component that moves requests between queues.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::aircraft::{AircraftStatus, CrashCause, EmergencyLevel, Evaluation};
use crate::core::context::SchedulerContext;
use crate::core::fast_path;
use crate::core::sink::{EventCategory, Severity};
use crate::core::SchedulerError;
use crate::util::ids::AircraftId;

/// Counts from one escalation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Airborne aircraft evaluated.
    pub evaluated: usize,
    /// Emergency level changes.
    pub escalated: usize,
    /// Priority changes.
    pub reprioritized: usize,
    /// Requests moved to the emergency sub-queue.
    pub moved_to_fast_path: usize,
    /// Aircraft lost.
    pub crashed: usize,
}

/// Escalation engine bound to one scheduler context.
#[derive(Debug)]
pub struct EscalationEngine {
    ctx: Arc<SchedulerContext>,
}

impl EscalationEngine {
    /// Create an engine over `ctx`.
    #[must_use]
    pub const fn new(ctx: Arc<SchedulerContext>) -> Self {
        Self { ctx }
    }

    /// Run one cycle as if `elapsed` real time had passed since the last one.
    pub fn run_cycle(&self, elapsed: Duration) -> CycleReport {
        let ctx = &*self.ctx;
        let policy = &ctx.config.escalation;
        let dt_secs = elapsed.as_secs_f64() * ctx.config.time_scale;
        let mut report = CycleReport::default();

        for aircraft in ctx.registry.handles() {
            // Aircraft lock is released before touching queues or the pool.
            let (evaluation, status) = {
                let mut a = aircraft.lock();
                if !a.status().awaiting_runway() {
                    continue;
                }
                let evaluation = a.advance(dt_secs, policy);
                (evaluation, a.status())
            };
            report.evaluated += 1;
            let id = &evaluation.aircraft_id;

            if let Some(cause) = evaluation.crashed {
                retire_crashed(ctx, id, cause);
                report.crashed += 1;
                continue;
            }
            if evaluation.level_changed() {
                report.escalated += 1;
                self.report_escalation(&evaluation);
            }
            if evaluation.priority_changed() {
                report.reprioritized += 1;
                ctx.main_queue.reprioritize(id, evaluation.priority);
                ctx.emergency_queue.reprioritize(id, evaluation.priority);
            }
            if status == AircraftStatus::Ready {
                // Covers a worker that read the priority just before this cycle.
                ctx.runways.reprioritize_waiter(id, evaluation.priority);
            }
            if evaluation.needs_immediate && fast_path::promote(ctx, id, evaluation.priority) {
                report.moved_to_fast_path += 1;
                ctx.reporter.event(
                    EventCategory::FastPath,
                    Some(id),
                    format!("{:?} moved to emergency fast path", evaluation.level),
                );
            }
        }

        if report.escalated > 0 || report.crashed > 0 || report.moved_to_fast_path > 0 {
            info!(
                evaluated = report.evaluated,
                escalated = report.escalated,
                moved_to_fast_path = report.moved_to_fast_path,
                crashed = report.crashed,
                "escalation cycle"
            );
        } else {
            debug!(evaluated = report.evaluated, "escalation cycle");
        }
        report
    }

    fn report_escalation(&self, evaluation: &Evaluation) {
        let id = &evaluation.aircraft_id;
        info!(
            aircraft_id = %id,
            from = ?evaluation.previous_level,
            to = ?evaluation.level,
            priority = evaluation.priority,
            "emergency escalated"
        );
        let message = format!(
            "{:?} -> {:?}, priority {} -> {}",
            evaluation.previous_level,
            evaluation.level,
            evaluation.previous_priority,
            evaluation.priority
        );
        self.ctx
            .reporter
            .event(EventCategory::Escalation, Some(id), message.clone());
        let severity = if evaluation.level == EmergencyLevel::FuelCritical {
            Severity::Critical
        } else {
            Severity::Warning
        };
        self.ctx.reporter.notify(Some(id), severity, message);
    }

    /// Run cycles on a dedicated thread every configured interval until the
    /// context's stop signal fires. Elapsed time is measured, not assumed.
    pub fn spawn(self: Arc<Self>) -> Result<JoinHandle<()>, SchedulerError> {
        thread::Builder::new()
            .name("atc-escalation".into())
            .spawn(move || {
                let interval = self.ctx.config.escalation_interval();
                debug!(interval_ms = interval.as_millis(), "escalation loop started");
                let mut last = Instant::now();
                while self.ctx.stop.wait(interval) {
                    let now = Instant::now();
                    self.run_cycle(now.duration_since(last));
                    last = now;
                }
                debug!("escalation loop exiting");
            })
            .map_err(|e| SchedulerError::WorkerSpawn(e.to_string()))
    }
}

/// Remove a crashed aircraft from every structure and report it.
pub(crate) fn retire_crashed(ctx: &SchedulerContext, aircraft_id: &AircraftId, cause: CrashCause) {
    ctx.main_queue.remove(aircraft_id);
    ctx.emergency_queue.remove(aircraft_id);
    ctx.runways.abandon(aircraft_id);
    ctx.registry.deregister(aircraft_id);
    ctx.registry.record_crash();
    warn!(aircraft_id = %aircraft_id, ?cause, "aircraft crashed");
    let message = match cause {
        CrashCause::FuelExhausted => "crashed: fuel exhausted before landing",
        CrashCause::FireTimeout => "crashed: fire timer expired before landing",
    };
    ctx.reporter.event(EventCategory::Crash, Some(aircraft_id), message);
    ctx.reporter.notify(Some(aircraft_id), Severity::Critical, message);
}

//! API-facing request/response models for a polling presentation layer.

use serde::{Deserialize, Serialize};

use crate::core::{
    Aircraft, AircraftSnapshot, EmergencyLevel, FlightProfile, LandingScheduler, RunwaySnapshot,
    SchedulerStats,
};
use crate::util::clock::now_ms;
use crate::util::ids::AircraftId;

/// Landing request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingSubmission {
    /// Caller-chosen id; generated when absent.
    #[serde(default)]
    pub aircraft_id: Option<AircraftId>,
    /// Callsign.
    pub callsign: String,
    /// Initial flight parameters.
    pub profile: FlightProfile,
    /// Emergency declared on entry.
    #[serde(default)]
    pub emergency: Option<EmergencyLevel>,
}

/// Everything a tower display polls for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerSnapshot {
    /// Active aircraft, most urgent first.
    pub aircraft: Vec<AircraftSnapshot>,
    /// Runways in configuration order.
    pub runways: Vec<RunwaySnapshot>,
    /// Scheduler statistics.
    pub stats: SchedulerStats,
    /// Capture time (ms since epoch).
    pub taken_at_ms: u128,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Whether workers are running.
    pub running: bool,
    /// Active aircraft.
    pub active_aircraft: usize,
}

/// Register an aircraft, apply a declared emergency and request its landing.
pub fn submit_landing(
    scheduler: &LandingScheduler,
    req: LandingSubmission,
) -> Result<AircraftId, String> {
    let aircraft = match req.aircraft_id {
        Some(id) => Aircraft::with_id(id, req.callsign, req.profile),
        None => Aircraft::new(req.callsign, req.profile),
    };
    let id = scheduler
        .register_aircraft(aircraft)
        .map_err(|e| e.to_string())?;
    let queued = req
        .emergency
        .filter(|level| level.is_emergency())
        .map_or(Ok(false), |level| scheduler.declare_emergency(&id, level))
        .and_then(|_| scheduler.enqueue_landing(&id));
    if let Err(e) = queued {
        scheduler.registry().deregister(&id);
        return Err(e.to_string());
    }
    Ok(id)
}

/// Capture a consistent-per-structure snapshot for display.
#[must_use]
pub fn tower_snapshot(scheduler: &LandingScheduler) -> TowerSnapshot {
    TowerSnapshot {
        aircraft: scheduler.list_active_aircraft(),
        runways: scheduler.list_runways(),
        stats: scheduler.stats(),
        taken_at_ms: now_ms(),
    }
}

/// Return a health payload.
#[must_use]
pub fn health(scheduler: &LandingScheduler) -> Health {
    let stats = scheduler.stats();
    Health {
        ok: stats.running || stats.registry.active == 0,
        running: stats.running,
        active_aircraft: stats.registry.active,
    }
}

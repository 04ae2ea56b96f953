//! Aircraft state: position, fuel, emergency level and the status machine.
//!
//! ```text
//! APPROACHING -> HOLDING -> READY -> LANDING -> LANDED
//!      |            |         |
//!      +------------+---------+--> DIVERTED | CRASHED
//! ```
//!
//! Crashes only happen before a runway is acquired: an aircraft in `LANDING`
//! always completes.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::EscalationPolicy;
use crate::core::SchedulerError;
use crate::util::clock::now_ms;
use crate::util::ids::{AircraftId, Priority, RunwayId};

/// Aircraft record shared between the registry, queues and workers.
pub type SharedAircraft = Arc<Mutex<Aircraft>>;

/// Priority of a freshly created aircraft.
pub const DEFAULT_PRIORITY: Priority = 100;

/// Lifecycle status of an aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AircraftStatus {
    /// Inbound, distance remaining.
    Approaching,
    /// At the field, circling for a slot.
    Holding,
    /// Picked up by a worker, waiting for a runway.
    Ready,
    /// Occupying a runway.
    Landing,
    /// Landed (terminal).
    Landed,
    /// Sent elsewhere (terminal).
    Diverted,
    /// Lost to fuel exhaustion or fire (terminal).
    Crashed,
}

impl AircraftStatus {
    /// `LANDED`, `DIVERTED` or `CRASHED`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Landed | Self::Diverted | Self::Crashed)
    }

    /// Airborne and not yet holding a runway.
    #[must_use]
    pub const fn awaiting_runway(self) -> bool {
        matches!(self, Self::Approaching | Self::Holding | Self::Ready)
    }

    /// Whether the state machine allows `self -> next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Approaching,
                Self::Holding | Self::Ready | Self::Diverted | Self::Crashed
            ) | (Self::Holding, Self::Ready | Self::Diverted | Self::Crashed)
                | (Self::Ready, Self::Landing | Self::Diverted | Self::Crashed)
                | (Self::Landing, Self::Landed)
        )
    }
}

/// Emergency level. Fuel levels are derived; the rest are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmergencyLevel {
    /// No emergency.
    None,
    /// Projected fuel at arrival under the low margin.
    FuelLow,
    /// Projected fuel at arrival under the critical margin.
    FuelCritical,
    /// Medical emergency on board.
    Medical,
    /// Security threat.
    Security,
    /// Fire on board; starts the fire countdown.
    Fire,
    /// Weather blocking the approach.
    Weather,
}

impl EmergencyLevel {
    /// Levels an external controller may declare.
    #[must_use]
    pub const fn is_declarable(self) -> bool {
        matches!(self, Self::Medical | Self::Security | Self::Fire | Self::Weather)
    }

    /// Levels derived from fuel state.
    #[must_use]
    pub const fn is_fuel(self) -> bool {
        matches!(self, Self::FuelLow | Self::FuelCritical)
    }

    /// Anything other than `None`.
    #[must_use]
    pub const fn is_emergency(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Why an aircraft crashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashCause {
    /// Fuel reached zero before a runway was acquired.
    FuelExhausted,
    /// The fire countdown reached zero before a runway was acquired.
    FireTimeout,
}

/// Initial flight parameters of an aircraft entering the system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightProfile {
    /// Fuel on board.
    pub fuel: f64,
    /// Fuel burned per hour, in the same unit as `fuel`.
    pub burn_rate_per_hour: f64,
    /// Ground speed in metres per second.
    pub speed_mps: f64,
    /// Distance to the field in metres.
    pub distance_m: f64,
}

/// Result of re-deriving an aircraft's emergency level and priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Evaluated aircraft.
    pub aircraft_id: AircraftId,
    /// Level before evaluation.
    pub previous_level: EmergencyLevel,
    /// Level after evaluation.
    pub level: EmergencyLevel,
    /// Priority before evaluation.
    pub previous_priority: Priority,
    /// Priority after evaluation.
    pub priority: Priority,
    /// Set when this evaluation crashed the aircraft.
    pub crashed: Option<CrashCause>,
    /// Whether the aircraft now qualifies for the emergency fast path.
    pub needs_immediate: bool,
}

impl Evaluation {
    /// The emergency level moved.
    #[must_use]
    pub fn level_changed(&self) -> bool {
        self.previous_level != self.level
    }

    /// The priority moved.
    #[must_use]
    pub const fn priority_changed(&self) -> bool {
        self.previous_priority != self.priority
    }
}

/// Point-in-time copy of an aircraft for presentation and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftSnapshot {
    /// Aircraft id.
    pub id: AircraftId,
    /// Callsign.
    pub callsign: String,
    /// Fuel on board.
    pub fuel: f64,
    /// Fuel burned per hour.
    pub burn_rate_per_hour: f64,
    /// Ground speed in metres per second.
    pub speed_mps: f64,
    /// Distance to the field in metres.
    pub distance_m: f64,
    /// Seconds to arrival at current speed.
    pub eta_secs: f64,
    /// Lifecycle status.
    pub status: AircraftStatus,
    /// Emergency level.
    pub emergency: EmergencyLevel,
    /// Current priority.
    pub priority: Priority,
    /// Runway held, if any.
    pub assigned_runway: Option<RunwayId>,
    /// Last status or emergency change, ms since epoch.
    pub last_state_change_ms: u128,
    /// Remaining fire countdown while on fire.
    pub fire_time_remaining_secs: Option<f64>,
    /// Seconds until the governing hazard (fire, fuel or arrival).
    pub threat_time_secs: Option<f64>,
    /// Cause of a crash.
    pub crash_cause: Option<CrashCause>,
}

/// Mutable aircraft record.
#[derive(Debug, Clone)]
pub struct Aircraft {
    id: AircraftId,
    callsign: String,
    fuel: f64,
    burn_rate_per_hour: f64,
    speed_mps: f64,
    distance_m: f64,
    eta_secs: f64,
    status: AircraftStatus,
    emergency: EmergencyLevel,
    priority: Priority,
    assigned_runway: Option<RunwayId>,
    last_state_change_ms: u128,
    fire_time_remaining_secs: Option<f64>,
    crash_cause: Option<CrashCause>,
}

impl Aircraft {
    /// Create an approaching aircraft with a generated id.
    pub fn new(callsign: impl Into<String>, profile: FlightProfile) -> Self {
        Self::with_id(AircraftId::generate(), callsign, profile)
    }

    /// Create an approaching aircraft with a caller-chosen id.
    pub fn with_id(id: AircraftId, callsign: impl Into<String>, profile: FlightProfile) -> Self {
        let mut aircraft = Self {
            id,
            callsign: callsign.into(),
            fuel: profile.fuel.max(0.0),
            burn_rate_per_hour: profile.burn_rate_per_hour.max(0.0),
            speed_mps: profile.speed_mps.max(0.0),
            distance_m: profile.distance_m.max(0.0),
            eta_secs: 0.0,
            status: AircraftStatus::Approaching,
            emergency: EmergencyLevel::None,
            priority: DEFAULT_PRIORITY,
            assigned_runway: None,
            last_state_change_ms: now_ms(),
            fire_time_remaining_secs: None,
            crash_cause: None,
        };
        aircraft.recompute_eta();
        aircraft
    }

    /// Wrap into the shared handle used by the scheduler.
    #[must_use]
    pub fn into_shared(self) -> SharedAircraft {
        Arc::new(Mutex::new(self))
    }

    /// Aircraft id.
    #[must_use]
    pub const fn id(&self) -> &AircraftId {
        &self.id
    }

    /// Callsign.
    #[must_use]
    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// Fuel on board.
    #[must_use]
    pub const fn fuel(&self) -> f64 {
        self.fuel
    }

    /// Fuel burned per hour.
    #[must_use]
    pub const fn burn_rate_per_hour(&self) -> f64 {
        self.burn_rate_per_hour
    }

    /// Ground speed in metres per second.
    #[must_use]
    pub const fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    /// Distance to the field in metres.
    #[must_use]
    pub const fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Seconds to arrival at current speed.
    #[must_use]
    pub const fn eta_secs(&self) -> f64 {
        self.eta_secs
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> AircraftStatus {
        self.status
    }

    /// Emergency level.
    #[must_use]
    pub const fn emergency(&self) -> EmergencyLevel {
        self.emergency
    }

    /// Any emergency level other than `None`.
    #[must_use]
    pub const fn is_emergency(&self) -> bool {
        self.emergency.is_emergency()
    }

    /// Current priority (lower is more urgent).
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Runway held, if any.
    #[must_use]
    pub const fn assigned_runway(&self) -> Option<&RunwayId> {
        self.assigned_runway.as_ref()
    }

    /// Last status or emergency change, ms since epoch.
    #[must_use]
    pub const fn last_state_change_ms(&self) -> u128 {
        self.last_state_change_ms
    }

    /// Remaining fire countdown, only set while on fire.
    #[must_use]
    pub const fn fire_time_remaining_secs(&self) -> Option<f64> {
        self.fire_time_remaining_secs
    }

    /// Cause of a crash.
    #[must_use]
    pub const fn crash_cause(&self) -> Option<CrashCause> {
        self.crash_cause
    }

    /// Reset priority to the healthy default of `policy` (used on registration).
    pub(crate) fn apply_default_priority(&mut self, policy: &EscalationPolicy) {
        self.priority = policy.priorities.for_level(self.emergency);
    }

    /// Advance the aircraft by `dt_secs` of simulated time: move, burn fuel,
    /// run the fire countdown, then re-derive emergency level and priority.
    pub fn advance(&mut self, dt_secs: f64, policy: &EscalationPolicy) -> Evaluation {
        self.update_position(dt_secs);
        self.tick_fire_timer(dt_secs);
        self.evaluate(policy)
    }

    /// Move toward the field and burn fuel. Distance and fuel clamp at zero.
    /// An approaching aircraft that arrives enters `HOLDING`.
    pub fn update_position(&mut self, dt_secs: f64) {
        if !self.status.awaiting_runway() || dt_secs <= 0.0 {
            return;
        }
        self.distance_m = self.speed_mps.mul_add(-dt_secs, self.distance_m).max(0.0);
        self.fuel = (self.burn_rate_per_hour / 3600.0)
            .mul_add(-dt_secs, self.fuel)
            .max(0.0);
        self.recompute_eta();
        if self.distance_m <= 0.0 && self.status == AircraftStatus::Approaching {
            self.set_status(AircraftStatus::Holding);
        }
    }

    /// Run the fire countdown down by `dt_secs`. No-op unless on fire.
    pub fn tick_fire_timer(&mut self, dt_secs: f64) {
        if self.emergency != EmergencyLevel::Fire || dt_secs <= 0.0 {
            return;
        }
        if let Some(remaining) = self.fire_time_remaining_secs.as_mut() {
            *remaining = (*remaining - dt_secs).max(0.0);
        }
    }

    /// Fuel needed to reach the field plus `reserve_minutes` of burn.
    /// `None` when the aircraft is stationary short of the field.
    #[must_use]
    pub fn fuel_needed(&self, reserve_minutes: f64) -> Option<f64> {
        let reserve = self.burn_rate_per_hour * reserve_minutes / 60.0;
        if self.distance_m <= 0.0 {
            return Some(reserve);
        }
        if self.speed_mps <= 0.0 {
            return None;
        }
        let flight_secs = self.distance_m / self.speed_mps;
        Some((self.burn_rate_per_hour / 3600.0).mul_add(flight_secs, reserve))
    }

    /// Re-derive emergency level and priority from the current state.
    ///
    /// A fire countdown at zero, or an empty tank, crashes the aircraft if it
    /// has no runway yet. Fuel escalation moves at most one tier per call.
    pub fn evaluate(&mut self, policy: &EscalationPolicy) -> Evaluation {
        let previous_level = self.emergency;
        let previous_priority = self.priority;
        let mut crashed = None;

        if self.status.awaiting_runway() {
            let fire_out = self.emergency == EmergencyLevel::Fire
                && self.fire_time_remaining_secs.is_some_and(|t| t <= 0.0);
            if fire_out {
                self.crash(CrashCause::FireTimeout);
                crashed = Some(CrashCause::FireTimeout);
            } else if self.fuel <= 0.0 && self.burn_rate_per_hour > 0.0 {
                self.crash(CrashCause::FuelExhausted);
                crashed = Some(CrashCause::FuelExhausted);
            } else {
                self.escalate_fuel(policy);
            }
        }

        self.priority = self.derived_priority(policy);

        Evaluation {
            aircraft_id: self.id.clone(),
            previous_level,
            level: self.emergency,
            previous_priority,
            priority: self.priority,
            crashed,
            needs_immediate: crashed.is_none() && self.needs_immediate_landing(policy),
        }
    }

    fn escalate_fuel(&mut self, policy: &EscalationPolicy) {
        let Some(needed) = self.fuel_needed(policy.fuel_reserve_minutes) else {
            return;
        };
        let critical = self.fuel < needed * (1.0 + policy.fuel_critical_margin);
        match self.emergency {
            EmergencyLevel::None if self.fuel < needed * (1.0 + policy.fuel_low_margin) => {
                self.emergency = EmergencyLevel::FuelLow;
                self.speed_mps *= policy.fuel_low_speed_factor;
                self.recompute_eta();
                self.touch();
            }
            EmergencyLevel::FuelLow if critical => {
                self.emergency = EmergencyLevel::FuelCritical;
                self.touch();
            }
            // A declared level keeps fuel tracking underneath it.
            EmergencyLevel::Medical | EmergencyLevel::Security | EmergencyLevel::Weather
                if critical
                    && policy.priorities.for_level(self.emergency)
                        > policy.priorities.fuel_critical =>
            {
                self.emergency = EmergencyLevel::FuelCritical;
                self.touch();
            }
            _ => {}
        }
    }

    fn derived_priority(&self, policy: &EscalationPolicy) -> Priority {
        let table = &policy.priorities;
        if self.emergency != EmergencyLevel::None {
            return table.for_level(self.emergency);
        }
        let on_watch = self
            .fuel_needed(policy.fuel_reserve_minutes)
            .is_some_and(|needed| self.fuel < needed * (1.0 + policy.fuel_watch_margin));
        if on_watch {
            table.fuel_watch
        } else {
            table.none
        }
    }

    /// Declare an emergency on behalf of an external controller.
    ///
    /// Returns `Ok(false)` when the declaration does not change anything: a
    /// fire stays a fire until the aircraft is down, and an aircraft that
    /// needs an immediate landing only accepts a more urgent level.
    pub fn declare_emergency(
        &mut self,
        level: EmergencyLevel,
        policy: &EscalationPolicy,
    ) -> Result<bool, SchedulerError> {
        if !level.is_declarable() {
            return Err(SchedulerError::NotDeclarable(level));
        }
        if self.status.is_terminal() {
            return Err(SchedulerError::Inactive(self.id.clone()));
        }
        if self.emergency == EmergencyLevel::Fire || self.emergency == level {
            return Ok(false);
        }
        if self.needs_immediate_landing(policy) && policy.priorities.for_level(level) >= self.priority {
            return Ok(false);
        }

        self.emergency = level;
        match level {
            EmergencyLevel::Fire => {
                self.fire_time_remaining_secs = Some(policy.fire_timer_secs);
                self.speed_mps *= policy.fire_speed_factor;
                self.burn_rate_per_hour *= policy.fire_burn_factor;
                self.recompute_eta();
            }
            EmergencyLevel::Weather if self.status == AircraftStatus::Approaching => {
                self.status = AircraftStatus::Holding;
            }
            _ => {}
        }
        self.priority = self.derived_priority(policy);
        self.touch();
        Ok(true)
    }

    /// Fire, fuel-critical, or medical with a priority under the threshold.
    #[must_use]
    pub fn needs_immediate_landing(&self, policy: &EscalationPolicy) -> bool {
        match self.emergency {
            EmergencyLevel::Fire | EmergencyLevel::FuelCritical => true,
            EmergencyLevel::Medical => self.priority < policy.medical_immediate_threshold,
            _ => false,
        }
    }

    /// Move along the state machine. Re-applying the current status is a no-op
    /// returning `Ok(false)`.
    pub fn transition(&mut self, next: AircraftStatus) -> Result<bool, SchedulerError> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(SchedulerError::InvalidTransition {
                aircraft: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.set_status(next);
        Ok(true)
    }

    /// Force `CRASHED`. Idempotent; returns `false` if already crashed or if
    /// the aircraft already holds a runway or is terminal.
    pub fn crash(&mut self, cause: CrashCause) -> bool {
        if !self.status.awaiting_runway() {
            return false;
        }
        self.set_status(AircraftStatus::Crashed);
        self.crash_cause = Some(cause);
        self.assigned_runway = None;
        true
    }

    /// Record the runway this aircraft holds.
    pub fn assign_runway(&mut self, runway: RunwayId) {
        self.assigned_runway = Some(runway);
        self.touch();
    }

    /// Seconds until the governing hazard: the fire countdown, fuel or arrival
    /// for fuel emergencies, arrival otherwise.
    #[must_use]
    pub fn threat_time_secs(&self) -> Option<f64> {
        let arrival = if self.distance_m <= 0.0 {
            Some(0.0)
        } else if self.speed_mps > 0.0 {
            Some(self.distance_m / self.speed_mps)
        } else {
            None
        };
        match self.emergency {
            EmergencyLevel::Fire => self.fire_time_remaining_secs,
            EmergencyLevel::FuelLow | EmergencyLevel::FuelCritical => {
                let fuel_secs = (self.burn_rate_per_hour > 0.0)
                    .then(|| self.fuel / self.burn_rate_per_hour * 3600.0);
                match (fuel_secs, arrival) {
                    (Some(f), Some(a)) => Some(f.min(a)),
                    (f, a) => f.or(a),
                }
            }
            _ => arrival,
        }
    }

    /// Point-in-time copy.
    #[must_use]
    pub fn snapshot(&self) -> AircraftSnapshot {
        AircraftSnapshot {
            id: self.id.clone(),
            callsign: self.callsign.clone(),
            fuel: self.fuel,
            burn_rate_per_hour: self.burn_rate_per_hour,
            speed_mps: self.speed_mps,
            distance_m: self.distance_m,
            eta_secs: self.eta_secs,
            status: self.status,
            emergency: self.emergency,
            priority: self.priority,
            assigned_runway: self.assigned_runway.clone(),
            last_state_change_ms: self.last_state_change_ms,
            fire_time_remaining_secs: self.fire_time_remaining_secs,
            threat_time_secs: self.threat_time_secs(),
            crash_cause: self.crash_cause,
        }
    }

    fn set_status(&mut self, status: AircraftStatus) {
        self.status = status;
        self.touch();
    }

    fn touch(&mut self) {
        self.last_state_change_ms = now_ms();
    }

    fn recompute_eta(&mut self) {
        self.eta_secs = if self.speed_mps > 0.0 && self.distance_m > 0.0 {
            self.distance_m / self.speed_mps
        } else {
            0.0
        };
    }
}

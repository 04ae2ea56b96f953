//! Scheduler, escalation and priority configuration.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::aircraft::EmergencyLevel;
use crate::util::ids::{Priority, RunwayId};

/// Fixed priority for each emergency tier. Lower is more urgent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityTable {
    /// No emergency (the registration default).
    pub none: Priority,
    /// No emergency, but fuel is within the watch margin.
    pub fuel_watch: Priority,
    /// `FUEL_LOW`.
    pub fuel_low: Priority,
    /// `FUEL_CRITICAL`.
    pub fuel_critical: Priority,
    /// `MEDICAL`.
    pub medical: Priority,
    /// `SECURITY`.
    pub security: Priority,
    /// `FIRE`.
    pub fire: Priority,
    /// `WEATHER`.
    pub weather: Priority,
}

impl PriorityTable {
    /// Priority for an emergency level. `None` maps to the healthy default;
    /// the fuel-watch adjustment is applied by the aircraft itself.
    #[must_use]
    pub const fn for_level(&self, level: EmergencyLevel) -> Priority {
        match level {
            EmergencyLevel::None => self.none,
            EmergencyLevel::FuelLow => self.fuel_low,
            EmergencyLevel::FuelCritical => self.fuel_critical,
            EmergencyLevel::Medical => self.medical,
            EmergencyLevel::Security => self.security,
            EmergencyLevel::Fire => self.fire,
            EmergencyLevel::Weather => self.weather,
        }
    }
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self {
            none: 100,
            fuel_watch: 75,
            fuel_low: 50,
            fuel_critical: 10,
            medical: 20,
            security: 15,
            fire: 1,
            weather: 40,
        }
    }
}

/// Thresholds and side effects used when re-deriving an aircraft's emergency
/// level from its fuel and fire state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationPolicy {
    /// `FUEL_LOW` when fuel is under `needed * (1 + margin)`.
    pub fuel_low_margin: f64,
    /// `FUEL_CRITICAL` when fuel is under `needed * (1 + margin)`.
    pub fuel_critical_margin: f64,
    /// Reserve fuel, in minutes of burn, added to the fuel needed to arrive.
    pub fuel_reserve_minutes: f64,
    /// Healthy aircraft under `needed * (1 + margin)` get the fuel-watch priority.
    pub fuel_watch_margin: f64,
    /// Speed multiplier applied on entering `FUEL_LOW`.
    pub fuel_low_speed_factor: f64,
    /// Countdown started by a `FIRE` declaration, in simulated seconds.
    pub fire_timer_secs: f64,
    /// Speed multiplier applied on a `FIRE` declaration.
    pub fire_speed_factor: f64,
    /// Burn-rate multiplier applied on a `FIRE` declaration.
    pub fire_burn_factor: f64,
    /// `MEDICAL` needs an immediate landing when its priority is under this value.
    pub medical_immediate_threshold: Priority,
    /// Priority assigned to each emergency tier.
    pub priorities: PriorityTable,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            fuel_low_margin: 0.20,
            fuel_critical_margin: 0.05,
            fuel_reserve_minutes: 30.0,
            fuel_watch_margin: 0.50,
            fuel_low_speed_factor: 0.9,
            fire_timer_secs: 180.0,
            fire_speed_factor: 1.3,
            fire_burn_factor: 1.5,
            medical_immediate_threshold: 25,
            priorities: PriorityTable::default(),
        }
    }
}

impl EscalationPolicy {
    /// Validate thresholds and factors.
    pub fn validate(&self) -> Result<(), String> {
        for (name, margin) in [
            ("fuel_low_margin", self.fuel_low_margin),
            ("fuel_critical_margin", self.fuel_critical_margin),
            ("fuel_watch_margin", self.fuel_watch_margin),
        ] {
            if !margin.is_finite() || !(0.0..=10.0).contains(&margin) {
                return Err(format!("{name} must be within [0, 10]"));
            }
        }
        if self.fuel_critical_margin > self.fuel_low_margin {
            return Err("fuel_critical_margin must not exceed fuel_low_margin".into());
        }
        if !self.fuel_reserve_minutes.is_finite() || self.fuel_reserve_minutes < 0.0 {
            return Err("fuel_reserve_minutes must be non-negative".into());
        }
        if !self.fire_timer_secs.is_finite() || self.fire_timer_secs <= 0.0 {
            return Err("fire_timer_secs must be greater than 0".into());
        }
        for (name, factor) in [
            ("fuel_low_speed_factor", self.fuel_low_speed_factor),
            ("fire_speed_factor", self.fire_speed_factor),
            ("fire_burn_factor", self.fire_burn_factor),
        ] {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(format!("{name} must be greater than 0"));
            }
        }
        Ok(())
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Runway names, in preference order for assignment.
    pub runways: Vec<String>,
    /// Maximum simultaneously occupied runways.
    pub runway_permits: usize,
    /// Workers serving the main landing queue.
    pub worker_count: usize,
    /// Workers serving the emergency sub-queue.
    pub emergency_worker_count: usize,
    /// Runway occupancy for a main-lane landing.
    pub landing_duration_ms: u64,
    /// Runway occupancy for a fast-path landing.
    pub emergency_landing_duration_ms: u64,
    /// Period of the escalation engine.
    pub escalation_interval_ms: u64,
    /// Simulated seconds per real second, applied to escalation physics.
    pub time_scale: f64,
    /// Escalation thresholds and priority table.
    pub escalation: EscalationPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            runways: vec!["RW01".into(), "RW02".into()],
            runway_permits: 2,
            worker_count: 3,
            emergency_worker_count: 2,
            landing_duration_ms: 10_000,
            emergency_landing_duration_ms: 2_000,
            escalation_interval_ms: 2_000,
            time_scale: 1.0,
            escalation: EscalationPolicy::default(),
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the runway names.
    #[must_use]
    pub fn with_runways<I, S>(mut self, runways: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runways = runways.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of runway permits.
    #[must_use]
    pub const fn with_runway_permits(mut self, permits: usize) -> Self {
        self.runway_permits = permits;
        self
    }

    /// Set the main-lane worker count.
    #[must_use]
    pub const fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set the fast-path worker count.
    #[must_use]
    pub const fn with_emergency_worker_count(mut self, count: usize) -> Self {
        self.emergency_worker_count = count;
        self
    }

    /// Set both landing durations.
    #[must_use]
    pub fn with_landing_durations(mut self, normal: Duration, emergency: Duration) -> Self {
        self.landing_duration_ms = saturating_millis(normal);
        self.emergency_landing_duration_ms = saturating_millis(emergency);
        self
    }

    /// Set the escalation period.
    #[must_use]
    pub fn with_escalation_interval(mut self, interval: Duration) -> Self {
        self.escalation_interval_ms = saturating_millis(interval);
        self
    }

    /// Set the escalation policy.
    #[must_use]
    pub fn with_escalation(mut self, policy: EscalationPolicy) -> Self {
        self.escalation = policy;
        self
    }

    /// Main-lane landing duration.
    #[must_use]
    pub const fn landing_duration(&self) -> Duration {
        Duration::from_millis(self.landing_duration_ms)
    }

    /// Fast-path landing duration.
    #[must_use]
    pub const fn emergency_landing_duration(&self) -> Duration {
        Duration::from_millis(self.emergency_landing_duration_ms)
    }

    /// Escalation period.
    #[must_use]
    pub const fn escalation_interval(&self) -> Duration {
        Duration::from_millis(self.escalation_interval_ms)
    }

    /// Runway names as identifiers.
    #[must_use]
    pub fn runway_ids(&self) -> Vec<RunwayId> {
        self.runways.iter().map(|r| RunwayId::new(r.as_str())).collect()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.runways.is_empty() {
            return Err("at least one runway must be defined".into());
        }
        let mut seen = HashSet::new();
        for name in &self.runways {
            if name.trim().is_empty() {
                return Err("runway names must not be blank".into());
            }
            if !seen.insert(name.as_str()) {
                return Err(format!("duplicate runway `{name}`"));
            }
        }
        if self.runway_permits == 0 {
            return Err("runway_permits must be greater than 0".into());
        }
        if self.runway_permits > self.runways.len() {
            return Err(format!(
                "runway_permits ({}) exceeds runway count ({})",
                self.runway_permits,
                self.runways.len()
            ));
        }
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.emergency_worker_count == 0 {
            return Err("emergency_worker_count must be greater than 0".into());
        }
        if self.escalation_interval_ms == 0 {
            return Err("escalation_interval_ms must be greater than 0".into());
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err("time_scale must be a positive number".into());
        }
        self.escalation
            .validate()
            .map_err(|e| format!("escalation invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading a `.env`
    /// file first if one exists. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary `ATC_*` key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(list) = lookup("ATC_RUNWAYS") {
            cfg.runways = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = parse_var(&lookup, "ATC_RUNWAY_PERMITS")? {
            cfg.runway_permits = v;
        }
        if let Some(v) = parse_var(&lookup, "ATC_WORKERS")? {
            cfg.worker_count = v;
        }
        if let Some(v) = parse_var(&lookup, "ATC_EMERGENCY_WORKERS")? {
            cfg.emergency_worker_count = v;
        }
        if let Some(v) = parse_var(&lookup, "ATC_LANDING_MS")? {
            cfg.landing_duration_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "ATC_EMERGENCY_LANDING_MS")? {
            cfg.emergency_landing_duration_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "ATC_ESCALATION_INTERVAL_MS")? {
            cfg.escalation_interval_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "ATC_TIME_SCALE")? {
            cfg.time_scale = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Whole milliseconds in `duration`, clamped to `u64::MAX`.
fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| format!("{key}: cannot parse `{raw}`: {e}"))
        })
        .transpose()
}

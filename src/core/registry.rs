//! Registry of active aircraft and lifetime outcome counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::aircraft::{AircraftSnapshot, SharedAircraft};
use crate::core::SchedulerError;
use crate::util::ids::AircraftId;

/// Outcome counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Aircraft currently registered.
    pub active: usize,
    /// Completed landings.
    pub total_landings: u64,
    /// Completed landings that carried an emergency.
    pub emergency_landings: u64,
    /// Crashes.
    pub crashes: u64,
    /// Diversions.
    pub diversions: u64,
}

/// Active aircraft keyed by id.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    aircraft: RwLock<HashMap<AircraftId, SharedAircraft>>,
    total_landings: AtomicU64,
    emergency_landings: AtomicU64,
    crashes: AtomicU64,
    diversions: AtomicU64,
}

impl ResourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an aircraft under its id.
    pub fn register(&self, aircraft: SharedAircraft) -> Result<AircraftId, SchedulerError> {
        let id = aircraft.lock().id().clone();
        let mut map = self.aircraft.write();
        if map.contains_key(&id) {
            return Err(SchedulerError::DuplicateAircraft(id));
        }
        map.insert(id.clone(), aircraft);
        Ok(id)
    }

    /// Look up an active aircraft.
    #[must_use]
    pub fn get(&self, id: &AircraftId) -> Option<SharedAircraft> {
        self.aircraft.read().get(id).cloned()
    }

    /// Remove an aircraft. Returns it if it was registered.
    pub fn deregister(&self, id: &AircraftId) -> Option<SharedAircraft> {
        self.aircraft.write().remove(id)
    }

    /// Whether the id is registered.
    #[must_use]
    pub fn contains(&self, id: &AircraftId) -> bool {
        self.aircraft.read().contains_key(id)
    }

    /// Count a completed landing.
    pub fn record_landing(&self, emergency: bool) {
        self.total_landings.fetch_add(1, Ordering::Relaxed);
        if emergency {
            self.emergency_landings.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a crash.
    pub fn record_crash(&self) {
        self.crashes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a diversion.
    pub fn record_diversion(&self) {
        self.diversions.fetch_add(1, Ordering::Relaxed);
    }

    /// Clone every handle, so callers can lock aircraft without holding the
    /// registry lock.
    #[must_use]
    pub fn handles(&self) -> Vec<SharedAircraft> {
        self.aircraft.read().values().cloned().collect()
    }

    /// Snapshots of every active aircraft, most urgent first.
    #[must_use]
    pub fn list_active(&self) -> Vec<AircraftSnapshot> {
        let mut snapshots: Vec<_> = self
            .handles()
            .iter()
            .map(|a| a.lock().snapshot())
            .collect();
        snapshots.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.id.cmp(&b.id))
        });
        snapshots
    }

    /// Number of active aircraft.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aircraft.read().len()
    }

    /// No active aircraft.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active: self.len(),
            total_landings: self.total_landings.load(Ordering::Relaxed),
            emergency_landings: self.emergency_landings.load(Ordering::Relaxed),
            crashes: self.crashes.load(Ordering::Relaxed),
            diversions: self.diversions.load(Ordering::Relaxed),
        }
    }
}

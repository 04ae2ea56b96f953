//! Runway pool with priority-ordered permit acquisition.
//!
//! At most `capacity` runways are occupied at once. Blocked acquirers form a
//! single wait set ordered by (priority, sequence); only the head of that set
//! may take a runway, so a more urgent aircraft is never overtaken by a less
//! urgent one once both are waiting. The wait set is shared by every worker
//! lane.

use std::collections::{BTreeSet, HashMap, HashSet};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::core::SchedulerError;
use crate::util::clock::now_ms;
use crate::util::ids::{AircraftId, Priority, RunwayId};

/// Observable runway status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunwayStatus {
    /// Open and unoccupied.
    Free,
    /// Held by an aircraft.
    Occupied,
    /// Closed or weather-restricted, and unoccupied.
    Closed,
}

/// Point-in-time copy of a runway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwaySnapshot {
    /// Runway id.
    pub id: RunwayId,
    /// Derived status.
    pub status: RunwayStatus,
    /// Aircraft holding the runway.
    pub occupant: Option<AircraftId>,
    /// Operator open/closed flag.
    pub open: bool,
    /// Weather restriction flag.
    pub weather_restricted: bool,
    /// Last grant time, ms since epoch.
    pub last_used_ms: Option<u128>,
}

/// Ordering key of a blocked acquirer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireTicket {
    /// Requesting aircraft.
    pub aircraft_id: AircraftId,
    /// Priority at the time of the call; updated via
    /// [`RunwayPool::reprioritize_waiter`].
    pub priority: Priority,
    /// Tie-break order, normally the landing request's sequence.
    pub sequence: u64,
}

struct Runway {
    id: RunwayId,
    open: bool,
    weather_restricted: bool,
    occupant: Option<AircraftId>,
    last_used_ms: Option<u128>,
}

impl Runway {
    fn new(id: RunwayId) -> Self {
        Self {
            id,
            open: true,
            weather_restricted: false,
            occupant: None,
            last_used_ms: None,
        }
    }

    fn status(&self) -> RunwayStatus {
        if self.occupant.is_some() {
            RunwayStatus::Occupied
        } else if !self.open || self.weather_restricted {
            RunwayStatus::Closed
        } else {
            RunwayStatus::Free
        }
    }

    fn snapshot(&self) -> RunwaySnapshot {
        RunwaySnapshot {
            id: self.id.clone(),
            status: self.status(),
            occupant: self.occupant.clone(),
            open: self.open,
            weather_restricted: self.weather_restricted,
            last_used_ms: self.last_used_ms,
        }
    }
}

struct PoolState {
    runways: Vec<Runway>,
    permits_available: usize,
    waiters: BTreeSet<(Priority, u64, AircraftId)>,
    waiting: HashMap<AircraftId, (Priority, u64)>,
    abandoned: HashSet<AircraftId>,
    closed: bool,
}

impl PoolState {
    fn runway_mut(&mut self, id: &RunwayId) -> Result<&mut Runway, SchedulerError> {
        self.runways
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| SchedulerError::UnknownRunway(id.clone()))
    }

    fn is_head(&self, id: &AircraftId) -> bool {
        self.waiters.first().is_some_and(|(_, _, head)| head == id)
    }

    fn remove_waiter(&mut self, id: &AircraftId) {
        if let Some((priority, sequence)) = self.waiting.remove(id) {
            self.waiters.remove(&(priority, sequence, id.clone()));
        }
        self.abandoned.remove(id);
    }

    /// Grant the first eligible runway to `id` if a permit is free.
    fn grant(&mut self, id: &AircraftId) -> Option<RunwayId> {
        if self.permits_available == 0 {
            return None;
        }
        let runway = self
            .runways
            .iter_mut()
            .find(|r| r.status() == RunwayStatus::Free)?;
        runway.occupant = Some(id.clone());
        runway.last_used_ms = Some(now_ms());
        self.permits_available -= 1;
        Some(runway.id.clone())
    }
}

/// Fixed set of runways guarded by a counting permit.
pub struct RunwayPool {
    capacity: usize,
    state: Mutex<PoolState>,
    changed: Condvar,
}

impl RunwayPool {
    /// Create a pool over `runways` with `permits` concurrent landings.
    pub fn new(runways: Vec<RunwayId>, permits: usize) -> Result<Self, SchedulerError> {
        if runways.is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "runway pool needs at least one runway".into(),
            ));
        }
        if permits == 0 || permits > runways.len() {
            return Err(SchedulerError::InvalidConfig(format!(
                "runway permits must be within 1..={}",
                runways.len()
            )));
        }
        Ok(Self {
            capacity: permits,
            state: Mutex::new(PoolState {
                runways: runways.into_iter().map(Runway::new).collect(),
                permits_available: permits,
                waiters: BTreeSet::new(),
                waiting: HashMap::new(),
                abandoned: HashSet::new(),
                closed: false,
            }),
            changed: Condvar::new(),
        })
    }

    /// Block until the ticket holder is the most urgent waiter and both a
    /// permit and an open runway are available.
    ///
    /// # Errors
    /// - [`SchedulerError::ShuttingDown`] once [`shutdown`](Self::shutdown) runs.
    /// - [`SchedulerError::AcquireAbandoned`] if [`abandon`](Self::abandon)
    ///   was called for this aircraft while it waited.
    /// - [`SchedulerError::AlreadyQueued`] if the aircraft is already waiting.
    pub fn acquire(&self, ticket: &AcquireTicket) -> Result<RunwayId, SchedulerError> {
        let id = &ticket.aircraft_id;
        let mut state = self.state.lock();
        if state.closed {
            return Err(SchedulerError::ShuttingDown);
        }
        if state.waiting.contains_key(id) {
            return Err(SchedulerError::AlreadyQueued(id.clone()));
        }
        state
            .waiters
            .insert((ticket.priority, ticket.sequence, id.clone()));
        state
            .waiting
            .insert(id.clone(), (ticket.priority, ticket.sequence));

        loop {
            if state.closed {
                state.remove_waiter(id);
                return Err(SchedulerError::ShuttingDown);
            }
            if state.abandoned.contains(id) {
                state.remove_waiter(id);
                drop(state);
                self.changed.notify_all();
                return Err(SchedulerError::AcquireAbandoned(id.clone()));
            }
            if state.is_head(id) {
                if let Some(runway) = state.grant(id) {
                    state.remove_waiter(id);
                    let permits_left = state.permits_available;
                    drop(state);
                    // The next waiter may be able to proceed too.
                    self.changed.notify_all();
                    tracing::info!(
                        aircraft_id = %id,
                        runway = %runway,
                        permits_left,
                        "runway granted"
                    );
                    return Ok(runway);
                }
            }
            self.changed.wait(&mut state);
        }
    }

    /// Acquire and wrap the runway in a guard that releases it on drop.
    pub fn acquire_lease(&self, ticket: &AcquireTicket) -> Result<RunwayLease<'_>, SchedulerError> {
        let runway = self.acquire(ticket)?;
        Ok(RunwayLease {
            pool: self,
            aircraft_id: ticket.aircraft_id.clone(),
            runway,
            released: false,
        })
    }

    /// Take a runway without blocking. Returns `None` when anyone is already
    /// waiting, nothing is free, or the pool is shut down.
    pub fn try_acquire(&self, aircraft_id: &AircraftId) -> Option<RunwayId> {
        let mut state = self.state.lock();
        if state.closed || !state.waiters.is_empty() {
            return None;
        }
        state.grant(aircraft_id)
    }

    /// Return a runway and its permit. Returns the aircraft that held it.
    pub fn release(&self, runway_id: &RunwayId) -> Result<AircraftId, SchedulerError> {
        let mut state = self.state.lock();
        let runway = state.runway_mut(runway_id)?;
        let occupant = runway
            .occupant
            .take()
            .ok_or_else(|| SchedulerError::RunwayNotOccupied(runway_id.clone()))?;
        state.permits_available = (state.permits_available + 1).min(self.capacity);
        drop(state);
        self.changed.notify_all();
        tracing::info!(aircraft_id = %occupant, runway = %runway_id, "runway released");
        Ok(occupant)
    }

    /// Restrict a runway for weather. An occupant finishes its landing.
    pub fn close_for_weather(&self, runway_id: &RunwayId) -> Result<(), SchedulerError> {
        self.set_weather_restriction(runway_id, true)
    }

    /// Lift weather restrictions and reopen a runway.
    pub fn reopen(&self, runway_id: &RunwayId) -> Result<(), SchedulerError> {
        {
            let mut state = self.state.lock();
            let runway = state.runway_mut(runway_id)?;
            runway.weather_restricted = false;
            runway.open = true;
        }
        self.changed.notify_all();
        tracing::info!(runway = %runway_id, "runway reopened");
        Ok(())
    }

    /// Set or clear the weather restriction on a runway.
    pub fn set_weather_restriction(
        &self,
        runway_id: &RunwayId,
        restricted: bool,
    ) -> Result<(), SchedulerError> {
        {
            let mut state = self.state.lock();
            state.runway_mut(runway_id)?.weather_restricted = restricted;
        }
        if !restricted {
            self.changed.notify_all();
        }
        tracing::info!(runway = %runway_id, restricted, "runway weather restriction updated");
        Ok(())
    }

    /// Close a runway for operational reasons.
    pub fn close(&self, runway_id: &RunwayId) -> Result<(), SchedulerError> {
        self.state.lock().runway_mut(runway_id)?.open = false;
        tracing::info!(runway = %runway_id, "runway closed");
        Ok(())
    }

    /// Reopen an operationally closed runway. Weather restrictions stay.
    pub fn open(&self, runway_id: &RunwayId) -> Result<(), SchedulerError> {
        self.state.lock().runway_mut(runway_id)?.open = true;
        self.changed.notify_all();
        tracing::info!(runway = %runway_id, "runway opened");
        Ok(())
    }

    /// Move a blocked acquirer to a new priority. Returns `false` if the
    /// aircraft is not waiting.
    pub fn reprioritize_waiter(&self, aircraft_id: &AircraftId, priority: Priority) -> bool {
        let mut state = self.state.lock();
        let Some((old, sequence)) = state.waiting.get(aircraft_id).copied() else {
            return false;
        };
        if old == priority {
            return true;
        }
        state.waiters.remove(&(old, sequence, aircraft_id.clone()));
        state.waiters.insert((priority, sequence, aircraft_id.clone()));
        state.waiting.insert(aircraft_id.clone(), (priority, sequence));
        drop(state);
        self.changed.notify_all();
        true
    }

    /// Make a blocked acquire for this aircraft fail with
    /// [`SchedulerError::AcquireAbandoned`]. Returns `false` if it is not waiting.
    pub fn abandon(&self, aircraft_id: &AircraftId) -> bool {
        let mut state = self.state.lock();
        if !state.waiting.contains_key(aircraft_id) {
            return false;
        }
        state.abandoned.insert(aircraft_id.clone());
        drop(state);
        self.changed.notify_all();
        true
    }

    /// Fail every blocked and future acquire. Held runways can still be
    /// released.
    pub fn shutdown(&self) {
        self.state.lock().closed = true;
        self.changed.notify_all();
    }

    /// Whether [`shutdown`](Self::shutdown) ran.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.state.lock().closed
    }

    /// Snapshot of every runway, in configuration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RunwaySnapshot> {
        self.state.lock().runways.iter().map(Runway::snapshot).collect()
    }

    /// Permits not currently held.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.state.lock().permits_available
    }

    /// Runways currently held.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.state
            .lock()
            .runways
            .iter()
            .filter(|r| r.occupant.is_some())
            .count()
    }

    /// Blocked acquirers.
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Blocked acquirers, most urgent first.
    #[must_use]
    pub fn waiting_ids(&self) -> Vec<AircraftId> {
        self.state
            .lock()
            .waiters
            .iter()
            .map(|(_, _, id)| id.clone())
            .collect()
    }

    /// Maximum concurrent landings.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for RunwayPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunwayPool")
            .field("capacity", &self.capacity)
            .field("available", &self.available_permits())
            .field("waiting", &self.waiting_count())
            .finish()
    }
}

/// A held runway. Dropping the lease releases the runway.
#[derive(Debug)]
pub struct RunwayLease<'a> {
    pool: &'a RunwayPool,
    aircraft_id: AircraftId,
    runway: RunwayId,
    released: bool,
}

impl RunwayLease<'_> {
    /// The held runway.
    #[must_use]
    pub const fn runway(&self) -> &RunwayId {
        &self.runway
    }

    /// The aircraft holding the runway.
    #[must_use]
    pub const fn aircraft_id(&self) -> &AircraftId {
        &self.aircraft_id
    }

    /// Release now and report the outcome.
    pub fn release(mut self) -> Result<AircraftId, SchedulerError> {
        self.released = true;
        self.pool.release(&self.runway)
    }
}

impl Drop for RunwayLease<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.pool.release(&self.runway) {
            tracing::warn!(runway = %self.runway, error = %e, "runway lease release failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn pool(n: usize, permits: usize) -> RunwayPool {
        let ids = (1..=n).map(|i| RunwayId::new(format!("RW{i:02}"))).collect();
        RunwayPool::new(ids, permits).unwrap()
    }

    fn ticket(id: &str, priority: Priority, sequence: u64) -> AcquireTicket {
        AcquireTicket {
            aircraft_id: AircraftId::from(id),
            priority,
            sequence,
        }
    }

    #[test]
    fn test_rejects_bad_capacity() {
        assert!(RunwayPool::new(Vec::new(), 1).is_err());
        assert!(RunwayPool::new(vec![RunwayId::new("RW01")], 2).is_err());
        assert!(RunwayPool::new(vec![RunwayId::new("RW01")], 0).is_err());
    }

    #[test]
    fn test_acquire_release_round_trip() {
        let p = pool(2, 2);
        let first = p.acquire(&ticket("A", 100, 0)).unwrap();
        assert_eq!(first, RunwayId::new("RW01"));
        assert_eq!(p.available_permits(), 1);
        assert_eq!(p.occupied_count(), 1);
        assert_eq!(p.release(&first).unwrap(), AircraftId::from("A"));
        assert_eq!(p.available_permits(), 2);
        assert!(matches!(
            p.release(&first),
            Err(SchedulerError::RunwayNotOccupied(_))
        ));
        assert!(matches!(
            p.release(&RunwayId::new("RW99")),
            Err(SchedulerError::UnknownRunway(_))
        ));
    }

    #[test]
    fn test_permits_cap_occupancy() {
        let p = pool(3, 1);
        assert!(p.try_acquire(&AircraftId::from("A")).is_some());
        assert!(p.try_acquire(&AircraftId::from("B")).is_none());
        assert_eq!(p.occupied_count(), 1);
    }

    #[test]
    fn test_lease_releases_on_drop() {
        let p = pool(1, 1);
        {
            let lease = p.acquire_lease(&ticket("A", 1, 0)).unwrap();
            assert_eq!(lease.runway(), &RunwayId::new("RW01"));
            assert_eq!(p.available_permits(), 0);
        }
        assert_eq!(p.available_permits(), 1);
        assert_eq!(p.snapshot()[0].status, RunwayStatus::Free);
    }

    #[test]
    fn test_occupied_runway_closed_reports_closed_after_release() {
        let p = pool(1, 1);
        let rw = p.acquire(&ticket("A", 1, 0)).unwrap();
        p.close_for_weather(&rw).unwrap();
        assert_eq!(p.snapshot()[0].status, RunwayStatus::Occupied);
        p.release(&rw).unwrap();
        assert_eq!(p.snapshot()[0].status, RunwayStatus::Closed);
        assert!(p.try_acquire(&AircraftId::from("B")).is_none());
        p.reopen(&rw).unwrap();
        assert!(p.try_acquire(&AircraftId::from("B")).is_some());
    }

    #[test]
    fn test_abandon_wakes_waiter() {
        let p = Arc::new(pool(1, 1));
        let held = p.acquire(&ticket("A", 1, 0)).unwrap();
        let waiter = {
            let p = Arc::clone(&p);
            thread::spawn(move || p.acquire(&ticket("B", 5, 1)))
        };
        while p.waiting_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(p.abandon(&AircraftId::from("B")));
        assert!(matches!(
            waiter.join().unwrap(),
            Err(SchedulerError::AcquireAbandoned(_))
        ));
        assert!(!p.abandon(&AircraftId::from("B")));
        assert_eq!(p.waiting_count(), 0);
        p.release(&held).unwrap();
    }

    #[test]
    fn test_shutdown_fails_waiters() {
        let p = Arc::new(pool(1, 1));
        let _held = p.acquire(&ticket("A", 1, 0)).unwrap();
        let waiter = {
            let p = Arc::clone(&p);
            thread::spawn(move || p.acquire(&ticket("B", 5, 1)))
        };
        while p.waiting_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        p.shutdown();
        assert!(matches!(
            waiter.join().unwrap(),
            Err(SchedulerError::ShuttingDown)
        ));
        assert!(matches!(
            p.acquire(&ticket("C", 1, 2)),
            Err(SchedulerError::ShuttingDown)
        ));
    }

    #[test]
    fn test_reprioritized_waiter_goes_first() {
        let p = Arc::new(pool(1, 1));
        let held = p.acquire(&ticket("HOLD", 1, 0)).unwrap();
        let spawn = |name: &'static str, priority, sequence| {
            let p = Arc::clone(&p);
            thread::spawn(move || p.acquire(&ticket(name, priority, sequence)).map(|rw| (name, rw)))
        };
        let slow = spawn("SLOW", 100, 1);
        let late = spawn("LATE", 100, 2);
        while p.waiting_count() < 2 {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(p.reprioritize_waiter(&AircraftId::from("LATE"), 10));
        assert_eq!(
            p.waiting_ids(),
            vec![AircraftId::from("LATE"), AircraftId::from("SLOW")]
        );

        p.release(&held).unwrap();
        let (name, rw) = late.join().unwrap().unwrap();
        assert_eq!(name, "LATE");
        assert_eq!(p.waiting_count(), 1);
        p.release(&rw).unwrap();
        let (name, rw) = slow.join().unwrap().unwrap();
        assert_eq!(name, "SLOW");
        p.release(&rw).unwrap();
    }
}

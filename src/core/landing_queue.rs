//! Blocking priority queue of landing requests.
//!
//! Lower priority values dequeue first; equal priorities dequeue in
//! enqueue order. Priorities may change while a request waits: the request
//! is re-inserted under a new generation and the stale heap entry is skipped
//! when it surfaces.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::aircraft::SharedAircraft;
use crate::core::SchedulerError;
use crate::util::clock::now_ms;
use crate::util::ids::{AircraftId, Priority};

/// Process-wide enqueue order, shared by every queue so that a request moved
/// between lanes keeps its place among equal priorities.
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Stale heap entries tolerated before the heap is rebuilt.
const COMPACT_THRESHOLD: usize = 64;

/// A pending landing request.
#[derive(Debug, Clone)]
pub struct LandingRequest {
    /// The requesting aircraft.
    pub aircraft: SharedAircraft,
    /// Its id, cached so ordering never needs the aircraft lock.
    pub aircraft_id: AircraftId,
    /// Priority the request is ordered by.
    pub priority: Priority,
    /// Creation time, ms since epoch.
    pub enqueued_at_ms: u128,
    /// Tie-break order among equal priorities.
    pub sequence: u64,
}

impl LandingRequest {
    /// Build a request at the aircraft's current priority.
    #[must_use]
    pub fn new(aircraft: SharedAircraft) -> Self {
        let priority = aircraft.lock().priority();
        Self::with_priority(aircraft, priority)
    }

    /// Build a request at an explicit priority.
    #[must_use]
    pub fn with_priority(aircraft: SharedAircraft, priority: Priority) -> Self {
        let aircraft_id = aircraft.lock().id().clone();
        Self {
            aircraft,
            aircraft_id,
            priority,
            enqueued_at_ms: now_ms(),
            sequence: NEXT_SEQUENCE.fetch_add(1, AtomicOrdering::Relaxed),
        }
    }
}

/// Heap entry ordered as a min-heap on (priority, sequence).
struct QueueEntry {
    priority: Priority,
    sequence: u64,
    generation: u64,
    aircraft_id: AircraftId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse so the lowest value surfaces.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<QueueEntry>,
    pending: HashMap<AircraftId, (LandingRequest, u64)>,
    next_generation: u64,
    closed: bool,
}

impl QueueState {
    fn push(&mut self, request: LandingRequest) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.heap.push(QueueEntry {
            priority: request.priority,
            sequence: request.sequence,
            generation,
            aircraft_id: request.aircraft_id.clone(),
        });
        self.pending
            .insert(request.aircraft_id.clone(), (request, generation));
    }

    fn pop(&mut self) -> Option<LandingRequest> {
        while let Some(entry) = self.heap.pop() {
            let live = self
                .pending
                .get(&entry.aircraft_id)
                .is_some_and(|(_, generation)| *generation == entry.generation);
            if live {
                return self
                    .pending
                    .remove(&entry.aircraft_id)
                    .map(|(request, _)| request);
            }
        }
        None
    }

    fn compact_if_needed(&mut self) {
        let stale = self.heap.len().saturating_sub(self.pending.len());
        if stale <= COMPACT_THRESHOLD || stale <= self.pending.len() {
            return;
        }
        let pending = &self.pending;
        let entries: Vec<_> = self
            .heap
            .drain()
            .filter(|e| {
                pending
                    .get(&e.aircraft_id)
                    .is_some_and(|(_, generation)| *generation == e.generation)
            })
            .collect();
        self.heap = entries.into_iter().collect();
    }
}

/// Thread-safe landing queue with blocking dequeue.
pub struct LandingQueue {
    label: &'static str,
    state: Mutex<QueueState>,
    available: Condvar,
}

impl LandingQueue {
    /// Create an empty queue; `label` appears in logs.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
        }
    }

    /// Queue label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Add a request. An aircraft may have at most one pending request.
    pub fn enqueue(&self, request: LandingRequest) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(SchedulerError::ShuttingDown);
        }
        if state.pending.contains_key(&request.aircraft_id) {
            return Err(SchedulerError::AlreadyQueued(request.aircraft_id));
        }
        tracing::debug!(
            queue = self.label,
            aircraft_id = %request.aircraft_id,
            priority = request.priority,
            "landing request enqueued"
        );
        state.push(request);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Block until a request is available. Returns `None` once the queue is
    /// closed.
    pub fn dequeue_blocking(&self) -> Option<LandingRequest> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(request) = state.pop() {
                return Some(request);
            }
            self.available.wait(&mut state);
        }
    }

    /// Like [`dequeue_blocking`](Self::dequeue_blocking) but gives up after
    /// `timeout`.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<LandingRequest> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(request) = state.pop() {
                return Some(request);
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return if state.closed { None } else { state.pop() };
            }
        }
    }

    /// Pop the head without blocking.
    pub fn try_dequeue(&self) -> Option<LandingRequest> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.pop()
    }

    /// Change the priority of a pending request, keeping its sequence.
    /// Returns `false` if the aircraft has no pending request.
    pub fn reprioritize(&self, aircraft_id: &AircraftId, priority: Priority) -> bool {
        let mut state = self.state.lock();
        match state.pending.get(aircraft_id) {
            None => return false,
            Some((request, _)) if request.priority == priority => return true,
            Some(_) => {}
        }
        let Some((mut request, _)) = state.pending.remove(aircraft_id) else {
            return false;
        };
        tracing::debug!(
            queue = self.label,
            aircraft_id = %aircraft_id,
            from = request.priority,
            to = priority,
            "landing request reprioritized"
        );
        request.priority = priority;
        state.push(request);
        state.compact_if_needed();
        true
    }

    /// Remove a pending request.
    pub fn remove(&self, aircraft_id: &AircraftId) -> Option<LandingRequest> {
        let mut state = self.state.lock();
        let removed = state.pending.remove(aircraft_id).map(|(request, _)| request);
        if removed.is_some() {
            state.compact_if_needed();
        }
        removed
    }

    /// Whether the aircraft has a pending request here.
    #[must_use]
    pub fn contains(&self, aircraft_id: &AircraftId) -> bool {
        self.state.lock().pending.contains_key(aircraft_id)
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Alias for [`len`](Self::len).
    #[must_use]
    pub fn size(&self) -> usize {
        self.len()
    }

    /// No pending requests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pending aircraft in dequeue order.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<AircraftId> {
        let state = self.state.lock();
        let mut pending: Vec<_> = state
            .pending
            .values()
            .map(|(r, _)| (r.priority, r.sequence, r.aircraft_id.clone()))
            .collect();
        pending.sort_unstable();
        pending.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Close the queue, waking every blocked consumer.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
        tracing::debug!(queue = self.label, "landing queue closed");
    }

    /// Whether [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl std::fmt::Debug for LandingQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LandingQueue")
            .field("label", &self.label)
            .field("len", &self.len())
            .finish()
    }
}

//! In-memory sink backends for development and testing.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::sink::{
    EventCategory, LandingRecord, Notification, NotificationSink, PersistenceSink, SchedulerEvent,
    SinkError,
};
use crate::util::ids::AircraftId;

/// Default number of records kept per buffer.
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

fn push_bounded<T>(buffer: &mut VecDeque<T>, max: usize, item: T) {
    if buffer.len() >= max {
        buffer.pop_front();
    }
    buffer.push_back(item);
}

/// Bounded in-memory persistence; the oldest records are evicted first.
pub struct InMemoryPersistenceSink {
    landings: Mutex<VecDeque<LandingRecord>>,
    events: Mutex<VecDeque<SchedulerEvent>>,
    max_records: usize,
}

impl InMemoryPersistenceSink {
    /// Create a sink keeping at most `max_records` landings and events each.
    #[must_use]
    pub fn new(max_records: usize) -> Self {
        let max_records = max_records.max(1);
        Self {
            landings: Mutex::new(VecDeque::with_capacity(max_records.min(1024))),
            events: Mutex::new(VecDeque::with_capacity(max_records.min(1024))),
            max_records,
        }
    }

    /// Landings in the order they were recorded.
    #[must_use]
    pub fn landings(&self) -> Vec<LandingRecord> {
        self.landings.lock().iter().cloned().collect()
    }

    /// Ids of landed aircraft in landing order.
    #[must_use]
    pub fn landing_order(&self) -> Vec<AircraftId> {
        self.landings
            .lock()
            .iter()
            .map(|r| r.aircraft.id.clone())
            .collect()
    }

    /// Every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<SchedulerEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events of one category, optionally since a timestamp.
    #[must_use]
    pub fn events_for(&self, category: EventCategory, since_ms: Option<u128>) -> Vec<SchedulerEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.category == category)
            .filter(|e| since_ms.is_none_or(|s| e.created_at_ms >= s))
            .cloned()
            .collect()
    }
}

impl Default for InMemoryPersistenceSink {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORDS)
    }
}

impl PersistenceSink for InMemoryPersistenceSink {
    fn record_landing(&self, record: &LandingRecord) -> Result<(), SinkError> {
        push_bounded(&mut self.landings.lock(), self.max_records, record.clone());
        Ok(())
    }

    fn record_event(&self, event: &SchedulerEvent) -> Result<(), SinkError> {
        push_bounded(&mut self.events.lock(), self.max_records, event.clone());
        Ok(())
    }
}

/// Bounded in-memory notification log.
pub struct InMemoryNotificationSink {
    notifications: Mutex<VecDeque<Notification>>,
    max_records: usize,
}

impl InMemoryNotificationSink {
    /// Create a sink keeping at most `max_records` notifications.
    #[must_use]
    pub fn new(max_records: usize) -> Self {
        Self {
            notifications: Mutex::new(VecDeque::new()),
            max_records: max_records.max(1),
        }
    }

    /// Notifications in delivery order.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().iter().cloned().collect()
    }
}

impl Default for InMemoryNotificationSink {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORDS)
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        push_bounded(
            &mut self.notifications.lock(),
            self.max_records,
            notification.clone(),
        );
        Ok(())
    }
}

/// Sink that accepts and discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PersistenceSink for NullSink {
    fn record_landing(&self, _record: &LandingRecord) -> Result<(), SinkError> {
        Ok(())
    }

    fn record_event(&self, _event: &SchedulerEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

impl NotificationSink for NullSink {
    fn notify(&self, _notification: &Notification) -> Result<(), SinkError> {
        Ok(())
    }
}

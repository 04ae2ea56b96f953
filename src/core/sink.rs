//! Collaborator contracts for persistence and notification.
//!
//! Sinks are called from worker and escalation threads. A failing sink never
//! fails a landing: [`Reporter`] logs the error and moves on.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::aircraft::AircraftSnapshot;
use crate::core::worker_pool::Lane;
use crate::util::clock::now_ms;
use crate::util::ids::{AircraftId, RunwayId};

/// Category of a recorded scheduler event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// An aircraft landed.
    Landing,
    /// An emergency was declared.
    Emergency,
    /// The escalation engine changed an emergency level.
    Escalation,
    /// A request moved to the emergency fast path.
    FastPath,
    /// An aircraft crashed.
    Crash,
    /// An aircraft was diverted.
    Diversion,
    /// A runway was closed or reopened.
    Runway,
    /// A stale request was dropped by a worker.
    Discarded,
    /// Handling a request failed.
    Failure,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Landing => "landing",
            Self::Emergency => "emergency",
            Self::Escalation => "escalation",
            Self::FastPath => "fast_path",
            Self::Crash => "crash",
            Self::Diversion => "diversion",
            Self::Runway => "runway",
            Self::Discarded => "discarded",
            Self::Failure => "failure",
        };
        f.write_str(name)
    }
}

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine.
    Info,
    /// Needs attention.
    Warning,
    /// Loss of aircraft or imminent danger.
    Critical,
}

/// A recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerEvent {
    /// Event category.
    pub category: EventCategory,
    /// Related aircraft.
    pub aircraft_id: Option<AircraftId>,
    /// Human-readable detail.
    pub message: String,
    /// Timestamp, ms since epoch.
    pub created_at_ms: u128,
}

/// A completed landing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingRecord {
    /// Aircraft state at touchdown.
    pub aircraft: AircraftSnapshot,
    /// Runway used.
    pub runway: RunwayId,
    /// Lane that served the request.
    pub lane: Lane,
    /// Whether the aircraft carried an emergency.
    pub emergency: bool,
    /// Timestamp, ms since epoch.
    pub landed_at_ms: u128,
}

/// A notification for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Related aircraft.
    pub aircraft_id: Option<AircraftId>,
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// Timestamp, ms since epoch.
    pub created_at_ms: u128,
}

/// Collaborator failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The sink cannot accept input right now.
    #[error("sink unavailable: {0}")]
    Unavailable(String),
    /// The sink refused this input.
    #[error("sink rejected record: {0}")]
    Rejected(String),
}

/// Durable record of landings and events.
pub trait PersistenceSink: Send + Sync {
    /// Record a completed landing.
    fn record_landing(&self, record: &LandingRecord) -> Result<(), SinkError>;
    /// Record an event.
    fn record_event(&self, event: &SchedulerEvent) -> Result<(), SinkError>;
}

/// Best-effort operator notifications.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification. Implementations should not block.
    fn notify(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Fans scheduler output to the collaborators and absorbs their failures.
#[derive(Clone)]
pub struct Reporter {
    persistence: Arc<dyn PersistenceSink>,
    notifier: Arc<dyn NotificationSink>,
    failures: Arc<AtomicU64>,
}

impl Reporter {
    /// Create a reporter over the given sinks.
    #[must_use]
    pub fn new(persistence: Arc<dyn PersistenceSink>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            persistence,
            notifier,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Persist a landing.
    pub fn landing(&self, record: &LandingRecord) {
        if let Err(e) = self.persistence.record_landing(record) {
            self.failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                aircraft_id = %record.aircraft.id,
                runway = %record.runway,
                error = %e,
                "failed to persist landing"
            );
        }
    }

    /// Persist an event.
    pub fn event(&self, category: EventCategory, aircraft_id: Option<&AircraftId>, message: impl Into<String>) {
        let event = SchedulerEvent {
            category,
            aircraft_id: aircraft_id.cloned(),
            message: message.into(),
            created_at_ms: now_ms(),
        };
        if let Err(e) = self.persistence.record_event(&event) {
            self.failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(%category, error = %e, "failed to persist event");
        }
    }

    /// Send a notification.
    pub fn notify(&self, aircraft_id: Option<&AircraftId>, severity: Severity, message: impl Into<String>) {
        let notification = Notification {
            aircraft_id: aircraft_id.cloned(),
            severity,
            message: message.into(),
            created_at_ms: now_ms(),
        };
        if let Err(e) = self.notifier.notify(&notification) {
            self.failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(?severity, error = %e, "notification dropped");
        }
    }

    /// Sink calls that failed since startup.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("failures", &self.failures())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Flaky {
        seen: Mutex<Vec<String>>,
    }

    impl PersistenceSink for Flaky {
        fn record_landing(&self, _record: &LandingRecord) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("down".into()))
        }

        fn record_event(&self, event: &SchedulerEvent) -> Result<(), SinkError> {
            self.seen.lock().push(event.message.clone());
            Ok(())
        }
    }

    impl NotificationSink for Flaky {
        fn notify(&self, _notification: &Notification) -> Result<(), SinkError> {
            Err(SinkError::Rejected("no".into()))
        }
    }

    #[test]
    fn test_reporter_absorbs_failures() {
        let sink = Arc::new(Flaky::default());
        let reporter = Reporter::new(sink.clone(), sink.clone());
        reporter.event(EventCategory::Runway, None, "RW01 closed");
        reporter.notify(None, Severity::Warning, "RW01 closed");
        assert_eq!(sink.seen.lock().as_slice(), ["RW01 closed".to_string()]);
        assert_eq!(reporter.failures(), 1);
    }

    #[test]
    fn test_category_display_matches_serde() {
        let json = serde_json::to_string(&EventCategory::FastPath).unwrap();
        assert_eq!(json, format!("\"{}\"", EventCategory::FastPath));
    }
}

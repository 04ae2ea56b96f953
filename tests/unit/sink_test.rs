//! Tests for sink backends

use std::sync::Arc;

use runway_scheduler::core::{
    EventCategory, Notification, NotificationSink, PersistenceSink, Reporter, SchedulerEvent, Severity,
};
use runway_scheduler::infra::{ChannelNotifier, InMemoryNotificationSink, InMemoryPersistenceSink};
use runway_scheduler::util::{now_ms, AircraftId};

fn event(category: EventCategory, message: &str) -> SchedulerEvent {
    SchedulerEvent {
        category,
        aircraft_id: Some(AircraftId::from("EZY9")),
        message: message.to_string(),
        created_at_ms: now_ms(),
    }
}

#[test]
fn test_in_memory_persistence_sink() {
    let sink = InMemoryPersistenceSink::new(10);
    sink.record_event(&event(EventCategory::Emergency, "MEDICAL declared")).unwrap();
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].category, EventCategory::Emergency);
    assert_eq!(events[0].aircraft_id, Some(AircraftId::from("EZY9")));
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_persistence_sink_overflow() {
    let sink = InMemoryPersistenceSink::new(2);
    sink.record_event(&event(EventCategory::Runway, "evt1")).unwrap();
    sink.record_event(&event(EventCategory::Runway, "evt2")).unwrap();
    sink.record_event(&event(EventCategory::Runway, "evt3")).unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].message, "evt2"); // First one popped
    assert_eq!(events[1].message, "evt3");
}

#[test]
fn test_reporter_fans_out() {
    let persistence = Arc::new(InMemoryPersistenceSink::default());
    let notifications = Arc::new(InMemoryNotificationSink::default());
    let reporter = Reporter::new(persistence.clone(), notifications.clone());

    let id = AircraftId::from("AFR7");
    reporter.event(EventCategory::Crash, Some(&id), "fire timer expired");
    reporter.notify(Some(&id), Severity::Critical, "fire timer expired");

    assert_eq!(persistence.events_for(EventCategory::Crash, None).len(), 1);
    assert_eq!(notifications.notifications()[0].severity, Severity::Critical);
    assert_eq!(reporter.failures(), 0);
}

#[test]
fn test_channel_notifier_rejects_when_backlog_full() {
    struct Stuck(std::sync::Mutex<()>);
    impl NotificationSink for Stuck {
        fn notify(&self, _n: &Notification) -> Result<(), runway_scheduler::core::SinkError> {
            let _held = self.0.lock().unwrap();
            Ok(())
        }
    }

    let stuck = Arc::new(Stuck(std::sync::Mutex::new(())));
    let gate = stuck.0.lock().unwrap();
    let notifier = ChannelNotifier::spawn(stuck.clone(), 1).unwrap();
    let note = Notification {
        aircraft_id: None,
        severity: Severity::Info,
        message: "x".into(),
        created_at_ms: now_ms(),
    };

    // One in flight on the blocked thread, one in the backlog, the rest rejected.
    let accepted = (0..10).filter(|_| notifier.notify(&note).is_ok()).count();
    assert!(accepted <= 2);
    assert!(notifier.dropped() >= 8);
    drop(gate);
    notifier.shutdown();
}

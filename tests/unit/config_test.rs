//! Tests for configuration validation

use std::time::Duration;

use runway_scheduler::config::{EscalationPolicy, PriorityTable, SchedulerConfig};
use runway_scheduler::core::EmergencyLevel;

#[test]
fn test_scheduler_config_validation() {
    let valid = SchedulerConfig::default()
        .with_runways(["09L", "09R", "27"])
        .with_runway_permits(3)
        .with_worker_count(4)
        .with_emergency_worker_count(1);
    assert!(valid.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_permits() {
    assert!(SchedulerConfig::default().with_runway_permits(0).validate().is_err());
    assert!(SchedulerConfig::default().with_runway_permits(3).validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_workers() {
    assert!(SchedulerConfig::default().with_worker_count(0).validate().is_err());
    assert!(SchedulerConfig::default()
        .with_emergency_worker_count(0)
        .validate()
        .is_err());
}

#[test]
fn test_scheduler_config_invalid_runways() {
    assert!(SchedulerConfig::default()
        .with_runways(Vec::<String>::new())
        .validate()
        .is_err());
    assert!(SchedulerConfig::default()
        .with_runways(["09", "09"])
        .with_runway_permits(1)
        .validate()
        .is_err());
}

#[test]
fn test_scheduler_config_invalid_time_scale() {
    let cfg = SchedulerConfig {
        time_scale: 0.0,
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_durations() {
    let cfg = SchedulerConfig::default()
        .with_landing_durations(Duration::from_millis(250), Duration::from_millis(50))
        .with_escalation_interval(Duration::from_millis(10));
    assert_eq!(cfg.landing_duration(), Duration::from_millis(250));
    assert_eq!(cfg.emergency_landing_duration(), Duration::from_millis(50));
    assert_eq!(cfg.escalation_interval(), Duration::from_millis(10));
}

#[test]
fn test_from_json_partial_document() {
    let cfg = SchedulerConfig::from_json_str(
        r#"{
            "runways": ["04", "22", "13"],
            "runway_permits": 2,
            "escalation": { "fire_timer_secs": 120.0, "priorities": { "fire": 0 } }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.runways.len(), 3);
    assert_eq!(cfg.worker_count, 3);
    assert_eq!(cfg.escalation.fire_timer_secs, 120.0);
    assert_eq!(cfg.escalation.priorities.fire, 0);
    assert_eq!(cfg.escalation.priorities.fuel_low, 50);
}

#[test]
fn test_from_json_rejects_invalid() {
    let err = SchedulerConfig::from_json_str(r#"{"runway_permits": 9}"#).unwrap_err();
    assert!(err.contains("runway_permits"));
}

#[test]
fn test_priority_table_order() {
    let table = PriorityTable::default();
    let order = [
        EmergencyLevel::Fire,
        EmergencyLevel::FuelCritical,
        EmergencyLevel::Security,
        EmergencyLevel::Medical,
        EmergencyLevel::Weather,
        EmergencyLevel::FuelLow,
        EmergencyLevel::None,
    ];
    for pair in order.windows(2) {
        assert!(table.for_level(pair[0]) < table.for_level(pair[1]));
    }
}

#[test]
fn test_escalation_policy_invalid_timer() {
    let policy = EscalationPolicy {
        fire_timer_secs: 0.0,
        ..EscalationPolicy::default()
    };
    assert!(policy.validate().is_err());
}

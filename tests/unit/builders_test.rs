//! Tests for builder modules

use std::sync::Arc;

use runway_scheduler::builders::SchedulerBuilder;
use runway_scheduler::config::SchedulerConfig;
use runway_scheduler::core::SchedulerError;
use runway_scheduler::infra::InMemoryPersistenceSink;

#[test]
fn test_scheduler_builder_defaults() {
    let builder = SchedulerBuilder::new();
    assert_eq!(builder.config().runway_permits, 2);
    assert_eq!(builder.config().worker_count, 3);

    let scheduler = builder
        .with_persistence(Arc::new(InMemoryPersistenceSink::default()))
        .build()
        .unwrap();
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.list_runways().len(), 2);
}

#[test]
fn test_scheduler_builder_rejects_invalid_config() {
    let config = SchedulerConfig::default().with_runway_permits(5);
    let err = SchedulerBuilder::new().with_config(config).build().unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
}

#[test]
fn test_scheduler_builder_from_json() {
    let builder = SchedulerBuilder::from_json_str(r#"{"runways": ["09", "27"], "worker_count": 1}"#)
        .unwrap();
    assert_eq!(builder.config().worker_count, 1);
    assert!(SchedulerBuilder::from_json_str("{not json").is_err());
}

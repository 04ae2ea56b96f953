//! Tests for error types

use runway_scheduler::core::{AircraftStatus, EmergencyLevel, SchedulerError};
use runway_scheduler::util::{AircraftId, RunwayId};

#[test]
fn test_unknown_aircraft_error() {
    let err = SchedulerError::UnknownAircraft(AircraftId::from("BAW1"));
    assert_eq!(format!("{}", err), "unknown aircraft: BAW1");
}

#[test]
fn test_unknown_runway_error() {
    let err = SchedulerError::UnknownRunway(RunwayId::new("RW09"));
    assert_eq!(format!("{}", err), "unknown runway: RW09");
}

#[test]
fn test_invalid_transition_error() {
    let err = SchedulerError::InvalidTransition {
        aircraft: AircraftId::from("DLH4"),
        from: AircraftStatus::Landing,
        to: AircraftStatus::Diverted,
    };
    assert_eq!(format!("{}", err), "invalid transition for DLH4: Landing -> Diverted");
}

#[test]
fn test_not_declarable_error() {
    let err = SchedulerError::NotDeclarable(EmergencyLevel::FuelCritical);
    assert_eq!(format!("{}", err), "emergency level FuelCritical cannot be declared");
}

#[test]
fn test_shutdown_error() {
    assert_eq!(format!("{}", SchedulerError::ShuttingDown), "scheduler is shutting down");
}

//! Tests for utility functions

use runway_scheduler::util::{now_ms, AircraftId, Priority, RunwayId};

#[test]
fn test_priority_lower_is_more_urgent() {
    let fire: Priority = 1;
    let routine: Priority = 100;
    assert!(fire < routine);
}

#[test]
fn test_aircraft_id() {
    let id = AircraftId::from("KLM42");
    assert_eq!(id.as_str(), "KLM42");
    assert_eq!(id.to_string(), "KLM42");
    assert_ne!(AircraftId::generate(), AircraftId::generate());
}

#[test]
fn test_ids_serialize_transparently() {
    let json = serde_json::to_string(&RunwayId::new("27L")).unwrap();
    assert_eq!(json, "\"27L\"");
    let back: AircraftId = serde_json::from_str("\"UAL1\"").unwrap();
    assert_eq!(back, AircraftId::from("UAL1"));
}

#[test]
fn test_clock_moves_forward() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
    assert!(a > 0);
}

//! Tests for presentation API helpers

use runway_scheduler::builders::SchedulerBuilder;
use runway_scheduler::core::FlightProfile;
use runway_scheduler::runtime::{health, submit_landing, tower_snapshot, LandingSubmission};

#[test]
fn test_submit_landing_generates_id() {
    let scheduler = SchedulerBuilder::new().build().unwrap();
    let id = submit_landing(
        &scheduler,
        LandingSubmission {
            aircraft_id: None,
            callsign: "SAS11".into(),
            profile: FlightProfile {
                fuel: 3_000.0,
                burn_rate_per_hour: 60.0,
                speed_mps: 80.0,
                distance_m: 30_000.0,
            },
            emergency: None,
        },
    )
    .unwrap();

    let snapshot = tower_snapshot(&scheduler);
    assert_eq!(snapshot.aircraft[0].id, id);
    assert_eq!(snapshot.aircraft[0].callsign, "SAS11");
    assert_eq!(snapshot.stats.main_queue_depth, 1);
    assert!(!health(&scheduler).running);
}

//! Integration tests for the runway pool.
//!
//! This test validates:
//! 1. Concurrent occupancy never exceeds the permit count
//! 2. Acquire/release restores the runway and the permit
//! 3. Reopening a runway after weather wakes exactly the most urgent waiter
//! 4. Shutdown fails every remaining waiter

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use runway_scheduler::core::{AcquireTicket, RunwayPool, RunwayStatus, SchedulerError};
use runway_scheduler::util::{AircraftId, Priority, RunwayId};

fn pool(runways: &[&str], permits: usize) -> Arc<RunwayPool> {
    let ids = runways.iter().map(|r| RunwayId::new(*r)).collect();
    Arc::new(RunwayPool::new(ids, permits).unwrap())
}

fn ticket(id: &str, priority: Priority, sequence: u64) -> AcquireTicket {
    AcquireTicket {
        aircraft_id: AircraftId::from(id),
        priority,
        sequence,
    }
}

fn wait_for_waiters(pool: &RunwayPool, count: usize) {
    for _ in 0..500 {
        if pool.waiting_count() == count {
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("expected {count} waiters, saw {}", pool.waiting_count());
}

#[test]
fn test_occupancy_bounded_by_permits() {
    let pool = pool(&["09L", "09R", "27L"], 2);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for i in 0..25u64 {
                    let t = ticket(&format!("T{t}-{i}"), 100, t * 100 + i);
                    let runway = pool.acquire(&t).unwrap();
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    assert!(pool.occupied_count() <= 2);
                    thread::yield_now();
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    pool.release(&runway).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(pool.available_permits(), 2);
    assert_eq!(pool.occupied_count(), 0);
    assert_eq!(pool.waiting_count(), 0);
}

#[test]
fn test_acquire_release_round_trip() {
    let pool = pool(&["09L", "09R"], 2);
    let runway = pool.acquire(&ticket("A", 100, 1)).unwrap();
    assert_eq!(pool.available_permits(), 1);

    let snapshot = pool.snapshot();
    let held = snapshot.iter().find(|r| r.id == runway).unwrap();
    assert_eq!(held.status, RunwayStatus::Occupied);
    assert_eq!(held.occupant, Some(AircraftId::from("A")));

    assert_eq!(pool.release(&runway).unwrap(), AircraftId::from("A"));
    assert_eq!(pool.available_permits(), 2);
    assert!(matches!(
        pool.release(&runway),
        Err(SchedulerError::RunwayNotOccupied(_))
    ));
}

#[test]
fn test_lease_releases_on_drop() {
    let pool = pool(&["09L"], 1);
    {
        let lease = pool.acquire_lease(&ticket("A", 100, 1)).unwrap();
        assert_eq!(lease.runway().as_str(), "09L");
        assert_eq!(pool.available_permits(), 0);
    }
    assert_eq!(pool.available_permits(), 1);
}

#[test]
fn test_weather_reopen_serves_most_urgent() {
    let pool = pool(&["09L", "09R"], 2);
    pool.close_for_weather(&RunwayId::new("09L")).unwrap();
    pool.close_for_weather(&RunwayId::new("09R")).unwrap();

    let served = Arc::new(Mutex::new(Vec::new()));
    let mut handles = Vec::new();
    for (id, priority, seq) in [("A", 100, 1), ("B", 50, 2), ("C", 75, 3)] {
        let pool = Arc::clone(&pool);
        let served = Arc::clone(&served);
        handles.push(thread::spawn(move || {
            let result = pool.acquire(&ticket(id, priority, seq));
            if result.is_ok() {
                served.lock().push(id);
            }
            result
        }));
    }
    wait_for_waiters(&pool, 3);
    assert!(served.lock().is_empty());

    pool.reopen(&RunwayId::new("09L")).unwrap();
    wait_for_waiters(&pool, 2);
    // Give the other waiters a chance to (wrongly) proceed.
    thread::sleep(Duration::from_millis(20));
    assert_eq!(*served.lock(), vec!["B"]);
    assert_eq!(pool.occupied_count(), 1);

    pool.shutdown();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results[1], Ok(RunwayId::new("09L")));
    assert_eq!(results[0], Err(SchedulerError::ShuttingDown));
    assert_eq!(results[2], Err(SchedulerError::ShuttingDown));
    assert_eq!(pool.waiting_count(), 0);
}

#[test]
fn test_reprioritized_waiter_jumps_ahead() {
    let pool = pool(&["09L"], 1);
    let first = pool.acquire(&ticket("HOLD", 100, 0)).unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    let mut handles = Vec::new();
    for (id, seq) in [("A", 1), ("B", 2)] {
        let pool = Arc::clone(&pool);
        let order = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            let runway = pool.acquire(&ticket(id, 100, seq)).unwrap();
            order.lock().push(id);
            pool.release(&runway).unwrap();
        }));
    }
    wait_for_waiters(&pool, 2);
    assert!(pool.reprioritize_waiter(&AircraftId::from("B"), 10));
    pool.release(&first).unwrap();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(*order.lock(), vec!["B", "A"]);
}

#[test]
fn test_abandon_unblocks_waiter() {
    let pool = pool(&["09L"], 1);
    let held = pool.acquire(&ticket("HOLD", 100, 0)).unwrap();
    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.acquire(&ticket("LOST", 10, 1)))
    };
    wait_for_waiters(&pool, 1);
    assert!(pool.abandon(&AircraftId::from("LOST")));
    assert_eq!(
        waiter.join().unwrap(),
        Err(SchedulerError::AcquireAbandoned(AircraftId::from("LOST")))
    );
    pool.release(&held).unwrap();
    assert_eq!(pool.available_permits(), 1);
}

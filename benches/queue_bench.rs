//! Benchmarks for the landing scheduler.
//!
//! Benchmarks cover:
//! - Landing queue operations (enqueue/dequeue/priority ordering)
//! - Reprioritization of pending requests
//! - Runway pool acquire/release
//! - Escalation cycles over a populated registry
//! - End-to-end landings through live workers

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use runway_scheduler::config::SchedulerConfig;
use runway_scheduler::core::{
    AcquireTicket, Aircraft, FlightProfile, LandingQueue, LandingRequest, LandingScheduler,
    RunwayPool,
};
use runway_scheduler::infra::NullSink;
use runway_scheduler::util::{AircraftId, Priority, RunwayId};

// ============================================================================
// Helper Functions
// ============================================================================

fn build_aircraft(id: u64) -> Aircraft {
    Aircraft::with_id(
        AircraftId::from(format!("BENCH{id}")),
        format!("BENCH{id}"),
        FlightProfile {
            fuel: 2_000.0 + (id % 500) as f64,
            burn_rate_per_hour: 60.0,
            speed_mps: 100.0,
            distance_m: 50_000.0,
        },
    )
}

fn build_request(id: u64, priority: Priority) -> LandingRequest {
    LandingRequest::with_priority(build_aircraft(id).into_shared(), priority)
}

fn mixed_priority(i: u64) -> Priority {
    match i % 4 {
        0 => 1,
        1 => 20,
        2 => 50,
        _ => 100,
    }
}

// ============================================================================
// Queue Benchmarks
// ============================================================================

fn bench_queue_enqueue_dequeue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_enqueue_dequeue");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let q = LandingQueue::new("bench");
                for i in 0..size {
                    q.enqueue(build_request(i, 100)).unwrap();
                }
                while let Some(request) = q.try_dequeue() {
                    black_box(request);
                }
            });
        });
    }
    group.finish();
}

fn bench_queue_priority_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_priority_ordering");

    for size in [100, 1_000, 5_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let q = LandingQueue::new("bench");
                for i in 0..size {
                    q.enqueue(build_request(i, mixed_priority(i))).unwrap();
                }
                let mut count = 0;
                while q.try_dequeue().is_some() {
                    count += 1;
                }
                black_box(count);
            });
        });
    }
    group.finish();
}

fn bench_queue_reprioritize(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_reprioritize");

    for size in [100, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let q = LandingQueue::new("bench");
                for i in 0..size {
                    q.enqueue(build_request(i, 100)).unwrap();
                }
                // Escalate every tenth request twice, leaving stale entries.
                for i in (0..size).step_by(10) {
                    let id = AircraftId::from(format!("BENCH{i}"));
                    q.reprioritize(&id, 50);
                    q.reprioritize(&id, 10);
                }
                black_box(q.try_dequeue());
            });
        });
    }
    group.finish();
}

// ============================================================================
// Runway Pool Benchmarks
// ============================================================================

fn bench_runway_acquire_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("runway_acquire_release");

    for runways in [1usize, 4, 16] {
        group.bench_with_input(
            BenchmarkId::from_parameter(runways),
            &runways,
            |b, &runways| {
                let ids = (0..runways).map(|r| RunwayId::new(format!("RW{r:02}"))).collect();
                let pool = RunwayPool::new(ids, runways).unwrap();
                let ticket = AcquireTicket {
                    aircraft_id: AircraftId::from("BENCH"),
                    priority: 100,
                    sequence: 0,
                };
                b.iter(|| {
                    let runway = pool.acquire(&ticket).unwrap();
                    black_box(pool.release(&runway).unwrap());
                });
            },
        );
    }
    group.finish();
}

fn bench_runway_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("runway_contended");

    group.bench_function("four_threads_two_permits", |b| {
        b.iter(|| {
            let ids = vec![RunwayId::new("RW01"), RunwayId::new("RW02")];
            let pool = Arc::new(RunwayPool::new(ids, 2).unwrap());
            let handles: Vec<_> = (0..4u64)
                .map(|t| {
                    let pool = Arc::clone(&pool);
                    thread::spawn(move || {
                        for i in 0..50u64 {
                            let ticket = AcquireTicket {
                                aircraft_id: AircraftId::from(format!("T{t}-{i}")),
                                priority: mixed_priority(i),
                                sequence: t * 1_000 + i,
                            };
                            let runway = pool.acquire(&ticket).unwrap();
                            pool.release(&runway).unwrap();
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        });
    });
    group.finish();
}

// ============================================================================
// Escalation Benchmarks
// ============================================================================

fn bench_escalation_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("escalation_cycle");

    for fleet in [10u64, 100, 1_000] {
        group.throughput(Throughput::Elements(fleet));
        group.bench_with_input(BenchmarkId::from_parameter(fleet), &fleet, |b, &fleet| {
            let scheduler = LandingScheduler::new(
                SchedulerConfig::default(),
                Arc::new(NullSink),
                Arc::new(NullSink),
            )
            .unwrap();
            for i in 0..fleet {
                scheduler.request_landing(build_aircraft(i)).unwrap();
            }
            b.iter(|| black_box(scheduler.run_escalation_cycle(Duration::from_millis(10))));
        });
    }
    group.finish();
}

// ============================================================================
// End-to-End Scenario Benchmarks
// ============================================================================

fn bench_end_to_end_landings(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end_landings");
    group.sample_size(10);

    group.bench_function("hundred_landings", |b| {
        b.iter(|| {
            let config = SchedulerConfig::default()
                .with_runways(["RW01", "RW02", "RW03"])
                .with_runway_permits(3)
                .with_landing_durations(Duration::ZERO, Duration::ZERO)
                .with_escalation_interval(Duration::from_secs(60));
            let scheduler =
                LandingScheduler::new(config, Arc::new(NullSink), Arc::new(NullSink)).unwrap();
            scheduler.start().unwrap();
            for i in 0..100 {
                scheduler.request_landing(build_aircraft(i)).unwrap();
            }
            while scheduler.registry().stats().total_landings < 100 {
                thread::yield_now();
            }
            scheduler.shutdown();
        });
    });
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(
    queue_benches,
    bench_queue_enqueue_dequeue,
    bench_queue_priority_ordering,
    bench_queue_reprioritize
);

criterion_group!(runway_benches, bench_runway_acquire_release, bench_runway_contended);

criterion_group!(escalation_benches, bench_escalation_cycle);

criterion_group!(scenario_benches, bench_end_to_end_landings);

criterion_main!(queue_benches, runway_benches, escalation_benches, scenario_benches);

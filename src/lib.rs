//! # Runway Scheduler
//!
//! Priority-driven allocation of runways to landing aircraft.
//!
//! Aircraft enter the system, are registered, and queue a landing request.
//! Worker threads take requests in (priority, enqueue order), block for a
//! runway permit, occupy the runway for the landing, then release it and
//! report the outcome. A periodic escalation engine burns fuel, runs fire
//! countdowns, raises emergency levels and moves requests that need an
//! immediate landing onto a smaller emergency fast path.
//!
//! ## Key Features
//!
//! - **Priority Landing Queue**: blocking, FIFO among equal priorities, with
//!   priorities revisable while queued
//! - **Runway Pool**: counting permits over named runways, weather and
//!   operational closures, waiters served strictly by urgency
//! - **Escalation**: fuel tiers, declared emergencies, fire countdowns and
//!   crashes modelled as state, not errors
//! - **Emergency Fast Path**: dedicated workers with shortened occupancy
//! - **Collaborator Sinks**: persistence and notification failures are
//!   logged and never stop a worker
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use runway_scheduler::builders::SchedulerBuilder;
//! use runway_scheduler::core::{Aircraft, EmergencyLevel, FlightProfile};
//! use runway_scheduler::infra::InMemoryPersistenceSink;
//!
//! let persistence = Arc::new(InMemoryPersistenceSink::default());
//! let scheduler = SchedulerBuilder::from_env()?
//!     .with_persistence(persistence.clone())
//!     .start()?;
//!
//! let id = scheduler.request_landing(Aircraft::new("BAW123", FlightProfile {
//!     fuel: 40.0,
//!     burn_rate_per_hour: 60.0,
//!     speed_mps: 120.0,
//!     distance_m: 90_000.0,
//! }))?;
//! scheduler.declare_emergency(&id, EmergencyLevel::Medical)?;
//!
//! scheduler.shutdown();
//! ```
//!
//! For complete scenarios, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Aircraft state, queues, the runway pool, workers and escalation.
pub mod core;
/// Configuration models for runways, workers and escalation thresholds.
pub mod config;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// Infrastructure adapters for persistence and notification sinks.
pub mod infra;
/// Presentation API models and runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;

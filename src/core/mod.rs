//! Core scheduling: aircraft state, queues, the runway pool, workers and
//! the escalation engine.

pub mod aircraft;
pub mod context;
pub mod error;
pub mod escalation;
pub mod fast_path;
pub mod landing_queue;
pub mod registry;
pub mod runway_pool;
pub mod scheduler;
pub mod shutdown;
pub mod sink;
pub mod worker_pool;

pub use aircraft::{
    Aircraft, AircraftSnapshot, AircraftStatus, CrashCause, EmergencyLevel, Evaluation,
    FlightProfile, SharedAircraft, DEFAULT_PRIORITY,
};
pub use context::SchedulerContext;
pub use error::{AppResult, SchedulerError};
pub use escalation::{CycleReport, EscalationEngine};
pub use fast_path::EmergencyFastPath;
pub use landing_queue::{LandingQueue, LandingRequest};
pub use registry::{RegistryStats, ResourceRegistry};
pub use runway_pool::{AcquireTicket, RunwayLease, RunwayPool, RunwaySnapshot, RunwayStatus};
pub use scheduler::{LandingScheduler, SchedulerStats};
pub use shutdown::StopSignal;
pub use sink::{
    EventCategory, LandingRecord, Notification, NotificationSink, PersistenceSink, Reporter,
    SchedulerEvent, Severity, SinkError,
};
pub use worker_pool::{Lane, LandingOutcome, PoolStats, WorkerPool};

//! Configuration models for the scheduler, escalation thresholds and priorities.

pub mod scheduler;

pub use scheduler::{EscalationPolicy, PriorityTable, SchedulerConfig};

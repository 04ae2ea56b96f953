//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::aircraft::{AircraftStatus, EmergencyLevel};
use crate::util::ids::{AircraftId, RunwayId};

/// Errors produced by scheduler components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// No registered aircraft has this id.
    #[error("unknown aircraft: {0}")]
    UnknownAircraft(AircraftId),
    /// No runway has this id.
    #[error("unknown runway: {0}")]
    UnknownRunway(RunwayId),
    /// An aircraft with this id is already registered.
    #[error("aircraft already registered: {0}")]
    DuplicateAircraft(AircraftId),
    /// The aircraft already has a pending request or runway wait.
    #[error("aircraft already queued: {0}")]
    AlreadyQueued(AircraftId),
    /// The requested status change is not allowed by the state machine.
    #[error("invalid transition for {aircraft}: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Aircraft whose transition was rejected.
        aircraft: AircraftId,
        /// Current status.
        from: AircraftStatus,
        /// Requested status.
        to: AircraftStatus,
    },
    /// The aircraft already reached a terminal status.
    #[error("aircraft no longer active: {0}")]
    Inactive(AircraftId),
    /// Only MEDICAL, SECURITY, FIRE and WEATHER may be declared externally.
    #[error("emergency level {0:?} cannot be declared")]
    NotDeclarable(EmergencyLevel),
    /// Release was called on a runway that holds no occupant.
    #[error("runway not occupied: {0}")]
    RunwayNotOccupied(RunwayId),
    /// A blocked acquire was abandoned because the aircraft left the system.
    #[error("runway acquire abandoned for {0}")]
    AcquireAbandoned(AircraftId),
    /// The scheduler or one of its structures is shutting down.
    #[error("scheduler is shutting down")]
    ShuttingDown,
    /// `start` was called on a scheduler that is already running.
    #[error("scheduler already running")]
    AlreadyRunning,
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker: {0}")]
    WorkerSpawn(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

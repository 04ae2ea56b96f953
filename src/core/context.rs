//! Explicit context shared by workers, the escalation engine and the façade.

use crate::config::SchedulerConfig;
use crate::core::landing_queue::LandingQueue;
use crate::core::registry::ResourceRegistry;
use crate::core::runway_pool::RunwayPool;
use crate::core::shutdown::StopSignal;
use crate::core::sink::Reporter;
use crate::core::SchedulerError;

/// Everything a scheduler instance owns. Independent instances share nothing.
#[derive(Debug)]
pub struct SchedulerContext {
    /// Validated configuration.
    pub config: SchedulerConfig,
    /// Active aircraft and outcome counters.
    pub registry: ResourceRegistry,
    /// Main landing queue.
    pub main_queue: LandingQueue,
    /// Emergency sub-queue fed by the escalation engine.
    pub emergency_queue: LandingQueue,
    /// Shared runway pool.
    pub runways: RunwayPool,
    /// Collaborator fan-out.
    pub reporter: Reporter,
    /// Cooperative stop signal.
    pub stop: StopSignal,
}

impl SchedulerContext {
    /// Validate `config` and build the shared structures.
    pub fn new(config: SchedulerConfig, reporter: Reporter) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        let runways = RunwayPool::new(config.runway_ids(), config.runway_permits)?;
        Ok(Self {
            config,
            registry: ResourceRegistry::new(),
            main_queue: LandingQueue::new("main"),
            emergency_queue: LandingQueue::new("emergency"),
            runways,
            reporter,
            stop: StopSignal::new(),
        })
    }
}

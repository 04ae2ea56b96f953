//! Builder wiring configuration and collaborator sinks into a scheduler.

use std::sync::Arc;

use anyhow::Context;

use crate::config::SchedulerConfig;
use crate::core::{AppResult, LandingScheduler, NotificationSink, PersistenceSink, SchedulerError};
use crate::infra::sink::NullSink;

/// Assemble a [`LandingScheduler`]. Sinks default to [`NullSink`].
#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    persistence: Option<Arc<dyn PersistenceSink>>,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl SchedulerBuilder {
    /// Start from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the process environment (`ATC_*` variables, `.env` file).
    pub fn from_env() -> AppResult<Self> {
        let config = SchedulerConfig::from_env()
            .map_err(anyhow::Error::msg)
            .context("loading scheduler configuration from environment")?;
        Ok(Self::new().with_config(config))
    }

    /// Start from a JSON document.
    pub fn from_json_str(input: &str) -> AppResult<Self> {
        let config = SchedulerConfig::from_json_str(input)
            .map_err(anyhow::Error::msg)
            .context("parsing scheduler configuration")?;
        Ok(Self::new().with_config(config))
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the persistence sink.
    #[must_use]
    pub fn with_persistence(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.persistence = Some(sink);
        self
    }

    /// Set the notification sink.
    #[must_use]
    pub fn with_notifier(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(sink);
        self
    }

    /// Configuration the scheduler will be built with.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate and build a stopped scheduler.
    pub fn build(self) -> Result<LandingScheduler, SchedulerError> {
        let persistence = self.persistence.unwrap_or_else(|| Arc::new(NullSink));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(NullSink));
        LandingScheduler::new(self.config, persistence, notifier)
    }

    /// Build and start.
    pub fn start(self) -> Result<LandingScheduler, SchedulerError> {
        let scheduler = self.build()?;
        scheduler.start()?;
        Ok(scheduler)
    }
}

impl std::fmt::Debug for SchedulerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerBuilder")
            .field("config", &self.config)
            .field("persistence", &self.persistence.is_some())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

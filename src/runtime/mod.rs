//! API surface for a polling presentation layer and runtime adapters.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_notifier;

pub use api::{health, submit_landing, tower_snapshot, Health, LandingSubmission, TowerSnapshot};
#[cfg(feature = "tokio-runtime")]
pub use tokio_notifier::{AsyncNotificationSink, TokioNotifier};

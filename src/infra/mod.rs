//! Infrastructure adapters for the persistence and notification collaborators.

pub mod sink;

pub use sink::{InMemoryNotificationSink, InMemoryPersistenceSink, NullSink};
#[cfg(not(target_arch = "wasm32"))]
pub use sink::ChannelNotifier;

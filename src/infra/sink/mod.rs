//! Sink backends.

pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod channel;

pub use memory::{InMemoryNotificationSink, InMemoryPersistenceSink, NullSink};
#[cfg(not(target_arch = "wasm32"))]
pub use channel::ChannelNotifier;

//! Shared utilities: identifiers, clock helpers and tracing setup.

pub mod clock;
pub mod ids;
pub mod telemetry;

pub use clock::*;
pub use ids::*;
pub use telemetry::*;

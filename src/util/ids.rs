//! Identifier newtypes and the priority scale shared across the scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Landing priority. Lower values are more urgent.
pub type Priority = u32;

/// Stable unique aircraft identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AircraftId(String);

impl AircraftId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random (v4 UUID) identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AircraftId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AircraftId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Stable runway identifier (e.g. `RW01`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunwayId(String);

impl RunwayId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunwayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunwayId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RunwayId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

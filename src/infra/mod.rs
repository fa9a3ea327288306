//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod prefs_store;
pub mod remote;
pub mod telemetry;

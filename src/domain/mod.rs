//! Domain layer types and invariants.

pub mod error;
pub mod preferences;
pub mod validation;
pub mod view;

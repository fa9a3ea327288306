//! Application services layer.

pub mod error;
pub mod mutations;
pub mod notifications;
pub mod posts;
pub mod preferences;
pub mod repos;

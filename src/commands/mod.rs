//! Subcommand handlers for the postdeck binary.

pub mod posts;
pub mod prefs;
pub mod print;
pub mod users;

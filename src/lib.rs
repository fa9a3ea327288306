//! postdeck: a cached client for a JSON posts/users API.
//!
//! Reads go through a stale-while-revalidate [`cache::ResourceCache`];
//! confirmed mutations patch it through [`cache::effects`]; the
//! [`application::posts::PostsService`] facade adds validation, filtering,
//! persisted preferences and user-facing notifications.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

#[cfg(test)]
pub(crate) mod test_support;

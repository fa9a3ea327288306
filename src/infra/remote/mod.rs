//! HTTP adapter for the posts/users REST resource.

mod client;

pub use client::HttpResourceApi;

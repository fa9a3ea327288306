//! Client-side resource cache.
//!
//! A process-wide, keyed store for remote resources (the posts list, single
//! posts, the users list, single users) with stale-while-revalidate reads:
//!
//! - a **fresh** entry is served as-is;
//! - a **stale** entry is served immediately while a background refetch runs;
//! - an **absent** entry blocks the reader until the fetch resolves.
//!
//! Concurrent reads of the same key share one underlying request; the
//! resource key is the deduplication token.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! posts_stale_ms = 300000
//! users_stale_ms = 600000
//! gc_ms = 600000
//! entry_limit = 500
//! ```

pub(crate) mod config;
pub mod effects;
mod entry;
mod keys;
pub(crate) mod lock;
mod store;

pub use config::CacheConfig;
pub use effects::{CacheDelta, MutationEffect};
pub use entry::{CacheEntry, CachedValue, Freshness};
pub use keys::ResourceKey;
pub use store::ResourceCache;

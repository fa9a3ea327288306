//! Cache configuration.
//!
//! Staleness windows and capacity for the resource cache. Binaries build it
//! from the validated `[cache]` settings; the defaults here are shared with
//! the configuration layer.

use std::num::NonZeroUsize;
use std::time::Duration;

use super::keys::ResourceKey;

pub(crate) const DEFAULT_POSTS_STALE_MS: u64 = 5 * 60 * 1000;
pub(crate) const DEFAULT_USERS_STALE_MS: u64 = 10 * 60 * 1000;
pub(crate) const DEFAULT_GC_MS: u64 = 10 * 60 * 1000;
pub(crate) const DEFAULT_ENTRY_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Staleness window for `posts` and `post:{id}`.
    pub posts_stale_ms: u64,
    /// Staleness window for `users` and `user:{id}`.
    pub users_stale_ms: u64,
    /// Stale entries unread for this long are dropped by a sweep.
    pub gc_ms: u64,
    /// Maximum number of entries before least-recently-used eviction.
    pub entry_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            posts_stale_ms: DEFAULT_POSTS_STALE_MS,
            users_stale_ms: DEFAULT_USERS_STALE_MS,
            gc_ms: DEFAULT_GC_MS,
            entry_limit: DEFAULT_ENTRY_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            posts_stale_ms: duration_ms(settings.posts_stale_after),
            users_stale_ms: duration_ms(settings.users_stale_after),
            gc_ms: duration_ms(settings.gc_after),
            entry_limit: settings.entry_limit.get(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl CacheConfig {
    /// Staleness threshold applied to entries stored under `key`.
    pub fn stale_after(&self, key: &ResourceKey) -> Duration {
        match key {
            ResourceKey::Posts | ResourceKey::Post(_) => Duration::from_millis(self.posts_stale_ms),
            ResourceKey::Users | ResourceKey::User(_) => Duration::from_millis(self.users_stale_ms),
        }
    }

    pub fn gc_after(&self) -> Duration {
        Duration::from_millis(self.gc_ms)
    }

    /// Returns the entry limit as `NonZeroUsize`, clamping to 1 if zero.
    pub fn entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.entry_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

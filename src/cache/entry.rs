use std::sync::Arc;
use std::time::Duration;

use postdeck_api_types::{Post, User};
use tokio::time::Instant;

/// A cached resource payload.
///
/// Collections are reference-counted so handing them to many readers is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    Posts(Arc<Vec<Post>>),
    Post(Post),
    Users(Arc<Vec<User>>),
    User(User),
}

impl CachedValue {
    pub fn posts(posts: Vec<Post>) -> Self {
        Self::Posts(Arc::new(posts))
    }

    pub fn users(users: Vec<User>) -> Self {
        Self::Users(Arc::new(users))
    }

    pub fn into_posts(self) -> Option<Arc<Vec<Post>>> {
        match self {
            Self::Posts(posts) => Some(posts),
            _ => None,
        }
    }

    pub fn into_post(self) -> Option<Post> {
        match self {
            Self::Post(post) => Some(post),
            _ => None,
        }
    }

    pub fn into_users(self) -> Option<Arc<Vec<User>>> {
        match self {
            Self::Users(users) => Some(users),
            _ => None,
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub fetched_at: Instant,
    pub stale_after: Duration,
    /// Set by an explicit invalidation; cleared by the next store.
    pub invalidated: bool,
    pub last_read: Instant,
}

impl CacheEntry {
    pub fn new(value: CachedValue, stale_after: Duration, now: Instant) -> Self {
        Self {
            value,
            fetched_at: now,
            stale_after,
            invalidated: false,
            last_read: now,
        }
    }

    pub fn freshness(&self, now: Instant) -> Freshness {
        if !self.invalidated && now.duration_since(self.fetched_at) < self.stale_after {
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }

    /// Stale and unread for at least `gc_after`.
    pub fn is_collectable(&self, now: Instant, gc_after: Duration) -> bool {
        self.freshness(now) == Freshness::Stale && now.duration_since(self.last_read) >= gc_after
    }
}

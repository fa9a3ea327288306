//! Resource cache storage.
//!
//! Entries live in an LRU map guarded by a `std` lock that is never held
//! across an `.await`. Fetches in flight are tracked per key as shared
//! futures so concurrent readers join a single request.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use metrics::counter;
use postdeck_api_types::{Post, User};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::application::repos::ResourceApi;
use crate::domain::error::ResourceError;

use super::config::CacheConfig;
use super::effects::{self, CacheDelta};
use super::entry::{CacheEntry, CachedValue, Freshness};
use super::keys::ResourceKey;
use super::lock;

const METRIC_HIT: &str = "postdeck_cache_hit_total";
const METRIC_STALE_HIT: &str = "postdeck_cache_stale_hit_total";
const METRIC_MISS: &str = "postdeck_cache_miss_total";
const METRIC_COALESCED: &str = "postdeck_cache_coalesced_total";
const METRIC_FETCH_ERROR: &str = "postdeck_cache_fetch_error_total";
const METRIC_EVICT: &str = "postdeck_cache_evict_total";

type FetchResult = Result<CachedValue, ResourceError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

struct State {
    entries: LruCache<ResourceKey, CacheEntry>,
}

impl State {
    fn store(&mut self, key: &ResourceKey, mut entry: CacheEntry) {
        if let Some(previous) = self.entries.peek(key) {
            entry.last_read = previous.last_read;
        }
        if let Some((evicted, _)) = self.entries.push(key.clone(), entry)
            && evicted != *key
        {
            counter!(METRIC_EVICT).increment(1);
            debug!(key = %evicted, "Evicted least recently used cache entry");
        }
    }
}

struct Inner {
    config: CacheConfig,
    api: Arc<dyn ResourceApi>,
    state: RwLock<State>,
    in_flight: Mutex<HashMap<ResourceKey, InFlight>>,
    next_fetch_id: AtomicU64,
}

impl Inner {
    fn lookup(&self, key: &ResourceKey, now: Instant) -> Option<(CachedValue, Freshness)> {
        let mut state = lock::write(&self.state, "lookup");
        let entry = state.entries.get_mut(key)?;
        entry.last_read = now;
        Some((entry.value.clone(), entry.freshness(now)))
    }

    /// Store a fetch result if the fetch still owns the key's in-flight slot.
    ///
    /// Lock order is `in_flight` then `state`, shared with every local write,
    /// so a write either detaches the slot first or lands after this store.
    fn complete_fetch(&self, key: &ResourceKey, fetch_id: u64, result: &FetchResult) {
        if let Err(err) = result {
            counter!(METRIC_FETCH_ERROR).increment(1);
            warn!(key = %key, error = %err, error_kind = err.kind(), "Resource fetch failed");
        }

        let mut in_flight = lock::lock(&self.in_flight, "complete_fetch");
        if !in_flight.get(key).is_some_and(|f| f.id == fetch_id) {
            debug!(key = %key, fetch_id, "Discarded fetch result superseded by a local write");
            return;
        }
        in_flight.remove(key);

        if let Ok(value) = result {
            let entry = CacheEntry::new(value.clone(), self.config.stale_after(key), Instant::now());
            lock::write(&self.state, "complete_fetch").store(key, entry);
            debug!(key = %key, "Cache entry refreshed from remote");
        }
    }

    /// Forget the fetch in flight for `key`; its readers still get the result.
    fn detach(in_flight: &mut HashMap<ResourceKey, InFlight>, key: &ResourceKey) {
        if let Some(fetch) = in_flight.remove(key) {
            debug!(key = %key, fetch_id = fetch.id, "Detached fetch superseded by a local write");
        }
    }
}

/// Cloneable handle to the process-wide resource cache.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("config", &self.inner.config)
            .field("entries", &self.len())
            .field("in_flight", &self.in_flight_count())
            .finish_non_exhaustive()
    }
}

impl ResourceCache {
    pub fn new(config: CacheConfig, api: Arc<dyn ResourceApi>) -> Self {
        let entries = LruCache::new(config.entry_limit_non_zero());
        Self {
            inner: Arc::new(Inner {
                config,
                api,
                state: RwLock::new(State { entries }),
                in_flight: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Return the cached value for `key`, fetching it if absent.
    ///
    /// A stale value is returned immediately and a background refetch is
    /// started (or joined). Fails only when nothing is cached and the fetch
    /// fails.
    pub async fn read(&self, key: &ResourceKey) -> FetchResult {
        if let Some((value, freshness)) = self.inner.lookup(key, Instant::now()) {
            match freshness {
                Freshness::Fresh => counter!(METRIC_HIT).increment(1),
                Freshness::Stale => {
                    counter!(METRIC_STALE_HIT).increment(1);
                    debug!(key = %key, "Serving stale entry while revalidating");
                    drop(self.fetch_handle(key));
                }
            }
            return Ok(value);
        }

        counter!(METRIC_MISS).increment(1);
        self.fetch_handle(key).await
    }

    pub async fn posts(&self) -> Result<Arc<Vec<Post>>, ResourceError> {
        let key = ResourceKey::Posts;
        self.read(&key)
            .await?
            .into_posts()
            .ok_or_else(|| mismatch(&key))
    }

    pub async fn post(&self, id: u64) -> Result<Post, ResourceError> {
        let key = ResourceKey::Post(id);
        self.read(&key).await?.into_post().ok_or_else(|| mismatch(&key))
    }

    pub async fn users(&self) -> Result<Arc<Vec<User>>, ResourceError> {
        let key = ResourceKey::Users;
        self.read(&key)
            .await?
            .into_users()
            .ok_or_else(|| mismatch(&key))
    }

    pub async fn user(&self, id: u64) -> Result<User, ResourceError> {
        let key = ResourceKey::User(id);
        self.read(&key).await?.into_user().ok_or_else(|| mismatch(&key))
    }

    /// Replace the value for `key` without contacting the remote resource.
    ///
    /// A fetch already in flight for `key` is detached, so its result no
    /// longer lands in the cache and the next stale read starts a new one.
    pub fn write(&self, key: ResourceKey, value: CachedValue) {
        let entry = CacheEntry::new(value, self.inner.config.stale_after(&key), Instant::now());
        let mut in_flight = lock::lock(&self.inner.in_flight, "write");
        Inner::detach(&mut in_flight, &key);
        lock::write(&self.inner.state, "write").store(&key, entry);
    }

    /// Mark the entry stale so the next read refetches. Returns `false` if absent.
    pub fn invalidate(&self, key: &ResourceKey) -> bool {
        let mut state = lock::write(&self.inner.state, "invalidate");
        match state.entries.peek_mut(key) {
            Some(entry) => {
                entry.invalidated = true;
                debug!(key = %key, "Cache entry invalidated");
                true
            }
            None => false,
        }
    }

    /// Evict the entry. A fetch already in flight still resolves for its
    /// readers but no longer lands in the cache.
    pub fn remove(&self, key: &ResourceKey) -> bool {
        let removed = {
            let mut in_flight = lock::lock(&self.inner.in_flight, "remove");
            Inner::detach(&mut in_flight, key);
            lock::write(&self.inner.state, "remove")
                .entries
                .pop(key)
                .is_some()
        };
        if removed {
            debug!(key = %key, "Cache entry removed");
        }
        removed
    }

    pub fn apply(&self, deltas: impl IntoIterator<Item = CacheDelta>) {
        for delta in deltas {
            match delta {
                CacheDelta::WritePost(post) => {
                    self.write(ResourceKey::Post(post.id), CachedValue::Post(post));
                }
                CacheDelta::Invalidate(key) => {
                    self.invalidate(&key);
                }
                CacheDelta::Remove(key) => {
                    self.remove(&key);
                }
                list_delta => self.patch_posts_list(&list_delta),
            }
        }
    }

    fn patch_posts_list(&self, delta: &CacheDelta) {
        let key = ResourceKey::Posts;
        let mut in_flight = lock::lock(&self.inner.in_flight, "patch_posts_list");
        let mut state = lock::write(&self.inner.state, "patch_posts_list");
        let cached = state.entries.peek(&key).and_then(|entry| match &entry.value {
            CachedValue::Posts(posts) => Some(posts.as_ref().clone()),
            _ => None,
        });
        let mut list = match cached {
            Some(list) => list,
            None if matches!(delta, CacheDelta::PrependToList(_)) => Vec::new(),
            None => return,
        };
        if !effects::patch_list(&mut list, delta) {
            return;
        }
        Inner::detach(&mut in_flight, &key);
        let entry = CacheEntry::new(
            CachedValue::posts(list),
            self.inner.config.stale_after(&key),
            Instant::now(),
        );
        state.store(&key, entry);
    }

    /// Drop stale entries that nobody has read for the configured GC window.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let gc_after = self.inner.config.gc_after();
        let mut state = lock::write(&self.inner.state, "sweep");
        let doomed: Vec<ResourceKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_collectable(now, gc_after))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            state.entries.pop(key);
        }
        if !doomed.is_empty() {
            debug!(count = doomed.len(), "Swept stale cache entries");
        }
        doomed.len()
    }

    /// Run [`Self::sweep`] every `period` until the handle is aborted.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.sweep();
            }
        })
    }

    /// Current value without touching recency or triggering a fetch.
    pub fn peek(&self, key: &ResourceKey) -> Option<CachedValue> {
        lock::read(&self.inner.state, "peek")
            .entries
            .peek(key)
            .map(|entry| entry.value.clone())
    }

    pub fn freshness(&self, key: &ResourceKey) -> Option<Freshness> {
        let now = Instant::now();
        lock::read(&self.inner.state, "freshness")
            .entries
            .peek(key)
            .map(|entry| entry.freshness(now))
    }

    pub fn len(&self) -> usize {
        lock::read(&self.inner.state, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight_count(&self) -> usize {
        lock::lock(&self.inner.in_flight, "in_flight_count").len()
    }

    /// Join the fetch in flight for `key`, or start one.
    ///
    /// New fetches are spawned onto the runtime so they complete (and update
    /// the cache) even if every reader goes away.
    fn fetch_handle(&self, key: &ResourceKey) -> SharedFetch {
        let mut in_flight = lock::lock(&self.inner.in_flight, "fetch_handle");
        if let Some(existing) = in_flight.get(key) {
            counter!(METRIC_COALESCED).increment(1);
            debug!(key = %key, "Joined in-flight fetch");
            return existing.fetch.clone();
        }

        let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let owned_key = key.clone();
        let fetch = async move {
            let result = fetch_resource(inner.api.as_ref(), &owned_key).await;
            inner.complete_fetch(&owned_key, id, &result);
            result
        }
        .boxed()
        .shared();

        in_flight.insert(
            key.clone(),
            InFlight {
                id,
                fetch: fetch.clone(),
            },
        );
        drop(in_flight);

        debug!(key = %key, fetch_id = id, "Started resource fetch");
        tokio::spawn(fetch.clone());
        fetch
    }
}

async fn fetch_resource(api: &dyn ResourceApi, key: &ResourceKey) -> FetchResult {
    match key {
        ResourceKey::Posts => api.list_posts().await.map(CachedValue::posts),
        ResourceKey::Post(id) => api.get_post(*id).await.map(CachedValue::Post),
        ResourceKey::Users => api.list_users().await.map(CachedValue::users),
        ResourceKey::User(id) => api.get_user(*id).await.map(CachedValue::User),
    }
}

fn mismatch(key: &ResourceKey) -> ResourceError {
    ResourceError::unknown(format!("cache entry `{key}` holds an unexpected value"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::effects::{MutationEffect, plan};
    use crate::test_support::{FakeApi, post, settle};

    fn cache_with(api: &Arc<FakeApi>, config: CacheConfig) -> ResourceCache {
        ResourceCache::new(config, api.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn absent_read_fetches_once_then_hits() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());

        let first = cache.posts().await.expect("posts");
        let second = cache.posts().await.expect("posts");

        assert_eq!(first, second);
        assert_eq!(api.calls("list_posts"), 1);
        assert_eq!(cache.freshness(&ResourceKey::Posts), Some(Freshness::Fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_reads_share_one_request() {
        let api = Arc::new(FakeApi::seeded().with_delay(Duration::from_millis(50)));
        let cache = cache_with(&api, CacheConfig::default());

        let (a, b) = tokio::join!(cache.posts(), cache.posts());

        assert_eq!(a.expect("first"), b.expect("second"));
        assert_eq!(api.calls("list_posts"), 1);
        assert_eq!(cache.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_are_fetched_independently() {
        let api = Arc::new(FakeApi::seeded().with_delay(Duration::from_millis(5)));
        let cache = cache_with(&api, CacheConfig::default());

        let (list, single) = tokio::join!(cache.posts(), cache.post(1));

        assert!(list.is_ok());
        assert_eq!(single.expect("post").id, 1);
        assert_eq!(api.calls("list_posts"), 1);
        assert_eq!(api.calls("get_post"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_is_served_while_revalidating() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());

        let original = cache.posts().await.expect("posts");
        api.insert_remote(post(50, "added remotely", 2));
        tokio::time::advance(Duration::from_secs(5 * 60)).await;

        let served = cache.posts().await.expect("stale posts");
        assert_eq!(served, original);

        settle().await;
        assert_eq!(api.calls("list_posts"), 2);
        let refreshed = cache.posts().await.expect("fresh posts");
        assert!(refreshed.iter().any(|p| p.id == 50));
        assert_eq!(api.calls("list_posts"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_without_cached_value_surfaces_error() {
        let api = Arc::new(FakeApi::seeded());
        api.fail("list_posts", ResourceError::ServerUnavailable);
        let cache = cache_with(&api, CacheConfig::default());

        let err = cache.posts().await.expect_err("fetch should fail");
        assert_eq!(err, ResourceError::ServerUnavailable);
        assert!(cache.is_empty());
        assert_eq!(cache.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_revalidation_keeps_stale_value() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());
        let original = cache.posts().await.expect("posts");

        api.fail("list_posts", ResourceError::Timeout);
        assert!(cache.invalidate(&ResourceKey::Posts));

        let served = cache.posts().await.expect("stale value still served");
        settle().await;
        assert_eq!(served, original);
        assert_eq!(cache.freshness(&ResourceKey::Posts), Some(Freshness::Stale));
    }

    #[tokio::test(start_paused = true)]
    async fn write_is_visible_without_network() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());

        cache.write(ResourceKey::Post(7), CachedValue::Post(post(7, "local", 1)));
        let read = cache.post(7).await.expect("post");

        assert_eq!(read.title, "local");
        assert_eq!(api.calls("get_post"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn write_supersedes_fetch_already_in_flight() {
        let api = Arc::new(FakeApi::seeded().with_delay(Duration::from_millis(100)));
        let cache = cache_with(&api, CacheConfig::default());

        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.post(1).await })
        };
        settle().await;
        assert_eq!(cache.in_flight_count(), 1);

        cache.write(ResourceKey::Post(1), CachedValue::Post(post(1, "written", 1)));
        let fetched = reader.await.expect("join").expect("post");

        assert_ne!(fetched.title, "written");
        assert_eq!(cache.post(1).await.expect("post").title, "written");
    }

    #[tokio::test(start_paused = true)]
    async fn update_during_fetch_lets_next_read_refetch() {
        let api = Arc::new(FakeApi::seeded().with_delay(Duration::from_millis(100)));
        let cache = cache_with(&api, CacheConfig::default());

        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.post(1).await })
        };
        settle().await;
        assert_eq!(cache.in_flight_count(), 1);

        cache.apply(plan(MutationEffect::Updated(post(1, "edited", 1))));
        assert_eq!(cache.in_flight_count(), 0);

        let served = cache.post(1).await.expect("stale post");
        assert_eq!(served.title, "edited");
        assert_eq!(cache.in_flight_count(), 1);

        reader.await.expect("join").expect("first fetch");
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(api.calls("get_post"), 2);
        assert_eq!(cache.in_flight_count(), 0);
        assert_eq!(cache.freshness(&ResourceKey::Post(1)), Some(Freshness::Fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn churned_keys_leave_no_bookkeeping_behind() {
        let api = Arc::new(FakeApi::seeded());
        let config = CacheConfig {
            entry_limit: 2,
            ..Default::default()
        };
        let cache = cache_with(&api, config);

        for id in 0..1_000 {
            cache.write(ResourceKey::Post(id), CachedValue::Post(post(id, "churn", 1)));
            cache.remove(&ResourceKey::Post(id));
        }
        for id in 0..1_000 {
            cache.write(ResourceKey::Post(id), CachedValue::Post(post(id, "churn", 1)));
        }

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.in_flight_count(), 0);
        assert_eq!(lock::read(&cache.inner.state, "test").entries.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_forces_refetch() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());

        cache.users().await.expect("users");
        assert!(cache.remove(&ResourceKey::Users));
        assert!(!cache.remove(&ResourceKey::Users));
        cache.users().await.expect("users");

        assert_eq!(api.calls("list_users"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_of_absent_key_is_noop() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());
        assert!(!cache.invalidate(&ResourceKey::Post(3)));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn created_effect_prepends_and_marks_list_stale() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());
        cache.posts().await.expect("posts");

        cache.apply(plan(MutationEffect::Created(post(101, "Hello World", 1))));

        let list = cache
            .peek(&ResourceKey::Posts)
            .and_then(CachedValue::into_posts)
            .expect("list");
        assert_eq!(list.first().map(|p| p.id), Some(101));
        assert_eq!(cache.freshness(&ResourceKey::Posts), Some(Freshness::Stale));
    }

    #[tokio::test(start_paused = true)]
    async fn created_effect_without_cached_list_starts_one() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());

        cache.apply(plan(MutationEffect::Created(post(101, "Hello World", 1))));

        let list = cache
            .peek(&ResourceKey::Posts)
            .and_then(CachedValue::into_posts)
            .expect("list");
        assert_eq!(list.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn updated_effect_without_cached_list_only_writes_single_entry() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());

        cache.apply(plan(MutationEffect::Updated(post(2, "edited", 1))));

        assert!(cache.peek(&ResourceKey::Posts).is_none());
        assert_eq!(
            cache.peek(&ResourceKey::Post(2)),
            Some(CachedValue::Post(post(2, "edited", 1)))
        );
        assert_eq!(cache.freshness(&ResourceKey::Post(2)), Some(Freshness::Stale));
    }

    #[tokio::test(start_paused = true)]
    async fn deleted_effect_evicts_single_entry() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());
        cache.posts().await.expect("posts");
        cache.post(1).await.expect("post");

        cache.apply(plan(MutationEffect::Deleted(1)));

        assert!(cache.peek(&ResourceKey::Post(1)).is_none());
        let list = cache
            .peek(&ResourceKey::Posts)
            .and_then(CachedValue::into_posts)
            .expect("list");
        assert!(list.iter().all(|p| p.id != 1));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_only_stale_unread_entries() {
        let api = Arc::new(FakeApi::seeded());
        let config = CacheConfig {
            posts_stale_ms: 1_000,
            users_stale_ms: 60_000,
            gc_ms: 2_000,
            ..Default::default()
        };
        let cache = cache_with(&api, config);
        cache.posts().await.expect("posts");
        cache.users().await.expect("users");

        tokio::time::advance(Duration::from_millis(1_500)).await;
        assert_eq!(cache.sweep(), 0);

        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert_eq!(cache.sweep(), 1);
        assert!(cache.peek(&ResourceKey::Posts).is_none());
        assert!(cache.peek(&ResourceKey::Users).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_task_runs_periodically() {
        let api = Arc::new(FakeApi::seeded());
        let config = CacheConfig {
            posts_stale_ms: 10,
            gc_ms: 10,
            ..Default::default()
        };
        let cache = cache_with(&api, config);
        cache.posts().await.expect("posts");

        let handle = cache.spawn_sweeper(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(250)).await;
        handle.abort();

        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lru_evicts_least_recently_used_entry() {
        let api = Arc::new(FakeApi::seeded());
        let config = CacheConfig {
            entry_limit: 2,
            ..Default::default()
        };
        let cache = cache_with(&api, config);

        cache.post(1).await.expect("post 1");
        cache.post(2).await.expect("post 2");
        cache.post(1).await.expect("post 1 again");
        cache.post(3).await.expect("post 3");

        assert!(cache.peek(&ResourceKey::Post(1)).is_some());
        assert!(cache.peek(&ResourceKey::Post(2)).is_none());
        assert!(cache.peek(&ResourceKey::Post(3)).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cache_recovers_from_poisoned_lock() {
        let api = Arc::new(FakeApi::seeded());
        let cache = cache_with(&api, CacheConfig::default());

        let poisoner = cache.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.state.write().expect("state lock");
            panic!("poison cache state");
        })
        .join();

        cache.write(ResourceKey::Post(1), CachedValue::Post(post(1, "ok", 1)));
        assert_eq!(cache.len(), 1);
    }
}

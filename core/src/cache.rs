//! Keyed query cache with freshness and invalidation rules.
//!
//! # Design
//! Entries are keyed by `(resource, scope, page-or-id)` and stored in a
//! `moka` cache. Freshness and eviction are both judged against an
//! injectable [`Clock`]: an entry older than the stale time, or one that has
//! been invalidated, is no longer served as fresh and the owner refetches it.
//! An entry nobody has read for the gc time is evicted on its next lookup;
//! moka's time-to-idle reclaims the ones that are never looked up again.
//!
//! Invalidation only flips a flag on the matching entries. Cached data is
//! never edited in place, and invalidating keys that are not cached is a
//! no-op.
//!
//! Every invalidation also bumps a generation counter. A fetch records the
//! generation before it starts and stores its result through
//! [`QueryCache::insert_fetched`], which keeps the result marked stale if an
//! invalidation ran in between. A read that raced a mutation therefore never
//! resurrects pre-mutation data as fresh.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;
use parking_lot::Mutex;

use crate::types::ItemId;

/// Resource name used in every key this crate produces.
pub const ITEMS: &str = "items";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    List,
    Detail,
}

/// Identifies one cached query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: &'static str,
    pub scope: Scope,
    /// Page number for lists, item id for details.
    pub param: i64,
}

impl QueryKey {
    pub fn list(page: u32) -> Self {
        Self {
            resource: ITEMS,
            scope: Scope::List,
            param: i64::from(page),
        }
    }

    pub fn detail(id: ItemId) -> Self {
        Self {
            resource: ITEMS,
            scope: Scope::Detail,
            param: id,
        }
    }

    pub fn matches(&self, filter: &KeyFilter) -> bool {
        self.resource == filter.resource
            && filter.scope.is_none_or(|scope| scope == self.scope)
            && filter.param.is_none_or(|param| param == self.param)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.scope {
            Scope::List => "list",
            Scope::Detail => "detail",
        };
        write!(f, "[{}, {scope}, {}]", self.resource, self.param)
    }
}

/// Prefix of a [`QueryKey`]; `None` components match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFilter {
    pub resource: &'static str,
    pub scope: Option<Scope>,
    pub param: Option<i64>,
}

impl KeyFilter {
    /// Every list page of the items resource.
    pub fn lists() -> Self {
        Self {
            resource: ITEMS,
            scope: Some(Scope::List),
            param: None,
        }
    }

    pub fn detail(id: ItemId) -> Self {
        Self {
            resource: ITEMS,
            scope: Some(Scope::Detail),
            param: Some(id),
        }
    }
}

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}

#[derive(Debug)]
struct Entry<V> {
    data: V,
    fetched_at: Instant,
    last_access: Mutex<Instant>,
    invalidated: AtomicBool,
}

/// Snapshot of a cached value together with its freshness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached<V> {
    pub data: V,
    pub stale: bool,
}

pub struct QueryCache<V> {
    store: Cache<QueryKey, Arc<Entry<V>>>,
    stale_time: Duration,
    gc_time: Duration,
    clock: Arc<dyn Clock>,
    generation: AtomicU64,
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(stale_time: Duration, gc_time: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Cache::builder().time_to_idle(gc_time).build(),
            stale_time,
            gc_time,
            clock,
            generation: AtomicU64::new(0),
        }
    }

    /// The cached value and whether it is due for a refetch. Counts as a use
    /// of the entry; one idle for the gc time is evicted instead.
    pub fn get(&self, key: &QueryKey) -> Option<Cached<V>> {
        let entry = self.store.get(key)?;
        let now = self.clock.now();
        {
            let mut last_access = entry.last_access.lock();
            if now.saturating_duration_since(*last_access) >= self.gc_time {
                drop(last_access);
                self.store.invalidate(key);
                return None;
            }
            *last_access = now;
        }
        let stale = self.is_stale(&entry);
        Some(Cached {
            data: entry.data.clone(),
            stale,
        })
    }

    /// The cached value, only if it can be served without a refetch.
    pub fn fresh(&self, key: &QueryKey) -> Option<V> {
        self.get(key).filter(|cached| !cached.stale).map(|cached| cached.data)
    }

    /// Store a value known to be current, replacing any previous entry.
    #[cfg(test)]
    fn insert(&self, key: QueryKey, data: V) {
        self.store.insert(key, Arc::new(self.entry(data)));
    }

    /// Bumped by every [`invalidate`](Self::invalidate) call.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store the result of a fetch that started at generation `started`.
    /// If any invalidation ran since then the entry is stored already stale.
    pub fn insert_fetched(&self, key: QueryKey, data: V, started: u64) {
        let entry = Arc::new(self.entry(data));
        self.store.insert(key, entry.clone());
        // Checked after the insert: an invalidation that bumps later also
        // walks the store and sees this entry.
        if self.generation() != started {
            entry.invalidated.store(true, Ordering::Release);
        }
    }

    /// Mark every entry matching `filter` stale. Returns how many entries
    /// were matched; zero when nothing is cached under the filter.
    pub fn invalidate(&self, filter: &KeyFilter) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut matched = 0;
        for (key, entry) in self.store.iter() {
            if key.matches(filter) {
                entry.invalidated.store(true, Ordering::Release);
                matched += 1;
            }
        }
        matched
    }

    fn entry(&self, data: V) -> Entry<V> {
        let now = self.clock.now();
        Entry {
            data,
            fetched_at: now,
            last_access: Mutex::new(now),
            invalidated: AtomicBool::new(false),
        }
    }

    fn is_stale(&self, entry: &Entry<V>) -> bool {
        entry.invalidated.load(Ordering::Acquire)
            || self.clock.now().saturating_duration_since(entry.fetched_at) >= self.stale_time
    }
}

impl<V> fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("stale_time", &self.stale_time)
            .field("gc_time", &self.gc_time)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);
    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn cache(clock: Arc<ManualClock>) -> QueryCache<String> {
        QueryCache::new(FIVE_MINUTES, DAY, clock)
    }

    #[test]
    fn fresh_until_stale_time_elapses() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(clock.clone());
        cache.insert(QueryKey::list(1), "page one".to_string());

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.fresh(&QueryKey::list(1)).as_deref(), Some("page one"));

        clock.advance(Duration::from_secs(1));
        assert!(cache.fresh(&QueryKey::list(1)).is_none());
        let cached = cache.get(&QueryKey::list(1)).unwrap();
        assert!(cached.stale);
        assert_eq!(cached.data, "page one");
    }

    #[test]
    fn invalidating_lists_leaves_details_alone() {
        let cache = cache(Arc::new(ManualClock::new()));
        cache.insert(QueryKey::list(1), "p1".into());
        cache.insert(QueryKey::list(2), "p2".into());
        cache.insert(QueryKey::detail(1), "item".into());

        assert_eq!(cache.invalidate(&KeyFilter::lists()), 2);
        assert!(cache.fresh(&QueryKey::list(1)).is_none());
        assert!(cache.fresh(&QueryKey::list(2)).is_none());
        assert_eq!(cache.fresh(&QueryKey::detail(1)).as_deref(), Some("item"));
    }

    #[test]
    fn invalidation_is_idempotent_and_keeps_data() {
        let cache = cache(Arc::new(ManualClock::new()));
        assert_eq!(cache.invalidate(&KeyFilter::lists()), 0);

        cache.insert(QueryKey::detail(9), "nine".into());
        assert_eq!(cache.invalidate(&KeyFilter::detail(9)), 1);
        assert_eq!(cache.invalidate(&KeyFilter::detail(9)), 1);
        assert_eq!(cache.invalidate(&KeyFilter::detail(10)), 0);
        assert_eq!(cache.get(&QueryKey::detail(9)).unwrap().data, "nine");
    }

    #[test]
    fn insert_clears_invalidation() {
        let cache = cache(Arc::new(ManualClock::new()));
        cache.insert(QueryKey::list(1), "old".into());
        cache.invalidate(&KeyFilter::lists());
        cache.insert(QueryKey::list(1), "new".into());
        assert_eq!(cache.fresh(&QueryKey::list(1)).as_deref(), Some("new"));
    }

    #[test]
    fn fetch_that_raced_an_invalidation_is_stored_stale() {
        let cache = cache(Arc::new(ManualClock::new()));
        cache.insert(QueryKey::list(1), "before".into());

        let started = cache.generation();
        // A mutation lands while the refetch is in flight.
        cache.invalidate(&KeyFilter::lists());
        cache.insert_fetched(QueryKey::list(1), "still before".into(), started);

        let cached = cache.get(&QueryKey::list(1)).unwrap();
        assert!(cached.stale);
        assert_eq!(cached.data, "still before");

        let started = cache.generation();
        cache.insert_fetched(QueryKey::list(1), "after".into(), started);
        assert_eq!(cache.fresh(&QueryKey::list(1)).as_deref(), Some("after"));
    }

    #[test]
    fn idle_entries_are_evicted_after_gc_time() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(clock.clone());
        cache.insert(QueryKey::list(1), "kept".into());
        cache.insert(QueryKey::detail(2), "idle".into());

        // Reading resets the idle timer, stale or not.
        clock.advance(DAY - Duration::from_secs(1));
        assert!(cache.get(&QueryKey::list(1)).unwrap().stale);

        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&QueryKey::detail(2)).is_none());
        assert!(cache.get(&QueryKey::detail(2)).is_none());
        assert_eq!(cache.get(&QueryKey::list(1)).unwrap().data, "kept");

        clock.advance(DAY);
        assert!(cache.get(&QueryKey::list(1)).is_none());
    }

    #[test]
    fn store_is_built_with_gc_time_as_idle_timeout() {
        let cache = cache(Arc::new(ManualClock::new()));
        assert_eq!(cache.store.policy().time_to_idle(), Some(DAY));
    }

    #[test]
    fn key_filter_matching() {
        assert!(QueryKey::list(3).matches(&KeyFilter::lists()));
        assert!(!QueryKey::detail(3).matches(&KeyFilter::lists()));
        assert!(QueryKey::detail(3).matches(&KeyFilter::detail(3)));
        assert!(!QueryKey::detail(4).matches(&KeyFilter::detail(3)));
        assert_eq!(QueryKey::list(2).to_string(), "[items, list, 2]");
    }
}

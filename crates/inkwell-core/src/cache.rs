//! Short-lived memoization of resolved global feed pages.
//!
//! Entries expire after their TTL and are otherwise only removed by an explicit
//! [`FeedCache::invalidate`] or [`FeedCache::clear`], or by LRU eviction once
//! the cache is full. Writes to the store do not touch the cache, so a new post
//! becomes visible on the global feed no later than one TTL after it was
//! created.

use std::{
  num::NonZeroUsize,
  sync::{Arc, RwLock, RwLockWriteGuard},
  time::Duration,
};

use lru::LruCache;
use tokio::time::Instant;
use tracing::warn;

use crate::{feed::FeedPage, paginate::PageNumber};

/// Entries kept by [`TtlCache::new`] before the least recently used is evicted.
pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
  Some(n) => n,
  None => unreachable!(),
};

/// Cacheable views. Only the global feed is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
  GlobalFeed { page: PageNumber },
}

/// A store of resolved feed pages shared by all request handlers.
///
/// Values are immutable once stored; every reader within the TTL window gets
/// the same `Arc`.
pub trait FeedCache: Send + Sync {
  fn get(&self, key: &CacheKey) -> Option<Arc<FeedPage>>;

  fn set(&self, key: CacheKey, value: Arc<FeedPage>, ttl: Duration);

  fn invalidate(&self, key: &CacheKey);

  /// Drop every entry.
  fn clear(&self);
}

// ─── TtlCache ────────────────────────────────────────────────────────────────

struct Entry {
  value:      Arc<FeedPage>,
  expires_at: Instant,
}

/// In-process LRU cache with per-entry expiry on tokio's monotonic clock.
///
/// Holds at most `capacity` entries. Expired entries are dropped when read and
/// swept whenever a new entry is stored.
pub struct TtlCache {
  entries: RwLock<LruCache<CacheKey, Entry>>,
}

impl Default for TtlCache {
  fn default() -> Self { Self::with_capacity(DEFAULT_CACHE_CAPACITY) }
}

impl TtlCache {
  pub fn new() -> Self { Self::default() }

  pub fn with_capacity(capacity: NonZeroUsize) -> Self {
    Self { entries: RwLock::new(LruCache::new(capacity)) }
  }

  /// Number of stored entries, expired ones included until they are swept.
  pub fn len(&self) -> usize { self.lock("len").len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn lock(&self, op: &'static str) -> RwLockWriteGuard<'_, LruCache<CacheKey, Entry>> {
    self.entries.write().unwrap_or_else(|poisoned| {
      warn!(op, "recovered from poisoned feed cache lock");
      poisoned.into_inner()
    })
  }
}

impl FeedCache for TtlCache {
  fn get(&self, key: &CacheKey) -> Option<Arc<FeedPage>> {
    let now = Instant::now();
    let mut entries = self.lock("get");
    let found = entries
      .get(key)
      .map(|entry| (entry.expires_at > now, entry.value.clone()));
    match found {
      Some((true, value)) => Some(value),
      Some((false, _)) => {
        entries.pop(key);
        None
      }
      None => None,
    }
  }

  fn set(&self, key: CacheKey, value: Arc<FeedPage>, ttl: Duration) {
    let now = Instant::now();
    let mut entries = self.lock("set");

    let expired: Vec<CacheKey> = entries
      .iter()
      .filter(|(_, entry)| entry.expires_at <= now)
      .map(|(key, _)| *key)
      .collect();
    for stale in &expired {
      entries.pop(stale);
    }

    entries.put(key, Entry { value, expires_at: now + ttl });
  }

  fn invalidate(&self, key: &CacheKey) { self.lock("invalidate").pop(key); }

  fn clear(&self) { self.lock("clear").clear(); }
}

// ─── NoCache ─────────────────────────────────────────────────────────────────

/// A cache that never holds anything; every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl FeedCache for NoCache {
  fn get(&self, _: &CacheKey) -> Option<Arc<FeedPage>> { None }

  fn set(&self, _: CacheKey, _: Arc<FeedPage>, _: Duration) {}

  fn invalidate(&self, _: &CacheKey) {}

  fn clear(&self) {}
}

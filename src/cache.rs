//! Time-bounded read-through cache for hot listing queries.
//!
//! The backing store stays the source of truth: entries are disposable snapshots
//! that expire after their TTL or get dropped by an explicit invalidation. Empty
//! results and failures are never stored, so a row created after an empty read is
//! visible on the very next read.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::Clock;
use crate::outcome::Outcome;

/// Default lifetime of a cached listing.
pub const DEFAULT_TTL_SECS: i64 = 300;

/// Query shape plus discriminating id; renders to the deterministic cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    shape: &'static str,
    discriminator: String,
}

impl CacheKey {
    pub fn new(shape: &'static str, discriminator: impl fmt::Display) -> Self {
        Self {
            shape,
            discriminator: discriminator.to_string(),
        }
    }

    pub fn shape(&self) -> &'static str {
        self.shape
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.shape, self.discriminator)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<E> {
    rows: Vec<E>,
    expires_at: DateTime<Utc>,
}

struct CacheState<E> {
    entries: HashMap<String, CacheEntry<E>>,
    // Bumped by every invalidation; a load that straddles a bump is not stored.
    epoch: u64,
}

pub struct ReadThroughCache<E> {
    state: Mutex<CacheState<E>>,
    clock: Arc<dyn Clock>,
}

impl<E> fmt::Debug for ReadThroughCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl<E> ReadThroughCache<E> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                epoch: 0,
            }),
            clock,
        }
    }

    // A poisoned map only holds disposable snapshots, so recover it instead of failing reads.
    fn state(&self) -> MutexGuard<'_, CacheState<E>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut state = self.state();
        state.epoch = state.epoch.wrapping_add(1);
        let removed = state.entries.remove(&key.to_string()).is_some();
        if removed {
            debug!(key = %key, "cache entry invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.epoch = state.epoch.wrapping_add(1);
        state.entries.clear();
    }

    /// Drops expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state();
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.expires_at > now);
        before - state.entries.len()
    }

    /// True when a fresh entry exists for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let now = self.clock.now();
        self.state()
            .entries
            .get(&key.to_string())
            .is_some_and(|entry| entry.expires_at > now)
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Clone> ReadThroughCache<E> {
    /// Returns the cached rows for `key` when fresh, otherwise runs `loader`.
    ///
    /// The map lock is released while the loader runs. Two concurrent misses may
    /// both load and write the same entry. A load that overlaps an invalidation is
    /// returned to its caller but not stored.
    pub fn get_or_load<F>(&self, key: &CacheKey, ttl: Duration, loader: F) -> Outcome<Vec<E>>
    where
        F: FnOnce() -> Outcome<Vec<E>>,
    {
        let rendered = key.to_string();
        let now = self.clock.now();

        let epoch = {
            let state = self.state();
            if let Some(entry) = state.entries.get(&rendered) {
                if entry.expires_at > now {
                    debug!(key = %rendered, rows = entry.rows.len(), "cache hit");
                    return Outcome::success(entry.rows.clone());
                }
            }
            state.epoch
        };

        debug!(key = %rendered, "cache miss; loading from store");
        let loaded = loader();
        if let Outcome::Success(rows) = &loaded {
            let mut state = self.state();
            if rows.is_empty() {
                debug!(key = %rendered, "empty result not cached");
                state.entries.remove(&rendered);
            } else if state.epoch != epoch {
                debug!(key = %rendered, "invalidated during load; result not cached");
            } else {
                state.entries.insert(
                    rendered.clone(),
                    CacheEntry {
                        rows: rows.clone(),
                        expires_at: now + ttl,
                    },
                );
                debug!(
                    key = %rendered,
                    rows = rows.len(),
                    ttl_secs = ttl.num_seconds(),
                    "cached result"
                );
            }
        }
        loaded
    }
}

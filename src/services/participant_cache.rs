// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bounded LRU cache of participants, keyed by document path.
//!
//! Rendering a feed resolves the owner of every row; the cache keeps that
//! from turning into one network fetch per row.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::models::{DocumentPath, Participant};

/// Default number of participants kept.
pub const PARTICIPANT_CACHE_CAPACITY: usize = 50;

struct CachedParticipant {
    participant: Participant,
    /// Logical access time; larger is more recent
    last_used: u64,
}

/// Statistics for the participant cache.
#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

/// Snapshot of cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

/// Least-recently-used participant cache.
///
/// Reads may come from any thread. Inserts take `insert_lock` so the
/// capacity check and eviction happen as one step.
pub struct ParticipantCache {
    entries: DashMap<String, CachedParticipant>,
    capacity: usize,
    clock: AtomicU64,
    insert_lock: Mutex<()>,
    stats: CacheStats,
}

impl Default for ParticipantCache {
    fn default() -> Self {
        Self::new(PARTICIPANT_CACHE_CAPACITY)
    }
}

impl ParticipantCache {
    /// Create a cache holding at most `capacity` participants (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
            insert_lock: Mutex::new(()),
            stats: CacheStats::default(),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Look up a participant, marking it most recently used.
    pub fn get(&self, path: &DocumentPath) -> Option<Participant> {
        match self.entries.get_mut(path.as_str()) {
            Some(mut entry) => {
                entry.last_used = self.tick();
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.participant.clone())
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Check membership without touching recency or stats.
    pub fn contains(&self, path: &DocumentPath) -> bool {
        self.entries.contains_key(path.as_str())
    }

    /// Insert or replace a participant.
    ///
    /// Returns the key evicted to make room, if any.
    pub fn insert(&self, path: &DocumentPath, participant: Participant) -> Option<String> {
        let _guard = self
            .insert_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let evicted = if !self.entries.contains_key(path.as_str())
            && self.entries.len() >= self.capacity
        {
            self.evict_least_recent()
        } else {
            None
        };

        self.entries.insert(
            path.to_string(),
            CachedParticipant {
                participant,
                last_used: self.tick(),
            },
        );
        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
        evicted
    }

    fn evict_least_recent(&self) -> Option<String> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.last_used)
            .map(|entry| entry.key().clone())?;

        self.entries.remove(&oldest);
        self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(path = %oldest, "Evicted participant from cache");
        Some(oldest)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            inserts: self.stats.inserts.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(n: usize) -> (DocumentPath, Participant) {
        let username = format!("user{}", n);
        let p = Participant::new(username.clone(), "", "first", "last");
        (DocumentPath::participant(&username), p)
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = ParticipantCache::default();
        let (path, p) = participant(1);

        assert!(cache.get(&path).is_none());
        cache.insert(&path, p.clone());
        assert_eq!(cache.get(&path), Some(p));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
    }

    #[test]
    fn test_fifty_first_insert_evicts_least_recent() {
        let cache = ParticipantCache::default();
        for n in 0..PARTICIPANT_CACHE_CAPACITY {
            let (path, p) = participant(n);
            assert_eq!(cache.insert(&path, p), None);
        }
        assert_eq!(cache.len(), 50);

        let (path, p) = participant(50);
        let evicted = cache.insert(&path, p);

        assert_eq!(evicted.as_deref(), Some("participants/user0"));
        assert_eq!(cache.len(), 50);
        assert!(!cache.contains(&participant(0).0));
        assert!(cache.contains(&path));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_access_refreshes_recency() {
        let cache = ParticipantCache::default();
        for n in 0..PARTICIPANT_CACHE_CAPACITY {
            let (path, p) = participant(n);
            cache.insert(&path, p);
        }

        // user0 becomes most recent, so user1 is now the oldest.
        assert!(cache.get(&participant(0).0).is_some());

        let (path, p) = participant(50);
        let evicted = cache.insert(&path, p);

        assert_eq!(evicted.as_deref(), Some("participants/user1"));
        assert!(cache.contains(&participant(0).0));
    }

    #[test]
    fn test_reinserting_existing_key_does_not_evict() {
        let cache = ParticipantCache::new(2);
        let (a, pa) = participant(1);
        let (b, pb) = participant(2);
        cache.insert(&a, pa.clone());
        cache.insert(&b, pb);

        assert_eq!(cache.insert(&a, pa), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = ParticipantCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }
}

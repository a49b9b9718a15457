// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Mirrors the subset of Firestore behaviour the client relies on: field-map
//! documents, server-assigned timestamps, equality and membership filters,
//! descending time order with a limit, and change notification for live
//! queries. Used for offline mode and tests.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::db::{fields, EventQuery, EventStore, EventSubscription, ParticipantDirectory};
use crate::error::{AppError, Result};
use crate::models::{DocumentPath, FieldMap, MoodEvent, Participant};

const CHANGE_BUFFER: usize = 64;

/// In-memory database handle. Clones share the same data.
#[derive(Clone)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

struct Inner {
    /// Event documents keyed by document ID
    events: DashMap<String, FieldMap>,
    /// Participant documents keyed by document path
    participants: DashMap<String, FieldMap>,
    /// Following lists keyed by username
    following: DashMap<String, Vec<String>>,
    changes: broadcast::Sender<()>,
    stats: OperationStats,
}

#[derive(Default)]
struct OperationStats {
    event_queries: AtomicU64,
    membership_queries: AtomicU64,
    watches: AtomicU64,
    active_listeners: AtomicU64,
    event_writes: AtomicU64,
    event_deletes: AtomicU64,
    participant_reads: AtomicU64,
    following_reads: AtomicU64,
}

/// Snapshot of operations issued against a `MemoryDb`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    /// Event queries run (one-shot and live refreshes)
    pub event_queries: u64,
    /// Of those, set-membership queries
    pub membership_queries: u64,
    /// Live queries registered
    pub watches: u64,
    /// Live queries whose listener has not been torn down yet
    pub active_listeners: u64,
    pub event_writes: u64,
    pub event_deletes: u64,
    pub participant_reads: u64,
    pub following_reads: u64,
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDb {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Arc::new(Inner {
                events: DashMap::new(),
                participants: DashMap::new(),
                following: DashMap::new(),
                changes,
                stats: OperationStats::default(),
            }),
        }
    }

    /// Store a participant profile under its username-derived path.
    pub fn insert_participant(&self, participant: &Participant) -> Result<()> {
        let fields = participant.to_fields()?;
        self.inner
            .participants
            .insert(participant.path().to_string(), fields);
        Ok(())
    }

    /// Replace the list of usernames `username` follows.
    pub fn set_following(&self, username: &str, following: Vec<String>) {
        self.inner.following.insert(username.to_string(), following);
    }

    /// Number of stored events.
    pub fn event_count(&self) -> usize {
        self.inner.events.len()
    }

    pub fn operation_counts(&self) -> OperationCounts {
        let stats = &self.inner.stats;
        OperationCounts {
            event_queries: stats.event_queries.load(Ordering::Relaxed),
            membership_queries: stats.membership_queries.load(Ordering::Relaxed),
            watches: stats.watches.load(Ordering::Relaxed),
            active_listeners: stats.active_listeners.load(Ordering::SeqCst),
            event_writes: stats.event_writes.load(Ordering::Relaxed),
            event_deletes: stats.event_deletes.load(Ordering::Relaxed),
            participant_reads: stats.participant_reads.load(Ordering::Relaxed),
            following_reads: stats.following_reads.load(Ordering::Relaxed),
        }
    }

    fn run_query(&self, query: &EventQuery) -> Result<Vec<MoodEvent>> {
        self.inner.stats.event_queries.fetch_add(1, Ordering::Relaxed);
        if query.is_membership() {
            self.inner
                .stats
                .membership_queries
                .fetch_add(1, Ordering::Relaxed);
        }

        let mut events = Vec::new();
        for entry in self.inner.events.iter() {
            let event = MoodEvent::from_fields(entry.key(), entry.value().clone())?;
            if query.matches(&event) {
                events.push(event);
            }
        }

        events.sort_by(|a, b| b.cmp_by_timestamp(a));
        events.truncate(query.limit as usize);
        Ok(events)
    }

    fn notify_changed(&self) {
        // No receivers just means no live queries.
        let _ = self.inner.changes.send(());
    }
}

#[async_trait]
impl EventStore for MemoryDb {
    async fn query_events(&self, query: &EventQuery) -> Result<Vec<MoodEvent>> {
        self.run_query(query)
    }

    async fn watch_events(&self, query: EventQuery) -> Result<EventSubscription> {
        self.inner.stats.watches.fetch_add(1, Ordering::Relaxed);
        self.inner
            .stats
            .active_listeners
            .fetch_add(1, Ordering::SeqCst);
        // Subscribe before the first query so no change can slip in between.
        let mut changes = self.inner.changes.subscribe();
        let db = self.clone();

        Ok(EventSubscription::spawn(move |windows, mut shutdown| async move {
            loop {
                if windows.send(db.run_query(&query)).await.is_err() {
                    break;
                }

                tokio::select! {
                    _ = &mut shutdown => break,
                    change = changes.recv() => match change {
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            db.inner
                .stats
                .active_listeners
                .fetch_sub(1, Ordering::SeqCst);
            tracing::debug!("Memory listener removed");
        }))
    }

    async fn put_event(&self, id: &str, event: &MoodEvent) -> Result<()> {
        let mut doc = event.to_fields()?;
        if event.timestamp.is_none() {
            let now = serde_json::to_value(Utc::now())
                .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
            doc.insert(fields::TIMESTAMP.to_string(), now);
        }

        self.inner.events.insert(id.to_string(), doc);
        self.inner.stats.event_writes.fetch_add(1, Ordering::Relaxed);
        self.notify_changed();
        Ok(())
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        self.inner.events.remove(id);
        self.inner.stats.event_deletes.fetch_add(1, Ordering::Relaxed);
        self.notify_changed();
        Ok(())
    }
}

#[async_trait]
impl ParticipantDirectory for MemoryDb {
    async fn get_participant(&self, path: &DocumentPath) -> Result<Option<Participant>> {
        self.inner
            .stats
            .participant_reads
            .fetch_add(1, Ordering::Relaxed);

        let doc = self
            .inner
            .participants
            .get(path.as_str())
            .map(|entry| entry.value().clone());
        doc.map(Participant::from_fields).transpose()
    }

    async fn fetch_following(&self, username: &str) -> Result<Vec<String>> {
        self.inner
            .stats
            .following_reads
            .fetch_add(1, Ordering::Relaxed);

        Ok(self
            .inner
            .following
            .get(username)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

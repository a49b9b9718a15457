// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event repository behaviour against the in-memory store.

use async_trait::async_trait;
use bread_sync::db::{
    EventQuery, EventStore, EventSubscription, MemoryDb, ParticipantDirectory, ParticipantFilter,
};
use bread_sync::error::{AppError, Result};
use bread_sync::models::{DocumentPath, MoodEvent};
use bread_sync::services::event_repository::{
    EventRepository, MAX_EVENTS_PER_PARTICIPANT, MAX_FOLLOWING, MAX_FOLLOWING_EVENTS,
};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::timeout;

mod common;
use common::{event_for, FailingDirectory};

fn repository(db: &MemoryDb) -> EventRepository {
    EventRepository::new(Arc::new(db.clone()), Arc::new(db.clone()))
}

/// Rejects membership filters over 30 values, as Firestore does.
struct InLimitedStore {
    inner: MemoryDb,
}

const IN_LIMIT_ERROR: &str = "INVALID_ARGUMENT: 'IN' supports up to 30 comparison values.";

impl InLimitedStore {
    fn check(query: &EventQuery) -> Result<()> {
        match &query.participant {
            ParticipantFilter::In(paths) if paths.len() > 30 => {
                Err(AppError::Database(IN_LIMIT_ERROR.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl EventStore for InLimitedStore {
    async fn query_events(&self, query: &EventQuery) -> Result<Vec<MoodEvent>> {
        Self::check(query)?;
        self.inner.query_events(query).await
    }

    async fn watch_events(&self, query: EventQuery) -> Result<EventSubscription> {
        Self::check(&query)?;
        self.inner.watch_events(query).await
    }

    async fn put_event(&self, id: &str, event: &MoodEvent) -> Result<()> {
        self.inner.put_event(id, event).await
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        self.inner.delete_event(id).await
    }
}

fn base_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn test_fetch_returns_newest_twenty() {
    let db = MemoryDb::new();
    let repo = repository(&db);

    for n in 0..25 {
        let event = event_for("alice", Some(base_time() + Duration::minutes(n)));
        repo.create_event(&event).await.unwrap();
    }
    repo.create_event(&event_for("bob", Some(base_time())))
        .await
        .unwrap();

    let events = repo
        .fetch_events_for_participant(&DocumentPath::participant("alice"))
        .await
        .unwrap();

    assert_eq!(events.len(), MAX_EVENTS_PER_PARTICIPANT as usize);
    assert_eq!(events[0].timestamp, Some(base_time() + Duration::minutes(24)));
    assert!(events
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    assert!(events
        .iter()
        .all(|e| e.participant_ref == Some(DocumentPath::participant("alice"))));
}

#[tokio::test]
async fn test_fetch_with_no_events_is_empty() {
    let db = MemoryDb::new();
    let events = repository(&db)
        .fetch_events_for_participant(&DocumentPath::participant("nobody"))
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_create_without_timestamp_gets_server_time() {
    let db = MemoryDb::new();
    let repo = repository(&db);
    let event = event_for("alice", None);

    repo.create_event(&event).await.unwrap();

    let events = repo
        .fetch_events_for_participant(&DocumentPath::participant("alice"))
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].timestamp.is_some());
    assert_eq!(events[0].id, event.id);
}

#[tokio::test]
async fn test_update_without_id_is_rejected_before_write() {
    let db = MemoryDb::new();
    let repo = repository(&db);
    let mut event = event_for("alice", None);
    event.id = None;

    let err = repo.update_event(&event).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(db.operation_counts().event_writes, 0);
    assert_eq!(db.event_count(), 0);
}

#[tokio::test]
async fn test_delete_without_id_is_rejected() {
    let db = MemoryDb::new();
    let repo = repository(&db);
    let mut event = event_for("alice", None);
    event.id = None;

    assert!(repo.delete_event(&event).await.unwrap_err().is_validation());
    assert_eq!(db.operation_counts().event_deletes, 0);
}

#[tokio::test]
async fn test_update_overwrites_and_delete_removes() {
    let db = MemoryDb::new();
    let repo = repository(&db);
    let mut event = event_for("alice", Some(base_time()));
    repo.create_event(&event).await.unwrap();

    event.reason = "changed my mind".to_string();
    event.trigger = None;
    repo.update_event(&event).await.unwrap();

    let alice = DocumentPath::participant("alice");
    let events = repo.fetch_events_for_participant(&alice).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reason, "changed my mind");

    repo.delete_event(&event).await.unwrap();
    assert!(repo.fetch_events_for_participant(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subscription_re_emits_full_window_on_write() {
    let db = MemoryDb::new();
    let repo = repository(&db);
    let alice = DocumentPath::participant("alice");
    repo.create_event(&event_for("alice", Some(base_time())))
        .await
        .unwrap();

    let mut sub = repo.subscribe_events_for_participant(&alice).await.unwrap();
    let first = timeout(StdDuration::from_secs(5), sub.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(first.len(), 1);

    let newer = event_for("alice", Some(base_time() + Duration::hours(1)));
    repo.create_event(&newer).await.unwrap();

    let second = timeout(StdDuration::from_secs(5), sub.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].id, newer.id);

    sub.close().await;
}

#[tokio::test]
async fn test_empty_following_issues_no_membership_query() {
    let db = MemoryDb::new();
    let repo = repository(&db);

    let mut sub = repo.subscribe_events_from_following("loner").await.unwrap();

    let window = sub.next().await.unwrap().unwrap();
    assert!(window.is_empty());
    assert!(sub.next().await.is_none());
    assert!(!sub.is_live());

    let counts = db.operation_counts();
    assert_eq!(counts.following_reads, 1);
    assert_eq!(counts.membership_queries, 0);
    assert_eq!(counts.watches, 0);
}

#[tokio::test]
async fn test_following_feed_caps_followed_participants() {
    let db = MemoryDb::new();
    let repo = repository(&db);

    let followed: Vec<String> = (0..60).map(|n| format!("user{}", n)).collect();
    db.set_following("alice", followed.clone());

    // Users past the cap post the newest events; they must not show up.
    for (n, username) in followed.iter().enumerate() {
        let event = event_for(username, Some(base_time() + Duration::minutes(n as i64)));
        repo.create_event(&event).await.unwrap();
    }

    let mut sub = repo.subscribe_events_from_following("alice").await.unwrap();
    let window = timeout(StdDuration::from_secs(5), sub.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(window.len(), MAX_FOLLOWING_EVENTS as usize);
    let excluded: Vec<DocumentPath> = followed[50..]
        .iter()
        .map(|u| DocumentPath::participant(u))
        .collect();
    assert!(window
        .iter()
        .all(|e| !excluded.contains(e.participant_ref.as_ref().unwrap())));
    assert_eq!(window[0].participant_ref, Some(DocumentPath::participant("user49")));
    assert_eq!(db.operation_counts().membership_queries, 1);

    sub.close().await;
}

#[tokio::test]
async fn test_following_feed_over_in_limit_surfaces_backend_error() {
    let db = MemoryDb::new();
    let repo = EventRepository::new(
        Arc::new(InLimitedStore { inner: db.clone() }),
        Arc::new(db.clone()),
    );

    let followed: Vec<String> = (0..MAX_FOLLOWING).map(|n| format!("user{}", n)).collect();
    db.set_following("alice", followed);

    match repo.subscribe_events_from_following("alice").await {
        Err(AppError::Database(msg)) => assert_eq!(msg, IN_LIMIT_ERROR),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("expected the backend to reject the membership query"),
    }
    assert_eq!(db.operation_counts().active_listeners, 0);

    // 30 values still fit.
    db.set_following("bob", (0..30).map(|n| format!("user{}", n)).collect());
    let mut sub = repo.subscribe_events_from_following("bob").await.unwrap();
    let window = timeout(StdDuration::from_secs(5), sub.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(window.is_empty());
    sub.close().await;
}

#[tokio::test]
async fn test_following_feed_only_includes_followed() {
    let db = MemoryDb::new();
    let repo = repository(&db);
    db.set_following("alice", vec!["bob".to_string()]);

    repo.create_event(&event_for("bob", Some(base_time())))
        .await
        .unwrap();
    repo.create_event(&event_for("carol", Some(base_time())))
        .await
        .unwrap();

    let mut sub = repo.subscribe_events_from_following("alice").await.unwrap();
    let window = sub.next().await.unwrap().unwrap();

    assert_eq!(window.len(), 1);
    assert_eq!(window[0].participant_ref, Some(DocumentPath::participant("bob")));
}

#[tokio::test]
async fn test_following_lookup_failure_propagates() {
    let db = MemoryDb::new();
    let directory = Arc::new(FailingDirectory::default());
    let store: Arc<dyn EventStore> = Arc::new(db.clone());
    let repo = EventRepository::new(store, directory.clone() as Arc<dyn ParticipantDirectory>);

    let err = repo.subscribe_events_from_following("alice").await.err().unwrap();

    assert!(matches!(err, bread_sync::error::AppError::Database(_)));
    assert_eq!(directory.calls(), 1);
    assert_eq!(db.operation_counts().watches, 0);
}

#[tokio::test]
async fn test_close_tears_down_listener() {
    let db = MemoryDb::new();
    let repo = repository(&db);
    let alice = DocumentPath::participant("alice");

    let mut sub = repo.subscribe_events_for_participant(&alice).await.unwrap();
    sub.next().await.unwrap().unwrap();
    assert_eq!(db.operation_counts().active_listeners, 1);

    sub.close().await;
    assert_eq!(db.operation_counts().active_listeners, 0);
}

#[tokio::test]
async fn test_dropping_subscription_stops_worker() {
    let db = MemoryDb::new();
    let repo = repository(&db);
    let alice = DocumentPath::participant("alice");

    let mut sub = repo.subscribe_events_for_participant(&alice).await.unwrap();
    sub.next().await.unwrap().unwrap();
    assert_eq!(db.operation_counts().active_listeners, 1);
    drop(sub);

    timeout(StdDuration::from_secs(5), async {
        while db.operation_counts().active_listeners != 0 {
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
    })
    .await
    .expect("listener should be torn down after drop");

    // No refresh runs for writes after teardown.
    let queries = db.operation_counts().event_queries;
    repo.create_event(&event_for("alice", None)).await.unwrap();
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    assert_eq!(db.operation_counts().event_queries, queries);
}

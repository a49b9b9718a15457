// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mood event repository.
//!
//! Handles:
//! - Recent events for one participant (one-shot and live)
//! - Live feed of events from everyone a participant follows
//! - Create/update/delete keyed by event ID

use std::sync::Arc;

use crate::db::{EventQuery, EventStore, EventSubscription, ParticipantDirectory};
use crate::error::{AppError, Result};
use crate::models::{DocumentPath, MoodEvent};

/// Events fetched per participant.
pub const MAX_EVENTS_PER_PARTICIPANT: u32 = 20;
/// Followed participants included in one feed query.
///
/// Firestore rejects `IN` filters with more than 30 values, so a feed over
/// 31 to 50 followed participants fails there with `AppError::Database`.
/// `MemoryDb` accepts the full 50.
pub const MAX_FOLLOWING: usize = 50;
/// Events returned by the following feed.
pub const MAX_FOLLOWING_EVENTS: u32 = 50;

/// Repository over the `moodEvents` collection.
#[derive(Clone)]
pub struct EventRepository {
    store: Arc<dyn EventStore>,
    directory: Arc<dyn ParticipantDirectory>,
}

impl EventRepository {
    pub fn new(store: Arc<dyn EventStore>, directory: Arc<dyn ParticipantDirectory>) -> Self {
        Self { store, directory }
    }

    /// Most recent events owned by a participant, newest first.
    ///
    /// No matching events is an empty list, not an error.
    pub async fn fetch_events_for_participant(
        &self,
        participant_ref: &DocumentPath,
    ) -> Result<Vec<MoodEvent>> {
        let query = EventQuery::by_participant(participant_ref.clone(), MAX_EVENTS_PER_PARTICIPANT);
        let events = self.store.query_events(&query).await.inspect_err(|e| {
            tracing::warn!(participant = %participant_ref, error = %e, "Failed to fetch mood events");
        })?;

        if events.is_empty() {
            tracing::debug!(participant = %participant_ref, "No mood events found");
        }
        Ok(events)
    }

    /// Live version of `fetch_events_for_participant`.
    pub async fn subscribe_events_for_participant(
        &self,
        participant_ref: &DocumentPath,
    ) -> Result<EventSubscription> {
        let query = EventQuery::by_participant(participant_ref.clone(), MAX_EVENTS_PER_PARTICIPANT);
        let subscription = self.store.watch_events(query).await?;
        tracing::debug!(participant = %participant_ref, "Subscribed to participant events");
        Ok(subscription)
    }

    /// Live feed of events from everyone `username` follows.
    ///
    /// Only the first `MAX_FOLLOWING` followed participants are included.
    /// Someone who follows nobody gets a single empty window and no backend
    /// listener. Failure to load the following list fails the whole call.
    pub async fn subscribe_events_from_following(
        &self,
        username: &str,
    ) -> Result<EventSubscription> {
        let following = self.directory.fetch_following(username).await.inspect_err(|e| {
            tracing::warn!(username, error = %e, "Failed to fetch following list");
        })?;

        if following.is_empty() {
            tracing::debug!(username, "Not following anyone");
            return Ok(EventSubscription::ready(Vec::new()));
        }

        if following.len() > MAX_FOLLOWING {
            tracing::debug!(
                username,
                following = following.len(),
                max = MAX_FOLLOWING,
                "Truncating following list for feed query"
            );
        }

        let refs: Vec<DocumentPath> = following
            .iter()
            .take(MAX_FOLLOWING)
            .map(|followed| self.directory.participant_ref(followed))
            .collect();

        let query = EventQuery::by_participants(refs, MAX_FOLLOWING_EVENTS);
        self.store.watch_events(query).await
    }

    /// Store a new event under its ID.
    pub async fn create_event(&self, event: &MoodEvent) -> Result<()> {
        let id = require_id(event)?;
        self.store.put_event(id, event).await.inspect_err(|e| {
            tracing::warn!(event_id = id, error = %e, "Failed to add mood event");
        })
    }

    /// Overwrite an existing event.
    ///
    /// An event without an ID is rejected before anything is written.
    pub async fn update_event(&self, event: &MoodEvent) -> Result<()> {
        let id = require_id(event)?;
        tracing::debug!(event_id = id, "Updating mood event");
        self.store.put_event(id, event).await.inspect_err(|e| {
            tracing::warn!(event_id = id, error = %e, "Failed to update mood event");
        })
    }

    pub async fn delete_event(&self, event: &MoodEvent) -> Result<()> {
        let id = require_id(event)?;
        self.store.delete_event(id).await.inspect_err(|e| {
            tracing::warn!(event_id = id, error = %e, "Failed to delete mood event");
        })
    }
}

fn require_id(event: &MoodEvent) -> Result<&str> {
    match event.id.as_deref() {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(AppError::Validation(
            "Mood event ID cannot be null".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmotionalState;

    #[test]
    fn test_require_id() {
        let mut event = MoodEvent::new("t", "r", EmotionalState::Happy, None);
        assert!(require_id(&event).is_ok());

        event.id = None;
        assert!(require_id(&event).unwrap_err().is_validation());

        event.id = Some(String::new());
        assert!(require_id(&event).unwrap_err().is_validation());
    }
}

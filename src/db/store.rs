// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage traits the repository and participant loader are written against.

use async_trait::async_trait;

use crate::db::EventSubscription;
use crate::error::Result;
use crate::models::{DocumentPath, MoodEvent, Participant};

/// Which participants' events a query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantFilter {
    /// `participantRef == path`
    Equals(DocumentPath),
    /// `participantRef in [paths]`
    In(Vec<DocumentPath>),
}

/// Query over the `moodEvents` collection.
///
/// Results are always ordered by timestamp, newest first, and capped at
/// `limit` documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub participant: ParticipantFilter,
    pub limit: u32,
}

impl EventQuery {
    pub fn by_participant(path: DocumentPath, limit: u32) -> Self {
        Self {
            participant: ParticipantFilter::Equals(path),
            limit,
        }
    }

    pub fn by_participants(paths: Vec<DocumentPath>, limit: u32) -> Self {
        Self {
            participant: ParticipantFilter::In(paths),
            limit,
        }
    }

    /// True for set-membership queries.
    pub fn is_membership(&self) -> bool {
        matches!(self.participant, ParticipantFilter::In(_))
    }

    /// Whether an event falls under this query's filter.
    pub fn matches(&self, event: &MoodEvent) -> bool {
        let Some(owner) = event.participant_ref.as_ref() else {
            return false;
        };
        match &self.participant {
            ParticipantFilter::Equals(path) => owner == path,
            ParticipantFilter::In(paths) => paths.contains(owner),
        }
    }
}

/// Access to the `moodEvents` collection.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// One-shot query. Event IDs are taken from the document IDs.
    async fn query_events(&self, query: &EventQuery) -> Result<Vec<MoodEvent>>;

    /// Live query: yields the full result window now and after every change.
    async fn watch_events(&self, query: EventQuery) -> Result<EventSubscription>;

    /// Full-document overwrite. A missing timestamp is filled in by the store.
    async fn put_event(&self, id: &str, event: &MoodEvent) -> Result<()>;

    async fn delete_event(&self, id: &str) -> Result<()>;
}

/// Participant lookups and the following graph.
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// Fetch a participant by document path. `Ok(None)` if it does not exist.
    async fn get_participant(&self, path: &DocumentPath) -> Result<Option<Participant>>;

    /// Usernames the given participant follows.
    async fn fetch_following(&self, username: &str) -> Result<Vec<String>>;

    /// Document path for a username.
    fn participant_ref(&self, username: &str) -> DocumentPath {
        DocumentPath::participant(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmotionalState;

    #[test]
    fn test_query_matches_owner() {
        let alice = DocumentPath::participant("alice");
        let bob = DocumentPath::participant("bob");
        let event = MoodEvent::new("t", "r", EmotionalState::Happy, Some(alice.clone()));

        assert!(EventQuery::by_participant(alice.clone(), 20).matches(&event));
        assert!(!EventQuery::by_participant(bob.clone(), 20).matches(&event));
        assert!(EventQuery::by_participants(vec![bob.clone(), alice], 50).matches(&event));
        assert!(!EventQuery::by_participants(vec![bob], 50).matches(&event));
    }

    #[test]
    fn test_event_without_owner_never_matches() {
        let event = MoodEvent::new("t", "r", EmotionalState::Happy, None);
        let query = EventQuery::by_participant(DocumentPath::participant("alice"), 20);
        assert!(!query.matches(&event));
        assert!(!query.is_membership());
    }
}

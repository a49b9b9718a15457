// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use bread_sync::db::{FirestoreDb, MemoryDb, ParticipantDirectory};
use bread_sync::error::{AppError, Result};
use bread_sync::models::{DocumentPath, EmotionalState, MoodEvent, Participant};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Unique suffix for test isolation on a shared emulator.
#[allow(dead_code)]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[allow(dead_code)]
pub fn participant(username: &str) -> Participant {
    Participant::new(username, format!("{}@example.com", username), "test", "user")
}

/// Event owned by `username`, with an explicit timestamp.
#[allow(dead_code)]
pub fn event_for(username: &str, timestamp: Option<DateTime<Utc>>) -> MoodEvent {
    let mut event = MoodEvent::new(
        format!("{} event", username),
        "testing",
        EmotionalState::Happy,
        Some(DocumentPath::participant(username)),
    );
    event.timestamp = timestamp;
    event
}

/// Memory database with the given participants stored.
#[allow(dead_code)]
pub fn db_with_participants(usernames: &[&str]) -> MemoryDb {
    let db = MemoryDb::new();
    for username in usernames {
        db.insert_participant(&participant(username))
            .expect("participant should serialize");
    }
    db
}

/// Directory whose every call fails, counting attempts.
#[allow(dead_code)]
#[derive(Default)]
pub struct FailingDirectory {
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FailingDirectory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParticipantDirectory for FailingDirectory {
    async fn get_participant(&self, _path: &DocumentPath) -> Result<Option<Participant>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Database("UNAVAILABLE: backend offline".to_string()))
    }

    async fn fetch_following(&self, _username: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Database("UNAVAILABLE: backend offline".to_string()))
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore, plus an in-process store for offline use).

pub mod firestore;
pub mod memory;
pub mod store;
pub mod subscription;

pub use self::firestore::FirestoreDb;
pub use memory::{MemoryDb, OperationCounts};
pub use store::{EventQuery, EventStore, ParticipantDirectory, ParticipantFilter};
pub use subscription::{EventSubscription, EventWindow};

use crate::config::Config;
use crate::error::AppError;
use tokio::sync::OnceCell;

/// Collection names as constants.
pub mod collections {
    pub const MOOD_EVENTS: &str = "moodEvents";
    pub const PARTICIPANTS: &str = "participants";
    /// Subcollection under each participant listing who they follow
    pub const FOLLOWING: &str = "following";
}

/// Field names used in queries.
pub mod fields {
    pub const PARTICIPANT_REF: &str = "participantRef";
    pub const TIMESTAMP: &str = "timestamp";
}

static HANDLE: OnceCell<FirestoreDb> = OnceCell::const_new();

/// Shared Firestore handle for the process.
///
/// The first caller connects; concurrent callers wait for that connection
/// and every later call reuses it. Connection errors are not cached, so a
/// failed first attempt can be retried.
pub async fn handle(config: &Config) -> Result<FirestoreDb, AppError> {
    HANDLE
        .get_or_try_init(|| FirestoreDb::new(&config.gcp_project_id))
        .await
        .cloned()
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Mood events (queries, live queries, writes)
//! - Participants (profile lookup by document path)
//! - Following lists (`participants/{username}/following` subcollection)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::{
    FirestoreListenEvent, FirestoreListenerTarget, FirestoreMemListenStateStorage,
    FirestoreQueryDirection, FirestoreReference, FirestoreTransformServerValue,
};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::db::{
    collections, fields, EventQuery, EventStore, EventSubscription, ParticipantDirectory,
    ParticipantFilter,
};
use crate::error::AppError;
use crate::models::{
    DocumentPath, EmotionalState, GeoInfo, MoodEvent, Participant, SocialSituation,
};

/// Target ID for the single query each listener watches.
const EVENT_LISTENER_TARGET: u32 = 17;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Stored shape of a mood event.
///
/// Differs from `MoodEvent` only in Firestore-native field types: the owner
/// is a document reference and the timestamp a Firestore timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoodEventDocument {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    reason: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "firestore::serialize_as_optional_timestamp"
    )]
    timestamp: Option<DateTime<Utc>>,
    emotional_state: EmotionalState,
    #[serde(default)]
    social_situation: Option<SocialSituation>,
    #[serde(default)]
    geo_info: Option<GeoInfo>,
    #[serde(default)]
    attached_image: Option<String>,
    #[serde(default)]
    trigger: Option<String>,
    #[serde(default)]
    participant_ref: Option<FirestoreReference>,
}

/// One entry of a participant's following subcollection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FollowingEntry {
    username: String,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Reference Conversion ────────────────────────────────────

    /// Absolute reference for a relative document path.
    fn to_reference(&self, path: &DocumentPath) -> Result<FirestoreReference, AppError> {
        let documents_path = self.get_client()?.get_documents_path();
        Ok(FirestoreReference(format!("{}/{}", documents_path, path)))
    }

    /// Relative document path for a stored reference.
    fn path_of_reference(&self, reference: &FirestoreReference) -> Result<DocumentPath, AppError> {
        let prefix = format!("{}/", self.get_client()?.get_documents_path());
        let full = reference.0.as_str();
        Ok(DocumentPath::new(full.strip_prefix(&prefix).unwrap_or(full)))
    }

    fn to_document(&self, event: &MoodEvent) -> Result<MoodEventDocument, AppError> {
        let participant_ref = event
            .participant_ref
            .as_ref()
            .map(|path| self.to_reference(path))
            .transpose()?;

        Ok(MoodEventDocument {
            id: event.id.clone(),
            title: event.title.clone(),
            reason: event.reason.clone(),
            timestamp: event.timestamp,
            emotional_state: event.emotional_state,
            social_situation: event.social_situation,
            geo_info: event.geo_info.clone(),
            attached_image: event.attached_image.clone(),
            trigger: event.trigger.clone(),
            participant_ref,
        })
    }

    fn event_from_document(
        &self,
        doc: &gcloud_sdk::google::firestore::v1::Document,
    ) -> Result<MoodEvent, AppError> {
        let stored: MoodEventDocument = firestore::FirestoreDb::deserialize_doc_to(doc)
            .map_err(|e| AppError::data_integrity("MoodEvent", e))?;
        // The document ID always wins over the stored `id` field.
        let document_id = doc.name.rsplit('/').next().unwrap_or_default().to_string();

        let participant_ref = stored
            .participant_ref
            .as_ref()
            .map(|reference| self.path_of_reference(reference))
            .transpose()?;

        Ok(MoodEvent {
            id: Some(document_id),
            title: stored.title,
            reason: stored.reason,
            timestamp: stored.timestamp,
            emotional_state: stored.emotional_state,
            social_situation: stored.social_situation,
            geo_info: stored.geo_info,
            attached_image: stored.attached_image,
            trigger: stored.trigger,
            participant_ref,
        })
    }

    // ─── Mood Event Operations ───────────────────────────────────

    /// Run an event query, newest first.
    async fn run_event_query(&self, query: &EventQuery) -> Result<Vec<MoodEvent>, AppError> {
        let select = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::MOOD_EVENTS);

        let select = match &query.participant {
            ParticipantFilter::Equals(path) => {
                let reference = self.to_reference(path)?;
                select.filter(move |q| q.field(fields::PARTICIPANT_REF).eq(reference.clone()))
            }
            ParticipantFilter::In(paths) => {
                let references = paths
                    .iter()
                    .map(|path| self.to_reference(path))
                    .collect::<Result<Vec<_>, _>>()?;
                select.filter(move |q| q.field(fields::PARTICIPANT_REF).is_in(references.clone()))
            }
        };

        let docs = select
            .order_by([(fields::TIMESTAMP, FirestoreQueryDirection::Descending)])
            .limit(query.limit)
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        docs.iter().map(|doc| self.event_from_document(doc)).collect()
    }

    // ─── Participant Operations ──────────────────────────────────

    /// Create or update a participant profile.
    pub async fn upsert_participant(&self, participant: &Participant) -> Result<(), AppError> {
        let path = participant.path();
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PARTICIPANTS)
            .document_id(path.document_id())
            .object(participant)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record that `username` follows `followed`.
    pub async fn add_following(&self, username: &str, followed: &str) -> Result<(), AppError> {
        let client = self.get_client()?;
        let owner = DocumentPath::participant(username);
        let parent_path = client
            .parent_path(collections::PARTICIPANTS, owner.document_id())
            .map_err(|e| AppError::Database(e.to_string()))?;
        let entry = FollowingEntry {
            username: followed.to_string(),
        };

        let _: () = client
            .fluent()
            .update()
            .in_col(collections::FOLLOWING)
            .document_id(DocumentPath::participant(followed).document_id())
            .parent(&parent_path)
            .object(&entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for FirestoreDb {
    async fn query_events(&self, query: &EventQuery) -> Result<Vec<MoodEvent>, AppError> {
        let events = self.run_event_query(query).await?;
        tracing::debug!(
            count = events.len(),
            limit = query.limit,
            membership = query.is_membership(),
            "Fetched mood events"
        );
        Ok(events)
    }

    /// Registers a Firestore listener on the filter and re-runs the ordered,
    /// limited query whenever it reports a change.
    async fn watch_events(&self, query: EventQuery) -> Result<EventSubscription, AppError> {
        let client = self.get_client()?;

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create listener: {}", e)))?;

        let select = client.fluent().select().from(collections::MOOD_EVENTS);
        let select = match &query.participant {
            ParticipantFilter::Equals(path) => {
                let reference = self.to_reference(path)?;
                select.filter(move |q| q.field(fields::PARTICIPANT_REF).eq(reference.clone()))
            }
            ParticipantFilter::In(paths) => {
                let references = paths
                    .iter()
                    .map(|path| self.to_reference(path))
                    .collect::<Result<Vec<_>, _>>()?;
                select.filter(move |q| q.field(fields::PARTICIPANT_REF).is_in(references.clone()))
            }
        };
        select
            .listen()
            .add_target(
                FirestoreListenerTarget::new(EVENT_LISTENER_TARGET),
                &mut listener,
            )
            .map_err(|e| AppError::Database(format!("Failed to add listener target: {}", e)))?;

        // Capacity 1: a burst of changes collapses into one refresh.
        let (change_tx, mut change_rx) = mpsc::channel::<()>(1);
        listener
            .start(move |event| {
                let change_tx = change_tx.clone();
                async move {
                    match event {
                        FirestoreListenEvent::DocumentChange(_)
                        | FirestoreListenEvent::DocumentDelete(_)
                        | FirestoreListenEvent::DocumentRemove(_) => {
                            let _ = change_tx.try_send(());
                        }
                        _ => {}
                    }
                    Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start listener: {}", e)))?;

        tracing::debug!(
            limit = query.limit,
            membership = query.is_membership(),
            "Mood event listener registered"
        );

        let db = self.clone();
        Ok(EventSubscription::spawn(move |windows, mut shutdown| async move {
            loop {
                let window = db.run_event_query(&query).await;
                if let Err(e) = &window {
                    tracing::warn!(error = %e, "Mood event listener refresh failed");
                }
                if windows.send(window).await.is_err() {
                    break;
                }

                tokio::select! {
                    _ = &mut shutdown => break,
                    change = change_rx.recv() => if change.is_none() { break },
                }
            }

            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, "Failed to shut down mood event listener");
            } else {
                tracing::debug!("Mood event listener removed");
            }
        }))
    }

    async fn put_event(&self, id: &str, event: &MoodEvent) -> Result<(), AppError> {
        let doc = self.to_document(event)?;
        let client = self.get_client()?;

        if doc.timestamp.is_none() {
            let _: () = client
                .fluent()
                .update()
                .in_col(collections::MOOD_EVENTS)
                .document_id(id)
                .object(&doc)
                .transforms(|t| {
                    t.fields([t
                        .field(fields::TIMESTAMP)
                        .server_value(FirestoreTransformServerValue::RequestTime)])
                })
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        } else {
            let _: () = client
                .fluent()
                .update()
                .in_col(collections::MOOD_EVENTS)
                .document_id(id)
                .object(&doc)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        tracing::debug!(event_id = id, "Mood event written");
        Ok(())
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::MOOD_EVENTS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(event_id = id, "Mood event deleted");
        Ok(())
    }
}

#[async_trait]
impl ParticipantDirectory for FirestoreDb {
    async fn get_participant(
        &self,
        path: &DocumentPath,
    ) -> Result<Option<Participant>, AppError> {
        if path.parent() != Some(collections::PARTICIPANTS) {
            return Err(AppError::Validation(format!(
                "{} is not a participant document",
                path
            )));
        }

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PARTICIPANTS)
            .obj()
            .one(path.document_id())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn fetch_following(&self, username: &str) -> Result<Vec<String>, AppError> {
        let client = self.get_client()?;
        let owner = DocumentPath::participant(username);
        let parent_path = client
            .parent_path(collections::PARTICIPANTS, owner.document_id())
            .map_err(|e| AppError::Database(e.to_string()))?;

        let entries: Vec<FollowingEntry> = client
            .fluent()
            .select()
            .from(collections::FOLLOWING)
            .parent(&parent_path)
            .obj::<FollowingEntry>()
            .stream_query_with_errors()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(entries.into_iter().map(|entry| entry.username).collect())
    }
}

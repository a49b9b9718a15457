// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mood event model for storage and display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{AppError, Result};
use crate::models::{DocumentPath, FieldMap, GeoInfo};

/// Emotional state recorded with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionalState {
    None,
    Happy,
    Sad,
    Angry,
    Anxious,
    Neutral,
    Confused,
    Fearful,
    Shameful,
    Surprised,
}

/// Who the participant was with when the event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocialSituation {
    None,
    Alone,
    WithOneOtherPerson,
    WithTwoToSeveralPeople,
    WithFamily,
    WithFriends,
    WithCoworkers,
    WithStrangers,
}

impl fmt::Display for SocialSituation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SocialSituation::None => "None",
            SocialSituation::Alone => "Alone",
            SocialSituation::WithOneOtherPerson => "With One Other Person",
            SocialSituation::WithTwoToSeveralPeople => "With Two To Several People",
            SocialSituation::WithFamily => "With Family",
            SocialSituation::WithFriends => "With Friends",
            SocialSituation::WithCoworkers => "With Coworkers",
            SocialSituation::WithStrangers => "With Strangers",
        };
        f.write_str(label)
    }
}

/// A logged mood record, stored in the `moodEvents` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEvent {
    /// Client-generated ID (also used as document ID)
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub reason: String,
    /// Assigned by the backend on write; `None` until then
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub emotional_state: EmotionalState,
    #[serde(default)]
    pub social_situation: Option<SocialSituation>,
    #[serde(default)]
    pub geo_info: Option<GeoInfo>,
    /// Base64-encoded image
    #[serde(default)]
    pub attached_image: Option<String>,
    #[serde(default)]
    pub trigger: Option<String>,
    /// Owning participant (lookup key, never embedded)
    #[serde(default)]
    pub participant_ref: Option<DocumentPath>,
}

impl MoodEvent {
    /// Create a new, not yet persisted event with a fresh ID.
    pub fn new(
        title: impl Into<String>,
        reason: impl Into<String>,
        emotional_state: EmotionalState,
        participant_ref: Option<DocumentPath>,
    ) -> Self {
        Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            title: title.into(),
            reason: reason.into(),
            timestamp: None,
            emotional_state,
            social_situation: None,
            geo_info: None,
            attached_image: None,
            trigger: None,
            participant_ref,
        }
    }

    /// Order by timestamp. A missing timestamp sorts before any present one.
    pub fn cmp_by_timestamp(&self, other: &Self) -> Ordering {
        self.timestamp.cmp(&other.timestamp)
    }

    /// Build an event from a stored document.
    ///
    /// The document ID always wins over any `id` stored in the body, since
    /// the ID is defined by storage position.
    pub fn from_fields(document_id: &str, mut fields: FieldMap) -> Result<Self> {
        fields.insert(
            "id".to_string(),
            serde_json::Value::String(document_id.to_string()),
        );
        serde_json::from_value(serde_json::Value::Object(fields))
            .map_err(|e| AppError::data_integrity("MoodEvent", e))
    }

    /// Field map for a full-document overwrite.
    pub fn to_fields(&self) -> Result<FieldMap> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::DataIntegrity(
                "MoodEvent did not serialize to a map".to_string(),
            )),
            Err(e) => Err(AppError::data_integrity("MoodEvent", e)),
        }
    }
}

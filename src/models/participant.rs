// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Participant profile model.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{DocumentPath, FieldMap, FollowRequest};

/// Participant profile stored in the `participants` collection.
///
/// The social graph lists are transient: they are filled in by whoever
/// manages follow relationships and are never written with the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Unique username (also the document ID)
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Base64-encoded profile image
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    follower_count: u32,
    #[serde(default)]
    following_count: u32,

    #[serde(skip)]
    followers: Vec<String>,
    #[serde(skip)]
    following: Vec<String>,
    #[serde(skip)]
    follow_requests: Vec<FollowRequest>,
}

impl Participant {
    /// Create a participant, normalising name capitalisation.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        first_name: &str,
        last_name: &str,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            first_name: capitalize(first_name),
            last_name: capitalize(last_name),
            profile_picture: None,
            follower_count: 0,
            following_count: 0,
            followers: Vec::new(),
            following: Vec::new(),
            follow_requests: Vec::new(),
        }
    }

    /// Document path of this participant.
    pub fn path(&self) -> DocumentPath {
        DocumentPath::participant(&self.username)
    }

    /// "First Last", capitalised.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            capitalize(&self.first_name),
            capitalize(&self.last_name)
        )
    }

    pub fn followers(&self) -> &[String] {
        &self.followers
    }

    /// Replace the follower list; the follower count follows the list length.
    pub fn set_followers(&mut self, followers: Vec<String>) {
        self.follower_count = followers.len() as u32;
        self.followers = followers;
    }

    pub fn following(&self) -> &[String] {
        &self.following
    }

    /// Replace the following list; the following count follows the list length.
    pub fn set_following(&mut self, following: Vec<String>) {
        self.following_count = following.len() as u32;
        self.following = following;
    }

    pub fn follow_requests(&self) -> &[FollowRequest] {
        &self.follow_requests
    }

    pub fn set_follow_requests(&mut self, requests: Vec<FollowRequest>) {
        self.follow_requests = requests;
    }

    pub fn follower_count(&self) -> u32 {
        self.follower_count
    }

    /// Set the count directly, e.g. from a server-maintained aggregate.
    ///
    /// This can leave the count out of step with `followers()`.
    pub fn set_follower_count(&mut self, count: u32) {
        self.follower_count = count;
    }

    pub fn following_count(&self) -> u32 {
        self.following_count
    }

    /// Set the count directly. Same caveat as `set_follower_count`.
    pub fn set_following_count(&mut self, count: u32) {
        self.following_count = count;
    }

    /// Decode the stored profile picture into raw image bytes.
    ///
    /// Returns `Ok(None)` when the participant has no picture.
    pub fn decode_profile_picture(&self) -> Result<Option<Vec<u8>>> {
        let Some(encoded) = self.profile_picture.as_deref() else {
            return Ok(None);
        };
        // Stored pictures may be line-wrapped; strip whitespace first.
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        BASE64
            .decode(compact)
            .map(Some)
            .map_err(|e| AppError::data_integrity("Participant.profilePicture", e))
    }

    /// Build a participant from a stored document.
    pub fn from_fields(fields: FieldMap) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(fields))
            .map_err(|e| AppError::data_integrity("Participant", e))
    }

    /// Persisted fields only (social graph lists are excluded).
    pub fn to_fields(&self) -> Result<FieldMap> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::DataIntegrity(
                "Participant did not serialize to a map".to_string(),
            )),
            Err(e) => Err(AppError::data_integrity("Participant", e)),
        }
    }
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

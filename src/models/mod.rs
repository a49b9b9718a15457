// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod follow_request;
pub mod location;
pub mod mood_event;
pub mod participant;
pub mod path;

pub use follow_request::{FollowRequest, FollowStatus};
pub use location::GeoInfo;
pub use mood_event::{EmotionalState, MoodEvent, SocialSituation};
pub use participant::Participant;
pub use path::DocumentPath;

/// Raw document body as a field map.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

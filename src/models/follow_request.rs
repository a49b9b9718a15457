// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Follow request model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, Result};
use crate::models::FieldMap;
use crate::time_utils::format_utc_rfc3339;

/// Status of a follow request.
///
/// Stored as a lowercase string. Anything else read back from storage is a
/// data integrity error rather than a silently accepted status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    Pending,
    Accepted,
    Declined,
}

impl FollowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowStatus::Pending => "pending",
            FollowStatus::Accepted => "accepted",
            FollowStatus::Declined => "declined",
        }
    }

    /// Accepted and declined requests never change again.
    pub fn is_terminal(&self) -> bool {
        match self {
            FollowStatus::Pending => false,
            FollowStatus::Accepted | FollowStatus::Declined => true,
        }
    }
}

impl fmt::Display for FollowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request from `from_username` to follow the participant holding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub from_username: String,
    status: FollowStatus,
    pub timestamp: DateTime<Utc>,
}

impl FollowRequest {
    /// New pending request stamped with the current time.
    pub fn new(from_username: impl Into<String>) -> Self {
        Self {
            from_username: from_username.into(),
            status: FollowStatus::Pending,
            timestamp: Utc::now(),
        }
    }

    pub fn status(&self) -> FollowStatus {
        self.status
    }

    pub fn accept(&mut self) -> Result<()> {
        self.transition(FollowStatus::Accepted)
    }

    pub fn decline(&mut self) -> Result<()> {
        self.transition(FollowStatus::Declined)
    }

    fn transition(&mut self, next: FollowStatus) -> Result<()> {
        match self.status {
            FollowStatus::Pending => {
                self.status = next;
                Ok(())
            }
            FollowStatus::Accepted | FollowStatus::Declined => Err(AppError::Validation(format!(
                "follow request from {} is already {}",
                self.from_username, self.status
            ))),
        }
    }

    /// Document fields: exactly `fromUsername`, `status` and `timestamp`.
    pub fn to_map(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(
            "fromUsername".to_string(),
            self.from_username.clone().into(),
        );
        map.insert("status".to_string(), self.status.as_str().into());
        map.insert(
            "timestamp".to_string(),
            format_utc_rfc3339(self.timestamp).into(),
        );
        map
    }

    /// Build a request from a stored document.
    pub fn from_fields(fields: FieldMap) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(fields))
            .map_err(|e| AppError::data_integrity("FollowRequest", e))
    }
}

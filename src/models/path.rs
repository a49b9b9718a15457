// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document paths used as non-owning references between records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::collections;

/// Relative path of a Firestore document, e.g. `participants/alice`.
///
/// A mood event refers to its owner through one of these. The path is also
/// the participant cache key, so it must stay stable for a given document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Wrap an already-relative path. Leading/trailing slashes are trimmed.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self(path.trim_matches('/').to_string())
    }

    /// Path of a document inside a top-level collection.
    pub fn in_collection(collection: &str, document_id: &str) -> Self {
        Self(format!("{}/{}", collection, document_id))
    }

    /// Path of the participant document for a username.
    pub fn participant(username: &str) -> Self {
        Self::in_collection(collections::PARTICIPANTS, &urlencoding::encode(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment (the document ID).
    pub fn document_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Everything before the document ID.
    pub fn parent(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(parent, _)| parent)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

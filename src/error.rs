// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the repository, loader and login flow.

/// Application error type.
///
/// Every asynchronous operation in this crate reports failure through this
/// type; nothing panics past an `.await` boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Rejected locally before any backend call.
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Failure reported by the document database, surfaced verbatim.
    #[error("Database error: {0}")]
    Database(String),

    /// Authentication succeeded or failed without yielding a usable identity.
    #[error("Identity error: {0}")]
    Identity(String),

    /// A stored document could not be mapped onto a record.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message shown to the user when sign-in fails for any reason.
    pub const SIGN_IN_FAILED: &'static str = "Failed to sign in.";

    /// True if the error was produced by local validation (no network call made).
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// Wrap a serde mapping failure for the named record type.
    pub fn data_integrity(record: &str, err: impl std::fmt::Display) -> Self {
        AppError::DataIntegrity(format!("{}: {}", record, err))
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;

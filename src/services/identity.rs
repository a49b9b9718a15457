// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password identity provider.
//!
//! Handles:
//! - Credential exchange against the Identity Toolkit REST API
//! - In-memory session with expiry (the "current user")
//! - Emulator support via FIREBASE_AUTH_EMULATOR_HOST

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    /// The app stores the participant's username here
    pub display_name: Option<String>,
}

/// Outcome of a successful credential exchange.
///
/// `user` can still be `None`; callers must treat that as a failure.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: Option<AuthUser>,
}

/// Identity provider used by the login flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The user of the current valid session, if any.
    async fn current_user(&self) -> Option<AuthUser>;

    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult>;

    async fn sign_out(&self);
}

#[derive(Debug, Clone)]
struct Session {
    user: AuthUser,
    id_token: String,
    expires_at: DateTime<Utc>,
}

/// Response from `accounts:signInWithPassword`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    #[serde(default)]
    local_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    /// Lifetime in seconds, as a string
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity Toolkit REST client.
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<Session>>,
}

impl FirebaseAuthClient {
    /// Create a client for the given web API key.
    ///
    /// For local development with emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(api_key: impl Into<String>) -> Self {
        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                format!("http://{}/identitytoolkit.googleapis.com/v1", host)
            }
            Err(_) => IDENTITY_TOOLKIT_URL.to_string(),
        };
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            session: RwLock::new(None),
        }
    }

    /// ID token of the current valid session, for authenticated backend calls.
    pub async fn id_token(&self) -> Option<String> {
        let session = self.session.read().await;
        session
            .as_ref()
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.id_token.clone())
    }

    /// Check response status and map provider errors.
    async fn check_response(response: reqwest::Response) -> Result<SignInResponse> {
        if response.status().is_success() {
            return response
                .json::<SignInResponse>()
                .await
                .map_err(|e| AppError::Identity(format!("Malformed sign-in response: {}", e)));
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}", status));
        Err(AppError::Identity(message))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn current_user(&self) -> Option<AuthUser> {
        let session = self.session.read().await;
        session
            .as_ref()
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.user.clone())
    }

    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult> {
        let url = format!("{}/accounts:signInWithPassword", self.base_url);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Sign-in request failed: {}", e)))?;

        let signed_in = Self::check_response(response).await?;

        let Some(uid) = signed_in.local_id.filter(|id| !id.is_empty()) else {
            return Ok(AuthResult { user: None });
        };
        let lifetime = signed_in.expires_in.parse::<i64>().unwrap_or(3600);
        let user = AuthUser {
            uid,
            email: signed_in.email,
            display_name: signed_in.display_name.filter(|name| !name.is_empty()),
        };

        *self.session.write().await = Some(Session {
            user: user.clone(),
            id_token: signed_in.id_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        });
        tracing::info!(uid = %user.uid, "Signed in");

        Ok(AuthResult { user: Some(user) })
    }

    async fn sign_out(&self) {
        *self.session.write().await = None;
    }
}

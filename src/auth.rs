// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password login flow.
//!
//! States:
//! - `Unauthenticated` → `Authenticating` → `Authenticated`
//! - `Authenticating` → `AuthenticationFailed` → `Unauthenticated`
//!
//! A failed attempt stays in `AuthenticationFailed` until the notice is
//! dismissed or the form is submitted again.
//!
//! On success the participant's username (the provider's display name) is
//! stored under [`USERNAME_KEY`] and the caller is sent Home with history
//! cleared.

use std::sync::Arc;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Result};
use crate::services::identity::{AuthUser, IdentityProvider};
use crate::services::preferences::{Preferences, USERNAME_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    Authenticating,
    Authenticated { username: String },
    AuthenticationFailed,
}

/// Screen to move to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Home { clear_history: bool },
    Signup,
}

/// Email/password pair as entered.
#[derive(Debug, Clone, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Per-field messages for rejected input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let message = |field: &str| {
            errors
                .field_errors()
                .get(field)
                .and_then(|errs| errs.first())
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => e.code.to_string(),
                })
        };
        Self {
            email: message("email"),
            password: message("password"),
        }
    }
}

/// What the caller should do after a login step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Navigate(Navigation),
    /// Input rejected locally; nothing was sent to the provider.
    Rejected(FieldErrors),
    /// Show `notice` and stay on the login screen.
    Failed { notice: &'static str },
    Stay,
}

fn home() -> LoginOutcome {
    LoginOutcome::Navigate(Navigation::Home {
        clear_history: true,
    })
}

pub struct LoginFlow {
    identity: Arc<dyn IdentityProvider>,
    preferences: Arc<dyn Preferences>,
    state: LoginState,
}

impl LoginFlow {
    pub fn new(identity: Arc<dyn IdentityProvider>, preferences: Arc<dyn Preferences>) -> Self {
        Self {
            identity,
            preferences,
            state: LoginState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    /// Skip the login screen when a valid session already exists.
    pub async fn start(&mut self) -> LoginOutcome {
        let Some(user) = self.identity.current_user().await else {
            tracing::debug!("User is not signed in");
            return LoginOutcome::Stay;
        };

        match self.remember(&user) {
            Ok(username) => {
                tracing::info!(uid = %user.uid, "Resuming existing session");
                self.state = LoginState::Authenticated { username };
                home()
            }
            Err(e) => {
                tracing::warn!(uid = %user.uid, error = %e, "Existing session is unusable");
                LoginOutcome::Stay
            }
        }
    }

    /// Sign in with the entered credentials.
    pub async fn submit(&mut self, email: &str, password: &str) -> LoginOutcome {
        if matches!(self.state, LoginState::Authenticated { .. }) {
            return LoginOutcome::Stay;
        }

        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        if let Err(errors) = credentials.validate() {
            return LoginOutcome::Rejected(FieldErrors::from(&errors));
        }

        self.state = LoginState::Authenticating;
        match self.sign_in(&credentials).await {
            Ok(username) => {
                tracing::info!(username = %username, "Signed in");
                self.state = LoginState::Authenticated { username };
                home()
            }
            Err(e) => {
                tracing::warn!(email = %credentials.email, error = %e, "Failed to sign in");
                self.state = LoginState::AuthenticationFailed;
                LoginOutcome::Failed {
                    notice: AppError::SIGN_IN_FAILED,
                }
            }
        }
    }

    /// The failure notice was shown; back to the login form.
    pub fn dismiss_notice(&mut self) {
        if self.state == LoginState::AuthenticationFailed {
            self.state = LoginState::Unauthenticated;
        }
    }

    pub fn request_signup(&self) -> Navigation {
        Navigation::Signup
    }

    /// End the session and forget the stored username.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.identity.sign_out().await;
        self.state = LoginState::Unauthenticated;
        self.preferences.remove(USERNAME_KEY)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<String> {
        let result = self
            .identity
            .sign_in_with_email_and_password(&credentials.email, &credentials.password)
            .await?;
        let user = result
            .user
            .ok_or_else(|| AppError::Identity("User is null after signing in".to_string()))?;
        self.remember(&user)
    }

    /// Store the user's display name as the participant username.
    fn remember(&self, user: &AuthUser) -> Result<String> {
        let username = user
            .display_name
            .clone()
            .ok_or_else(|| AppError::Identity(format!("User {} has no display name", user.uid)))?;
        self.preferences.put_string(USERNAME_KEY, &username)?;
        Ok(username)
    }
}

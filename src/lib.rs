// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Bread-Sync: data and synchronisation core of a mood-sharing client
//!
//! Participants log mood events and follow each other. This crate provides
//! the records, the Firestore-backed event repository with live feeds, the
//! participant cache and loader behind the feed rows, and the login flow.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod time_utils;

use std::sync::Arc;

use auth::LoginFlow;
use config::Config;
use db::{EventStore, MemoryDb, ParticipantDirectory};
use error::Result;
use feed::FeedAdapter;
use services::{
    EventRepository, FilePreferences, FirebaseAuthClient, ParticipantCache, ParticipantLoader,
};

/// Shared client state.
///
/// Holds one participant loader (and so one cache and one fetch worker)
/// for every feed created from it.
pub struct AppContext {
    pub config: Config,
    pub events: EventRepository,
    pub loader: Arc<ParticipantLoader>,
}

impl AppContext {
    /// Connect to Firestore through the process-wide handle.
    pub async fn connect(config: Config) -> Result<Self> {
        let db = db::handle(&config).await?;
        let store: Arc<dyn EventStore> = Arc::new(db.clone());
        let directory: Arc<dyn ParticipantDirectory> = Arc::new(db);
        Ok(Self::with_backend(config, store, directory))
    }

    /// Run against an in-process database.
    pub fn offline(config: Config, db: MemoryDb) -> Self {
        tracing::info!("Using in-memory database");
        Self::with_backend(config, Arc::new(db.clone()), Arc::new(db))
    }

    /// Must be called inside a tokio runtime.
    pub fn with_backend(
        config: Config,
        store: Arc<dyn EventStore>,
        directory: Arc<dyn ParticipantDirectory>,
    ) -> Self {
        let cache = Arc::new(ParticipantCache::new(config.participant_cache_capacity));
        let loader = Arc::new(ParticipantLoader::new(directory.clone(), cache));
        Self {
            config,
            events: EventRepository::new(store, directory),
            loader,
        }
    }

    /// New feed sharing this context's participant cache.
    pub fn feed(&self) -> FeedAdapter {
        FeedAdapter::new(self.loader.clone())
    }

    /// Login flow backed by Firebase Auth and the configured preferences file.
    pub fn login_flow(&self) -> Result<LoginFlow> {
        let identity = Arc::new(FirebaseAuthClient::new(
            self.config.firebase_api_key.clone(),
        ));
        let preferences = Arc::new(FilePreferences::open(&self.config.preferences_path)?);
        Ok(LoginFlow::new(identity, preferences))
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolves the participant behind each feed row.
//!
//! Lookups never block the caller: a cache hit is answered immediately, a
//! miss is queued for a single background worker that fetches, caches and
//! reports back over the row update channel supplied with the request.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::db::ParticipantDirectory;
use crate::error::{AppError, Result};
use crate::models::{DocumentPath, MoodEvent, Participant};
use crate::services::participant_cache::ParticipantCache;

/// Identifies the row binding a lookup was made for.
///
/// `slot` is the recycled row; `binding` changes every time the slot is
/// bound to another event, so late results can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowTicket {
    pub slot: usize,
    pub binding: u64,
}

/// Identity to show in a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Unknown,
    Participant(Participant),
}

/// Result of a background lookup, addressed to a row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdate {
    pub ticket: RowTicket,
    pub identity: Identity,
}

pub type RowUpdateSender = mpsc::UnboundedSender<RowUpdate>;

/// Immediate answer to a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The event has no owner; nothing will be fetched.
    Unknown,
    Cached(Participant),
    /// A fetch was queued; a `RowUpdate` will follow.
    Pending,
}

struct FetchJob {
    path: DocumentPath,
    ticket: RowTicket,
    reply: RowUpdateSender,
}

/// Cache-backed participant lookup with one background fetch worker.
pub struct ParticipantLoader {
    cache: Arc<ParticipantCache>,
    jobs: mpsc::UnboundedSender<FetchJob>,
}

impl ParticipantLoader {
    /// Create the loader and spawn its worker. Must be called inside a
    /// tokio runtime. The worker exits once the loader is dropped.
    pub fn new(directory: Arc<dyn ParticipantDirectory>, cache: Arc<ParticipantCache>) -> Self {
        let (jobs, rx) = mpsc::unbounded_channel();
        tokio::spawn(fetch_worker(directory, cache.clone(), rx));
        Self { cache, jobs }
    }

    pub fn cache(&self) -> &Arc<ParticipantCache> {
        &self.cache
    }

    /// Resolve the owner of `event` for the row identified by `ticket`.
    pub fn resolve(
        &self,
        event: &MoodEvent,
        ticket: RowTicket,
        reply: &RowUpdateSender,
    ) -> Resolution {
        let Some(path) = event.participant_ref.as_ref() else {
            return Resolution::Unknown;
        };

        if let Some(participant) = self.cache.get(path) {
            return Resolution::Cached(participant);
        }

        let job = FetchJob {
            path: path.clone(),
            ticket,
            reply: reply.clone(),
        };
        if self.jobs.send(job).is_err() {
            // Worker gone (runtime shutting down); nothing can arrive later.
            tracing::warn!(path = %path, "Participant fetch worker unavailable");
            return Resolution::Unknown;
        }
        Resolution::Pending
    }
}

/// Fetch one participant. A missing document is `NotFound`.
async fn fetch_participant(
    directory: &dyn ParticipantDirectory,
    path: &DocumentPath,
) -> Result<Participant> {
    directory
        .get_participant(path)
        .await?
        .ok_or_else(|| AppError::NotFound(path.to_string()))
}

/// Serially processes fetch jobs. Being the only writer keeps cache
/// insertion order well defined.
async fn fetch_worker(
    directory: Arc<dyn ParticipantDirectory>,
    cache: Arc<ParticipantCache>,
    mut jobs: mpsc::UnboundedReceiver<FetchJob>,
) {
    while let Some(job) = jobs.recv().await {
        if job.reply.is_closed() {
            tracing::debug!(path = %job.path, "Row surface detached, skipping fetch");
            continue;
        }

        // An earlier job may already have fetched this participant.
        let identity = if let Some(participant) = cache.get(&job.path) {
            Identity::Participant(participant)
        } else {
            match fetch_participant(directory.as_ref(), &job.path).await {
                Ok(participant) => {
                    cache.insert(&job.path, participant.clone());
                    Identity::Participant(participant)
                }
                Err(e) => {
                    tracing::warn!(path = %job.path, error = %e, "Failed to fetch participant");
                    Identity::Unknown
                }
            }
        };

        let update = RowUpdate {
            ticket: job.ticket,
            identity,
        };
        if job.reply.send(update).is_err() {
            tracing::debug!(path = %job.path, "Row surface detached, dropping update");
        }
    }
    tracing::debug!("Participant fetch worker stopped");
}

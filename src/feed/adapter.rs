// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Binds mood events to recycled feed rows.
//!
//! Rows are rendered synchronously with a placeholder identity. The owner
//! of each event is then taken from the participant cache or fetched in the
//! background; results come back over the adapter's update channel and are
//! applied by `apply_updates` on the caller's thread.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::feed::emotion::{color, emoticon, MoodColor};
use crate::models::{MoodEvent, Participant};
use crate::services::participant_loader::{
    Identity, ParticipantLoader, Resolution, RowTicket, RowUpdate, RowUpdateSender,
};
use crate::time_utils::format_time_ago;

/// Username shown while the owner is being resolved.
pub const LOADING_LABEL: &str = "Loading...";
/// Username shown when the owner cannot be resolved.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Profile image for a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Default,
    /// Decoded image bytes
    Picture(Vec<u8>),
}

/// View-model of one feed row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub username: String,
    pub avatar: Avatar,
    pub reason: String,
    /// Relative time label; empty when the event has no timestamp yet
    pub date: String,
    pub emoticon: &'static str,
    pub color: MoodColor,
    pub event_id: Option<String>,
    pub position: usize,
    /// Changes every time the slot is rebound
    pub binding: u64,
}

impl RowView {
    fn placeholder(event: &MoodEvent, position: usize, binding: u64, now: DateTime<Utc>) -> Self {
        Self {
            username: LOADING_LABEL.to_string(),
            avatar: Avatar::Default,
            reason: event.reason.clone(),
            date: event
                .timestamp
                .map(|ts| format_time_ago(ts, now))
                .unwrap_or_default(),
            emoticon: emoticon(event.emotional_state),
            color: color(event.emotional_state),
            event_id: event.id.clone(),
            position,
            binding,
        }
    }

    fn show(&mut self, identity: Identity) {
        match identity {
            Identity::Participant(participant) => self.show_participant(&participant),
            Identity::Unknown => {
                self.username = UNKNOWN_LABEL.to_string();
                self.avatar = Avatar::Default;
            }
        }
    }

    fn show_participant(&mut self, participant: &Participant) {
        self.username = participant.username.clone();
        self.avatar = match participant.decode_profile_picture() {
            Ok(Some(bytes)) => Avatar::Picture(bytes),
            Ok(None) => Avatar::Default,
            Err(e) => {
                tracing::warn!(username = %participant.username, error = %e, "Bad profile picture");
                Avatar::Default
            }
        };
    }
}

/// Feed of mood events rendered into a pool of row slots.
pub struct FeedAdapter {
    events: Vec<MoodEvent>,
    rows: Vec<Option<RowView>>,
    next_binding: u64,
    loader: Arc<ParticipantLoader>,
    updates_tx: RowUpdateSender,
    updates_rx: mpsc::UnboundedReceiver<RowUpdate>,
}

impl FeedAdapter {
    pub fn new(loader: Arc<ParticipantLoader>) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            events: Vec::new(),
            rows: Vec::new(),
            next_binding: 0,
            loader,
            updates_tx,
            updates_rx,
        }
    }

    /// Replace the event window, in display order. Rows keep their slots
    /// and must be rebound by the caller.
    pub fn set_events(&mut self, events: Vec<MoodEvent>) {
        self.events = events;
    }

    pub fn events(&self) -> &[MoodEvent] {
        &self.events
    }

    pub fn event(&self, position: usize) -> Option<&MoodEvent> {
        self.events.get(position)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Bind the event at `position` into row `slot`.
    ///
    /// Returns `None` if there is no event at `position`.
    pub fn bind(&mut self, slot: usize, position: usize, now: DateTime<Utc>) -> Option<&RowView> {
        let event = self.events.get(position)?;

        self.next_binding += 1;
        let binding = self.next_binding;
        let mut row = RowView::placeholder(event, position, binding, now);

        let ticket = RowTicket { slot, binding };
        match self.loader.resolve(event, ticket, &self.updates_tx) {
            Resolution::Unknown => row.show(Identity::Unknown),
            Resolution::Cached(participant) => row.show_participant(&participant),
            Resolution::Pending => {}
        }

        if self.rows.len() <= slot {
            self.rows.resize(slot + 1, None);
        }
        self.rows[slot] = Some(row);
        self.rows[slot].as_ref()
    }

    pub fn row(&self, slot: usize) -> Option<&RowView> {
        self.rows.get(slot).and_then(Option::as_ref)
    }

    /// Apply every update received so far. Returns how many changed a row.
    pub fn apply_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            if self.apply(update) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for at least one update, then apply everything pending.
    ///
    /// Returns how many updates changed a row.
    pub async fn wait_for_update(&mut self) -> usize {
        let Some(first) = self.updates_rx.recv().await else {
            return 0;
        };
        let applied = usize::from(self.apply(first));
        applied + self.apply_updates()
    }

    fn apply(&mut self, update: RowUpdate) -> bool {
        let ticket = update.ticket;
        match self.rows.get_mut(ticket.slot).and_then(Option::as_mut) {
            Some(row) if row.binding == ticket.binding => {
                row.show(update.identity);
                true
            }
            _ => {
                tracing::debug!(slot = ticket.slot, "Dropping update for rebound row");
                false
            }
        }
    }
}

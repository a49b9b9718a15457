// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - repository, participant resolution, identity and local state.

pub mod event_repository;
pub mod identity;
pub mod participant_cache;
pub mod participant_loader;
pub mod preferences;

pub use event_repository::EventRepository;
pub use identity::{AuthResult, AuthUser, FirebaseAuthClient, IdentityProvider};
pub use participant_cache::{CacheStatsSnapshot, ParticipantCache};
pub use participant_loader::{
    Identity, ParticipantLoader, Resolution, RowTicket, RowUpdate, RowUpdateSender,
};
pub use preferences::{FilePreferences, MemoryPreferences, Preferences, USERNAME_KEY};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed rendering: row view-models and emotion presentation.

pub mod adapter;
pub mod emotion;

pub use adapter::{Avatar, FeedAdapter, RowView, LOADING_LABEL, UNKNOWN_LABEL};
pub use emotion::{color, emoticon, MoodColor};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emoticon and colour for each emotional state.

use std::fmt;

use crate::models::EmotionalState;

/// Shown for states without an emoticon of their own.
pub const UNKNOWN_EMOTICON: &str = "❓";

pub fn emoticon(state: EmotionalState) -> &'static str {
    match state {
        EmotionalState::Happy => "😃",
        EmotionalState::Sad => "😢",
        EmotionalState::Angry => "😡",
        EmotionalState::Anxious => "😰",
        EmotionalState::Neutral => "😐",
        EmotionalState::Confused => "😕",
        EmotionalState::Fearful => "😨",
        EmotionalState::Shameful => "😞",
        EmotionalState::Surprised => "😲",
        EmotionalState::None => UNKNOWN_EMOTICON,
    }
}

/// Row background colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoodColor {
    Happy,
    Sad,
    Angry,
    Anxious,
    Neutral,
    Confused,
    Fearful,
    Shameful,
    Surprised,
    None,
}

impl MoodColor {
    /// Name of the colour resource in the client theme.
    pub fn resource_name(self) -> &'static str {
        match self {
            MoodColor::Happy => "happyColor",
            MoodColor::Sad => "sadColor",
            MoodColor::Angry => "angryColor",
            MoodColor::Anxious => "anxiousColor",
            MoodColor::Neutral => "neutralColor",
            MoodColor::Confused => "confusedColor",
            MoodColor::Fearful => "fearfulColor",
            MoodColor::Shameful => "shamefulColor",
            MoodColor::Surprised => "surprisedColor",
            MoodColor::None => "noneColor",
        }
    }
}

impl fmt::Display for MoodColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

pub fn color(state: EmotionalState) -> MoodColor {
    match state {
        EmotionalState::Happy => MoodColor::Happy,
        EmotionalState::Sad => MoodColor::Sad,
        EmotionalState::Angry => MoodColor::Angry,
        EmotionalState::Anxious => MoodColor::Anxious,
        EmotionalState::Neutral => MoodColor::Neutral,
        EmotionalState::Confused => MoodColor::Confused,
        EmotionalState::Fearful => MoodColor::Fearful,
        EmotionalState::Shameful => MoodColor::Shameful,
        EmotionalState::Surprised => MoodColor::Surprised,
        EmotionalState::None => MoodColor::None,
    }
}

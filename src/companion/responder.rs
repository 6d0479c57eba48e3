//! # Response Generator
//!
//! Maps a user utterance to a canned companion reply and an emotion tag.
//!
//! ## Matching rules
//! The lower-cased text is tested for substrings, one keyword category at a
//! time, in a fixed priority order. The first category that matches decides the
//! reply; later categories are never consulted. A message such as
//! "I'm sad and need help" is therefore answered as distress, not as a help
//! request.

use crate::companion::now_timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Expression a client uses to drive the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Thinking,
    Surprised,
}

/// A generated companion reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub text: String,
    pub emotion: Emotion,
    pub timestamp: String,
}

const DISTRESS_WORDS: [&str; 5] = ["sad", "tired", "stressed", "depressed", "lonely"];
const POSITIVE_WORDS: [&str; 5] = ["happy", "good", "great", "excellent", "wonderful"];
const HELP_WORDS: [&str; 4] = ["help", "problem", "issue", "assist"];
const ASTONISHMENT_WORDS: [&str; 4] = ["wow", "amazing", "incredible", "unbelievable"];
const HUMOR_WORDS: [&str; 3] = ["joke", "funny", "laugh"];

/// Words the distress reply may name, in the order they are looked for.
/// Anything else in the distress set is reported as "stressed".
const NAMED_FEELINGS: [&str; 3] = ["sad", "tired", "lonely"];

const POSITIVE_REPLY: &str =
    "That's wonderful to hear! I'm so glad you're feeling positive. Keep up the great energy!";
const HELP_REPLY: &str =
    "I'm here to help you. Can you tell me more about what you need assistance with?";
const ASTONISHMENT_REPLY: &str = "That sounds incredible! Tell me more about it!";
const HUMOR_REPLY: &str = "Why did the astronaut break up with the moon? Because it was just a phase! 😄 But seriously, laughter is great for mental health. How else can I brighten your day?";

/// Which keyword category an utterance fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Carries the feeling named back to the user.
    Distress(&'static str),
    Positive,
    Help,
    Astonishment,
    Humor,
    Unrecognized,
}

fn contains_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|word| haystack.contains(word))
}

/// Classify already lower-cased text.
pub fn classify(lowered: &str) -> Intent {
    if contains_any(lowered, &DISTRESS_WORDS) {
        let feeling = NAMED_FEELINGS
            .iter()
            .copied()
            .find(|word| lowered.contains(word))
            .unwrap_or("stressed");
        Intent::Distress(feeling)
    } else if contains_any(lowered, &POSITIVE_WORDS) {
        Intent::Positive
    } else if contains_any(lowered, &HELP_WORDS) {
        Intent::Help
    } else if contains_any(lowered, &ASTONISHMENT_WORDS) {
        Intent::Astonishment
    } else if contains_any(lowered, &HUMOR_WORDS) {
        Intent::Humor
    } else {
        Intent::Unrecognized
    }
}

/// Produce the companion's reply to `text`.
///
/// `context` is accepted for API compatibility; it does not influence the
/// reply. Never fails, for any input including non-ASCII text.
pub fn generate(text: &str, context: Option<&Value>) -> AiResponse {
    if let Some(context) = context {
        debug!(context = %context, "Chat context supplied");
    }

    let intent = classify(&text.to_lowercase());
    let (reply, emotion) = match intent {
        Intent::Distress(feeling) => (
            format!(
                "I hear that you're feeling {}. I'm here for you. Would you like to talk about it or try some relaxation exercises?",
                feeling
            ),
            Emotion::Sad,
        ),
        Intent::Positive => (POSITIVE_REPLY.to_string(), Emotion::Happy),
        Intent::Help => (HELP_REPLY.to_string(), Emotion::Thinking),
        Intent::Astonishment => (ASTONISHMENT_REPLY.to_string(), Emotion::Surprised),
        Intent::Humor => (HUMOR_REPLY.to_string(), Emotion::Happy),
        Intent::Unrecognized => (
            format!(
                "You said: \"{}\". I'm here to support you. How are you feeling today? Is there anything specific you'd like to talk about?",
                text
            ),
            Emotion::Happy,
        ),
    };

    debug!(?intent, ?emotion, "Generated companion reply");

    AiResponse {
        text: reply,
        emotion,
        timestamp: now_timestamp(),
    }
}

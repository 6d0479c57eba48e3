//! # Transcription Simulator
//!
//! Stand-in for a speech-to-text provider. The audio content is never read;
//! the result is one of a handful of canned phrases with a plausible
//! confidence score.

use crate::companion::random::{choose, RandomSource};
use serde::Serialize;
use tracing::debug;

/// Phrases the simulator can "hear".
pub const SAMPLE_TRANSCRIPTS: [&str; 5] = [
    "I'm feeling a bit stressed today",
    "Everything is going well",
    "I need some help with my tasks",
    "I'm feeling lonely",
    "Can you tell me a joke?",
];

/// Lowest confidence the simulator reports.
pub const MIN_CONFIDENCE: f64 = 0.85;

/// Width of the confidence band above [`MIN_CONFIDENCE`].
pub const CONFIDENCE_SPAN: f64 = 0.14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub confidence: f64,
}

/// "Transcribe" the stored clip named `stored_filename`.
pub fn simulate(stored_filename: &str, random: &dyn RandomSource) -> TranscriptionResult {
    let text = choose(random, &SAMPLE_TRANSCRIPTS)
        .copied()
        .unwrap_or(SAMPLE_TRANSCRIPTS[0]);
    let confidence = MIN_CONFIDENCE + random.next_unit() * CONFIDENCE_SPAN;

    debug!(file = %stored_filename, text, confidence, "Simulated transcription");

    TranscriptionResult {
        text: text.to_string(),
        confidence,
    }
}

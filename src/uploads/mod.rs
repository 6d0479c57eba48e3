//! # Audio Upload Module
//!
//! Handles the fallback path for clients that cannot stream microphone audio:
//! the browser records a clip and uploads it as a file.
//!
//! ## Pipeline:
//! 1. **Store** (`storage`): validate type and size, write the clip to disk
//! 2. **Transcribe**: run the simulated speech-to-text on the stored clip
//! 3. **Respond**: feed the transcript to the response generator
//! 4. **Clean up** (`cleanup`): schedule deletion of the clip

pub mod cleanup;  // One-shot deferred deletion
pub mod storage;  // Validation and persistence

pub use cleanup::CleanupScheduler;
pub use storage::{AudioStore, StoredAudio};

use crate::companion::{self, AiResponse, RandomSource};
use serde::Serialize;

/// Result of a processed upload, as returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub transcription: String,
    pub confidence: f64,
    pub response: AiResponse,
    pub audio_file: String,
}

/// Transcribe a stored clip and generate the companion's reply to it.
pub fn respond_to(stored: &StoredAudio, random: &dyn RandomSource) -> UploadOutcome {
    let transcription = companion::simulate(&stored.filename, random);
    let response = companion::generate(&transcription.text, None);

    UploadOutcome {
        transcription: transcription.text,
        confidence: transcription.confidence,
        response,
        audio_file: stored.filename.clone(),
    }
}

//! # Audio Upload Handler
//!
//! `POST /api/upload-audio` accepts a recorded clip for clients that cannot
//! stream microphone audio, and answers it like a chat message.
//!
//! ## Request:
//! Multipart form data with the clip in a file field named `audio`.
//! Only the first `audio` part is stored. Other parts are read and discarded,
//! and together they may not exceed the upload size limit.
//!
//! ## Response:
//! ```json
//! {
//!   "success": true,
//!   "transcription": "I'm feeling lonely",
//!   "confidence": 0.93,
//!   "response": { "text": "I hear that you're feeling lonely. ...", "emotion": "sad", "timestamp": "..." },
//!   "audioFile": "audio-1735732800000-482913775.webm"
//! }
//! ```
//!
//! ## Errors (all 400):
//! - declared content type not an allowed audio type
//! - clip, or the discarded parts together, larger than the configured limit
//! - no `audio` part in the form

use crate::error::{AppError, AppResult};
use crate::handlers::ok;
use crate::state::AppState;
use crate::uploads::{self, StoredAudio};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::stream::StreamExt;
use tracing::{debug, info, warn};

const AUDIO_FIELD: &str = "audio";

pub async fn upload_audio(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let stored = store_audio_field(&state, &mut payload)
        .await?
        .ok_or_else(AppError::missing_file)?;

    info!(file = %stored.filename, size_bytes = stored.size_bytes, mime = %stored.mime_type, "Audio file received");
    state.record_upload();

    let outcome = uploads::respond_to(&stored, state.random.as_ref());

    // The handle is dropped on purpose: cleanup runs detached.
    state.cleanup.schedule(stored.path.clone());

    Ok(ok(outcome))
}

/// Walk the multipart body, storing the first `audio` part.
///
/// Returns `Ok(None)` when the form had no `audio` part. If the request is
/// rejected after the clip was written, the clip is removed again.
async fn store_audio_field(state: &AppState, payload: &mut Multipart) -> AppResult<Option<StoredAudio>> {
    let mut stored: Option<StoredAudio> = None;

    match walk_fields(state, payload, &mut stored).await {
        Ok(()) => Ok(stored),
        Err(err) => {
            if let Some(audio) = stored {
                if let Err(remove_err) = tokio::fs::remove_file(&audio.path).await {
                    warn!(file = %audio.filename, error = %remove_err, "Failed to remove rejected upload");
                }
            }
            Err(err)
        }
    }
}

async fn walk_fields(
    state: &AppState,
    payload: &mut Multipart,
    stored: &mut Option<StoredAudio>,
) -> AppResult<()> {
    // Everything besides the stored clip shares one budget of the upload limit
    let mut skipped_bytes: u64 = 0;

    while let Some(item) = payload.next().await {
        let mut field: Field = item?;

        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(str::to_string);

        if stored.is_none() && field_name.as_deref() == Some(AUDIO_FIELD) {
            let original_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let declared_mime = field.content_type().map(|mime| mime.essence_str().to_string());

            let audio = state
                .store
                .persist(original_name.as_deref(), declared_mime.as_deref(), &mut field)
                .await?;
            *stored = Some(audio);
        } else {
            debug!(field = ?field_name, "Skipping multipart field");
            while let Some(chunk) = field.next().await {
                skipped_bytes += chunk?.len() as u64;
                if skipped_bytes > state.store.max_bytes() {
                    return Err(AppError::payload_too_large(state.store.max_bytes()));
                }
            }
        }
    }

    Ok(())
}

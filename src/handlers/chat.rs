use crate::companion::{self, now_timestamp, AiResponse};
use crate::error::AppError;
use crate::handlers::ok;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub message: Option<String>,
    /// Opaque client context, passed through to the generator untouched.
    pub context: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub response: AiResponse,
    pub timestamp: String,
}

/// `POST /api/chat`
///
/// ## Request Body:
/// ```json
/// { "message": "I'm feeling tired", "context": { "screen": "home" } }
/// ```
///
/// ## Response:
/// ```json
/// {
///   "success": true,
///   "response": { "text": "I hear that you're feeling tired. ...", "emotion": "sad", "timestamp": "..." },
///   "timestamp": "2025-01-01T12:00:00.000Z"
/// }
/// ```
///
/// A missing, empty or whitespace-only message is a 400.
pub async fn chat(body: web::Json<ChatMessage>) -> Result<HttpResponse, AppError> {
    let ChatMessage { message, context } = body.into_inner();

    let message = message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("Message is required".to_string()))?;

    info!(message = %message, "Chat message received");

    let response = companion::generate(&message, context.as_ref());

    Ok(ok(ChatReply {
        response,
        timestamp: now_timestamp(),
    }))
}

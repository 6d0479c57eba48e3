//! # HTTP Handlers
//!
//! Thin adapters between HTTP and the companion: each handler extracts its
//! input, calls into `companion` / `uploads`, and wraps the result in the
//! `{ "success": true, ... }` envelope.
//!
//! ## Routes (all under `/api`):
//! - `POST /request-microphone` - log an explicit microphone request
//! - `POST /check-microphone` - log a permission check
//! - `POST /upload-audio` - fallback audio upload (multipart field `audio`)
//! - `POST /chat` - text chat
//! - `GET /greeting` - random greeting
//! - `GET /health-metrics` - mock biometric reading

pub mod audio;
pub mod chat;
pub mod companion;
pub mod microphone;

use crate::error::AppError;
use crate::middleware::SafetyNet;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

/// Success envelope: `success: true` followed by the payload's own fields.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub payload: T,
}

/// 200 response carrying `payload` inside the success envelope.
pub fn ok<T: Serialize>(payload: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope {
        success: true,
        payload,
    })
}

/// JSON extractor settings: malformed bodies become 400 envelopes.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid JSON body: {}", err)).into()
    })
}

/// Register the companion API routes.
///
/// Every resource carries its own [`SafetyNet`]; see that middleware for why
/// it cannot wrap the scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .service(
                web::resource("/request-microphone")
                    .wrap(SafetyNet)
                    .route(web::post().to(microphone::request_microphone)),
            )
            .service(
                web::resource("/check-microphone")
                    .wrap(SafetyNet)
                    .route(web::post().to(microphone::check_microphone)),
            )
            .service(
                web::resource("/upload-audio")
                    .wrap(SafetyNet)
                    .route(web::post().to(audio::upload_audio)),
            )
            .service(web::resource("/chat").wrap(SafetyNet).route(web::post().to(chat::chat)))
            .service(
                web::resource("/greeting")
                    .wrap(SafetyNet)
                    .route(web::get().to(companion::greeting)),
            )
            .service(
                web::resource("/health-metrics")
                    .wrap(SafetyNet)
                    .route(web::get().to(companion::health_metrics)),
            ),
    );
}

/// Default service for unknown routes.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    tracing::debug!(method = %req.method(), path = %req.path(), "No route matched");
    Err(AppError::NotFound("Not found".to_string()))
}


#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[derive(Serialize)]
    struct Payload {
        message: &'static str,
    }

    #[actix_web::test]
    async fn test_envelope_flattens_payload() {
        let value = serde_json::to_value(Envelope {
            success: true,
            payload: Payload { message: "hi" },
        })
        .unwrap();
        assert_eq!(value, json!({"success": true, "message": "hi"}));
    }

    #[actix_web::test]
    async fn test_unknown_route_is_404_envelope() {
        let app = test::init_service(
            App::new().configure(configure).default_service(web::to(not_found)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"success": false, "error": "Not found"}));
    }
}

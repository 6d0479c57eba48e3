//! Microphone permission events.
//!
//! The browser owns the actual permission prompt; these endpoints only record
//! what the client reports so usage can be followed in the server log. Both
//! accept a missing or unparsable body.

use crate::error::AppError;
use crate::handlers::ok;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicrophoneRequest {
    /// Any JSON value; clients send strings or numeric ids.
    pub user_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCheck {
    /// Whatever the browser reported ("granted", "denied", "prompt", ...).
    pub permission_status: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MicrophoneLogged {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionLogged {
    pub message: &'static str,
    /// The upload endpoint is always available when live capture is not.
    pub fallback_available: bool,
}

fn describe(value: Option<&Value>, missing: &str) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None => missing.to_string(),
        Some(Value::String(_)) => missing.to_string(),
        Some(other) => other.to_string(),
    }
}

/// `POST /api/request-microphone`
pub async fn request_microphone(
    body: Option<web::Json<MicrophoneRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = body.map(web::Json::into_inner).unwrap_or_default();
    let user = describe(request.user_id.as_ref(), "anonymous");

    info!(user = %user, "Microphone access requested");

    Ok(ok(MicrophoneLogged {
        message: "Microphone request logged.",
    }))
}

/// `POST /api/check-microphone`
pub async fn check_microphone(
    body: Option<web::Json<PermissionCheck>>,
) -> Result<HttpResponse, AppError> {
    let check = body.map(web::Json::into_inner).unwrap_or_default();
    let status = describe(check.permission_status.as_ref(), "unknown");

    info!(permission_status = %status, "Microphone permission check");

    Ok(ok(PermissionLogged {
        message: "Permission status logged",
        fallback_available: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::configure;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_request_microphone_logs_and_succeeds() {
        let app = test::init_service(App::new().configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/request-microphone")
            .set_json(json!({"userId": "astronaut-7"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"success": true, "message": "Microphone request logged."}));

        // No body at all is still fine.
        let req = test::TestRequest::post().uri("/api/request-microphone").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_check_microphone_reports_fallback() {
        let app = test::init_service(App::new().configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/check-microphone")
            .set_json(json!({"permissionStatus": "denied"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Permission status logged");
        assert_eq!(body["fallbackAvailable"], true);
    }

    #[actix_web::test]
    async fn test_describe() {
        assert_eq!(describe(None, "anonymous"), "anonymous");
        assert_eq!(describe(Some(&json!("")), "anonymous"), "anonymous");
        assert_eq!(describe(Some(&json!("u1")), "anonymous"), "u1");
        assert_eq!(describe(Some(&json!(42)), "anonymous"), "42");
    }
}

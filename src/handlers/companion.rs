use crate::companion::{pick_greeting, vitals, Greeting, HealthMetrics};
use crate::error::AppError;
use crate::handlers::ok;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct GreetingReply {
    pub greeting: Greeting,
}

#[derive(Debug, Serialize)]
pub struct MetricsReply {
    pub metrics: HealthMetrics,
}

/// `GET /api/greeting`
pub async fn greeting(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let greeting = pick_greeting(state.random.as_ref());
    debug!(text = %greeting.text, "Greeting selected");
    Ok(ok(GreetingReply { greeting }))
}

/// `GET /api/health-metrics`
///
/// Mock biometrics for the dashboard; freshly randomized on every call.
pub async fn health_metrics(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let metrics = vitals::sample(state.random.as_ref());
    Ok(ok(MetricsReply { metrics }))
}

#[cfg(test)]
mod tests {
    use crate::companion::greeting::GREETINGS;
    use crate::companion::random::{FixedRandom, ThreadRandom};
    use crate::handlers::{configure, test_support::state_in};
    use actix_web::{test, web, App};
    use serde_json::Value;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[actix_web::test]
    async fn test_greetings_come_from_fixed_set() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp, Arc::new(ThreadRandom));
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

        for _ in 0..30 {
            let req = test::TestRequest::get().uri("/api/greeting").to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["greeting"]["emotion"], "happy");
            let text = body["greeting"]["text"].as_str().unwrap();
            assert!(GREETINGS.contains(&text), "unexpected greeting: {text}");
        }
    }

    #[actix_web::test]
    async fn test_greeting_is_deterministic_with_fixed_source() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp, Arc::new(FixedRandom(0.5)));
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/greeting").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["greeting"]["text"], GREETINGS[1]);
    }

    #[actix_web::test]
    async fn test_health_metrics_in_range() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp, Arc::new(ThreadRandom));
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

        for _ in 0..30 {
            let req = test::TestRequest::get().uri("/api/health-metrics").to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["success"], true);

            let metrics = &body["metrics"];
            let heart_rate = metrics["heartRate"].as_u64().unwrap();
            let blood_oxygen = metrics["bloodOxygen"].as_u64().unwrap();
            let body_temp: f64 = metrics["bodyTemp"].as_str().unwrap().parse().unwrap();
            let sleep_hours: f64 = metrics["sleepHours"].as_str().unwrap().parse().unwrap();

            assert!((68..=79).contains(&heart_rate));
            assert!((96..=98).contains(&blood_oxygen));
            assert!((36.4..=37.2).contains(&body_temp));
            assert!((6.5..=8.5).contains(&sleep_hours));
            assert!(metrics["timestamp"].is_string());
        }
    }
}

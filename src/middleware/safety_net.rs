//! # Catch-all Error Stage
//!
//! Handlers convert their own failures into `AppError` responses. This
//! middleware covers whatever slips past them:
//! - a panic while a handler runs becomes a 500 envelope instead of a dropped connection
//! - a service-level error with a 5xx status is replaced by the generic 500 envelope
//!
//! Either way the client receives `{ "success": false, "error": "Internal server error" }`.
//!
//! ## Placement
//! Wrap resources, not the `App` or a scope: `web::resource(..).wrap(SafetyNet)`.
//! The net keeps a handle on the request for the fallback response, and
//! app/scope routing needs sole ownership of the request while it matches.
//! By the time a resource's middleware runs, matching is done.

use crate::error::{ErrorEnvelope, GENERIC_INTERNAL_MESSAGE};
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::{
    any::Any,
    future::{ready, Ready},
    panic::{self, AssertUnwindSafe},
};
use tracing::error;

pub struct SafetyNet;

impl<S, B> Transform<S, ServiceRequest> for SafetyNet
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SafetyNetMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SafetyNetMiddleware { service }))
    }
}

pub struct SafetyNetMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for SafetyNetMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let http_req = req.request().clone();

        let fut = match panic::catch_unwind(AssertUnwindSafe(|| self.service.call(req))) {
            Ok(fut) => fut,
            Err(panic) => {
                error!(
                    method = %http_req.method(),
                    uri = %http_req.uri(),
                    panic = %panic_message(panic.as_ref()),
                    "Service panicked before handling the request"
                );
                let response = ServiceResponse::new(http_req, internal_error_response());
                return Box::pin(async move { Ok(response.map_into_right_body()) });
            }
        };

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(response)) => Ok(response.map_into_left_body()),
                Ok(Err(err)) => {
                    let response = err.error_response();
                    if response.status().is_server_error() {
                        error!(
                            method = %http_req.method(),
                            uri = %http_req.uri(),
                            error = %err,
                            "Unhandled service error"
                        );
                        Ok(ServiceResponse::new(http_req, internal_error_response()).map_into_right_body())
                    } else {
                        Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                    }
                }
                Err(panic) => {
                    error!(
                        method = %http_req.method(),
                        uri = %http_req.uri(),
                        panic = %panic_message(panic.as_ref()),
                        "Handler panicked"
                    );
                    Ok(ServiceResponse::new(http_req, internal_error_response()).map_into_right_body())
                }
            }
        })
    }
}

fn internal_error_response() -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorEnvelope::new(GENERIC_INTERNAL_MESSAGE))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::Value;

    async fn boom() -> HttpResponse {
        panic!("simulated handler bug");
    }

    #[actix_web::test]
    async fn test_panicking_handler_becomes_500_envelope() {
        let app = test::init_service(
            App::new().service(web::resource("/boom").wrap(SafetyNet).route(web::get().to(boom))),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/boom").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], GENERIC_INTERNAL_MESSAGE);
    }

    #[actix_web::test]
    async fn test_normal_responses_pass_through() {
        let app = test::init_service(
            App::new().service(
                web::resource("/ok")
                    .wrap(SafetyNet)
                    .route(web::get().to(|| async { HttpResponse::Ok().body("fine") })),
            ),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/ok").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, web::Bytes::from_static(b"fine"));
    }
}

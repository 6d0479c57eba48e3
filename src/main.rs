//! # Companion Backend - Main Application Entry Point
//!
//! HTTP backend for the voice companion "Khushi". The browser client talks to
//! it for chat replies, greetings, mock health readings, microphone permission
//! logging and the audio upload fallback.
//!
//! ## Key Rust Concepts Used:
//! - **async/await**: every handler and the server itself run on the actix runtime
//! - **modules**: one concern per module (mod statements below)
//! - **Result<T, E>**: startup failures propagate out of `main` with `?`
//! - **Arc & RwLock**: shared state and metrics across worker threads
//! - **trait objects**: randomness is injected as `Arc<dyn RandomSource>`
//!
//! ## Application Architecture:
//! - **config**: defaults, optional `config.toml`, `APP_*` environment overrides
//! - **state**: shared state (config, random source, upload store, metrics)
//! - **companion**: the reply generator, greetings, mock transcription, vitals
//! - **uploads**: audio file storage and delayed cleanup
//! - **handlers**: the `/api/*` endpoints
//! - **health**: service liveness and per-endpoint metrics
//! - **middleware**: request ids, metrics, last-resort error handling
//! - **error**: the `{ "success": false, "error": ... }` error responses

mod companion;  // Reply generation and mock data (companion/ directory)
mod config;     // Configuration management (config.rs)
mod error;      // Error handling types (error.rs)
mod handlers;   // HTTP request handlers (handlers/ directory)
mod health;     // Service health endpoints (health.rs)
mod middleware; // Custom middleware (middleware/ directory)
mod state;      // Application state management (state.rs)
mod uploads;    // Audio upload storage and cleanup (uploads/ directory)

use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::Logger,
    web, App, HttpServer,
};
use anyhow::Result;
use crate::config::AppConfig;
use crate::middleware::SafetyNet;
use crate::state::AppState;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The main application entry point.
///
/// ## What this function does:
/// 1. **Loads configuration** from defaults, `config.toml` and the environment
/// 2. **Sets up logging** with `tracing`
/// 3. **Creates shared application state**, including the upload store
/// 4. **Configures the HTTP server** with middleware and routes
/// 5. **Handles graceful shutdown** on SIGINT / SIGTERM
///
/// Any startup failure (bad config, port in use) is returned as an error and
/// the process exits non-zero.
#[actix_web::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!(
        upload_dir = %config.uploads.dir,
        max_file_size_bytes = config.uploads.max_file_size_bytes,
        cleanup_delay_ms = config.uploads.cleanup_delay_ms,
        seeded = config.companion.random_seed.is_some(),
        "Configuration loaded"
    );

    let app_state = AppState::new(config.clone());
    let bind_addr = config.bind_addr();

    info!("Khushi backend listening on http://{}", bind_addr);
    info!("Available endpoints:");
    info!("  POST /api/request-microphone");
    info!("  POST /api/check-microphone");
    info!("  POST /api/upload-audio");
    info!("  POST /api/chat");
    info!("  GET  /api/greeting");
    info!("  GET  /api/health-metrics");
    info!("  GET  /health, /metrics");

    let server = HttpServer::new(move || build_app(app_state.clone()))
        .bind(&bind_addr)?
        .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task error: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Build the application: shared state, middleware chain and every route.
///
/// ## Middleware (outermost first):
/// CORS → access log → request logging → metrics, then a `SafetyNet` on each
/// resource once routing has matched it.
fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let cors = Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    App::new()
        .app_data(web::Data::new(state))
        // Registered innermost first; responses pass back out in reverse
        .wrap(middleware::MetricsMiddleware)
        .wrap(middleware::RequestLogging)
        .wrap(Logger::default())
        .wrap(cors)
        .configure(handlers::configure)
        .service(
            web::resource("/health")
                .wrap(SafetyNet)
                .route(web::get().to(health::health_check)),
        )
        .service(
            web::resource("/metrics")
                .wrap(SafetyNet)
                .route(web::get().to(health::detailed_metrics)),
        )
        .default_service(web::to(handlers::not_found))
}

/// Initialize the tracing (logging) system.
///
/// ## Environment Variables:
/// - `RUST_LOG`: log filter, e.g. "debug" or "companion_backend=trace"
/// - If not set, defaults to "companion_backend=debug,actix_web=info"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "companion_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Resolve when the process receives SIGINT or SIGTERM.
///
/// If the Unix signal handlers cannot be installed, falls back to Ctrl+C only.
#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Failed to install signal handlers ({}), falling back to Ctrl+C", e);
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C"),
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
            // Without a signal source, keep serving until the server exits on its own
            std::future::pending::<()>().await;
        }
    }
}

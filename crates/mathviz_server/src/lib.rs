//! # mathviz_server
//!
//! HTTP surface for the visualization pipeline.
//!
//! | Route | Body | Image |
//! |-------|------|-------|
//! | `POST /video` | JSON `{question, image_url?}` | optional URL |
//! | `POST /v2/video` | multipart `question`, `image_file` | optional upload |
//! | `POST /v3/video` | multipart `question`, `image_file` | required upload |
//! | `GET /health` | | |
//!
//! A successful request answers with the video bytes. Failures answer with
//! JSON `{error, kind, code}`.

pub mod error;
pub mod handlers;
pub mod upload;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use mathviz_core::{ServerConfig, VisualizationPipeline};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ErrorResponse, ServerError, ServerResult};
pub use handlers::{HealthResponse, VideoRequest, INVOCATION_ID_HEADER, SCENE_CLASS_HEADER};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<VisualizationPipeline>,
    pub started: Instant,
}

impl AppState {
    pub fn new(pipeline: VisualizationPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            started: Instant::now(),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, config: &ServerConfig) -> ServerResult<Router> {
    let cors = cors_layer(&config.allowed_origins)?;

    Ok(Router::new()
        .route("/health", get(handlers::health))
        .route("/video", post(handlers::video_json))
        .route("/v2/video", post(handlers::video_upload))
        .route("/v3/video", post(handlers::video_upload_required))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// CORS for the configured origins. `*` allows any origin without credentials.
pub fn cors_layer(origins: &[String]) -> ServerResult<CorsLayer> {
    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| ServerError::Config(format!("Invalid CORS origin '{}': {}", o, e)))
        })
        .collect::<ServerResult<Vec<_>>>()?;

    // Credentials rule out wildcards, so methods and headers mirror the request.
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, config: &ServerConfig) -> ServerResult<()> {
    let app = router(state, config)?;
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;

    info!("mathviz server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("mathviz server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}

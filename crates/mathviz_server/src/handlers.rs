//! Route handlers.

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use mathviz_core::{ImageSource, VisualizationOutput, VisualizationRequest};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::upload::{read_form, video_content_type};
use crate::AppState;

pub const SCENE_CLASS_HEADER: &str = "x-scene-class";
pub const INVOCATION_ID_HEADER: &str = "x-invocation-id";

/// JSON body of `POST /video`.
#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    pub question: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service_name: String,
    pub uptime_seconds: u64,
    pub output_dir: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        service_name: "mathviz".to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
        output_dir: state.pipeline.output_dir().display().to_string(),
    })
}

/// `POST /video`
pub async fn video_json(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ServerResult<Response> {
    let Json(body) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let mut request = VisualizationRequest::new(body.question);
    if let Some(url) = body.image_url.filter(|u| !u.trim().is_empty()) {
        request = request.with_image(ImageSource::Url(url));
    }
    generate(&state, request).await
}

/// `POST /v2/video`, image optional.
pub async fn video_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Response> {
    let request = read_form(multipart).await?;
    generate(&state, request).await
}

/// `POST /v3/video`, image required.
pub async fn video_upload_required(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Response> {
    let request = read_form(multipart).await?;
    if request.image.is_none() {
        return Err(ServerError::BadRequest(
            "Missing 'image_file' field".to_string(),
        ));
    }
    generate(&state, request).await
}

async fn generate(state: &AppState, request: VisualizationRequest) -> ServerResult<Response> {
    info!(
        has_image = request.image.is_some(),
        "Video requested for question: {}", request.question
    );
    let output = state.pipeline.run(request).await?;
    video_response(output)
}

fn video_response(output: VisualizationOutput) -> ServerResult<Response> {
    let file_name = output
        .video_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| output.scene_class.clone());
    let extension = output
        .video_path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();

    let size = output.video.len();
    let mut response = (StatusCode::OK, output.video).into_response();
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(video_content_type(&extension)),
    );
    headers.insert(
        CONTENT_DISPOSITION,
        header_value(&format!("inline; filename=\"{}\"", file_name))?,
    );
    headers.insert(
        HeaderName::from_static(SCENE_CLASS_HEADER),
        header_value(&output.scene_class)?,
    );
    headers.insert(
        HeaderName::from_static(INVOCATION_ID_HEADER),
        header_value(&output.invocation_id.to_string())?,
    );

    info!(
        "Serving {} ({} bytes) for invocation {}",
        file_name, size, output.invocation_id
    );
    Ok(response)
}

fn header_value(value: &str) -> ServerResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ServerError::Internal(format!("Invalid header value '{}': {}", value, e)))
}

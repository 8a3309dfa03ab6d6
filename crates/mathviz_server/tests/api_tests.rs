//! Router tests against a scripted pipeline.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use mathviz_core::{AppConfig, VisualizationPipeline};
use mathviz_llm::{ImageInput, MockModel, MockReply};
use mathviz_render::{MockRenderResponse, MockRenderer};
use mathviz_server::{router, AppState, INVOCATION_ID_HEADER, SCENE_CLASS_HEADER};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const BOUNDARY: &str = "mathvizboundary";

const SCENE_REPLY: &str = r#"{"manim_code": "from manim import *\n\nclass MotionDemo(Scene):\n    def construct(self):\n        pass\n", "description": "Motion along a line.", "scene_class": "MotionDemo"}"#;

struct Harness {
    _temp: TempDir,
    app: Router,
    model: MockModel,
    renderer: MockRenderer,
}

fn harness(model: MockModel, renderer: MockRenderer) -> Harness {
    let temp = tempdir().unwrap();
    let mut config = AppConfig::default();
    config.pipeline.output_dir = temp.path().join("output_videos");

    let pipeline = VisualizationPipeline::new(
        &config,
        Arc::new(model.clone()),
        Arc::new(renderer.clone()),
    )
    .unwrap();
    let app = router(AppState::new(pipeline), &config.server).unwrap();

    Harness {
        _temp: temp,
        app,
        model,
        renderer,
    }
}

fn happy_harness() -> Harness {
    harness(
        MockModel::new().reply("draft").reply(SCENE_REPLY),
        MockRenderer::new()
            .add_response(MockRenderResponse::success("").with_artifact("MotionDemo.mp4")),
    )
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, question: Option<&str>, image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    if let Some(question) = question {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"question\"\r\n\r\n{}\r\n",
                BOUNDARY, question
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image_file\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = happy_harness();
    let response = h
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["healthy"], true);
    assert_eq!(body["service_name"], "mathviz");
}

#[tokio::test]
async fn test_video_returns_rendered_bytes() {
    let h = happy_harness();
    let response = h
        .app
        .oneshot(json_request(
            "/video",
            json!({"question": "Explain 1D motion in physics"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[SCENE_CLASS_HEADER], "MotionDemo");
    assert!(headers.contains_key(INVOCATION_ID_HEADER));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"mock video");
    assert_eq!(h.renderer.call_count(), 1);
}

#[tokio::test]
async fn test_video_forwards_image_url() {
    let h = happy_harness();
    let response = h
        .app
        .oneshot(json_request(
            "/video",
            json!({"question": "Explain this", "image_url": "https://example.com/plot.png"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let images = &h.model.requests()[0].messages[0].images;
    assert_eq!(
        images,
        &vec![ImageInput::Url("https://example.com/plot.png".to_string())]
    );
}

#[tokio::test]
async fn test_empty_question_is_bad_request() {
    let h = happy_harness();
    let response = h
        .app
        .oneshot(json_request("/video", json!({"question": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "invalid_request");
    assert_eq!(body["code"], 400);
    assert_eq!(h.model.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let h = happy_harness();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/video")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = h.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "bad_request");
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let h = harness(
        MockModel::new().push(MockReply::failure(500, "overloaded")),
        MockRenderer::new(),
    );
    let response = h
        .app
        .oneshot(json_request("/video", json!({"question": "q"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["kind"], "upstream_error");
}

#[tokio::test]
async fn test_render_failure_is_unprocessable() {
    let h = harness(
        MockModel::new().reply("draft").reply(SCENE_REPLY),
        MockRenderer::new().add_response(MockRenderResponse::failure(1, "LaTeX Error")),
    );
    let response = h
        .app
        .oneshot(json_request("/video", json!({"question": "q"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "render_failed");
    assert_eq!(h.renderer.call_count(), 2);
}

#[tokio::test]
async fn test_upload_with_image() {
    let h = happy_harness();
    let response = h
        .app
        .oneshot(multipart_request(
            "/v2/video",
            Some("Explain this triangle"),
            Some(("triangle.png", &[137, 80, 78, 71])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let requests = h.model.requests();
    assert_eq!(
        requests[0].messages[0].images,
        vec![ImageInput::Inline {
            media_type: "image/png".to_string(),
            data: vec![137, 80, 78, 71],
        }]
    );
}

#[tokio::test]
async fn test_upload_without_image_allowed_on_v2() {
    let h = happy_harness();
    let response = h
        .app
        .oneshot(multipart_request("/v2/video", Some("Explain motion"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.model.requests()[0].messages[0].images.is_empty());
}

#[tokio::test]
async fn test_v3_requires_image() {
    let h = happy_harness();
    let response = h
        .app
        .oneshot(multipart_request("/v3/video", Some("Explain motion"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "bad_request");
    assert_eq!(h.model.call_count(), 0);
}

#[tokio::test]
async fn test_multipart_missing_question() {
    let h = happy_harness();
    let response = h
        .app
        .oneshot(multipart_request("/v3/video", None, Some(("a.png", b"png"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let h = happy_harness();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/video")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = h.app.oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

//! In-process tests of the HTTP routes.

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD,
    CONTENT_TYPE, HOST, ORIGIN,
};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wavecalc_config::Config;
use wavecalc_web::router::build_router;
use wavecalc_web::state::AppState;

fn app() -> Router {
    build_router(AppState::new(Config::default()))
}

async fn post_compute(body: &str) -> Response {
    app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/compute")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(uri: &str) -> Response {
    app()
        .oneshot(Request::builder().uri(uri).header(HOST, "localhost:8000").body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn compute_multiplies() {
    let response = post_compute(r#"{"value": 3, "multiplier": 4}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "result": 12.0 }));
}

#[tokio::test]
async fn compute_handles_fractions_and_negatives() {
    for (value, multiplier) in [(1.5, -2.0), (-0.25, -8.0), (0.1, 0.2), (1e10, 3.0)] {
        let body = json!({ "value": value, "multiplier": multiplier }).to_string();
        let response = post_compute(&body).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["result"].as_f64(), Some(value * multiplier));
    }
}

#[tokio::test]
async fn compute_rejects_schema_violations() {
    for body in [
        r#"{"value": 3}"#,
        r#"{"multiplier": 4}"#,
        r#"{"value": "three", "multiplier": 4}"#,
        r#"{"value": null, "multiplier": 4}"#,
        r#"{"value": 3, "multiplier": "#,
    ] {
        let response = post_compute(body).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
        assert!(body_json(response).await["detail"].is_string());
    }
}

#[tokio::test]
async fn compute_rejects_overflow() {
    let response = post_compute(r#"{"value": 1e200, "multiplier": 1e200}"#).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn compute_requires_json_content_type() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/compute")
                .body(Body::from(r#"{"value": 3, "multiplier": 4}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_route_reports_working() {
    let response = get("/test/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "message": "API is working!" }));
}

#[tokio::test]
async fn health_is_ok() {
    let response = get("/health").await;
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn panel_page_embeds_autoload_script() {
    let response = get("/panel/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<title>Test Pipeline</title>"));
    assert!(html.contains(r#"src="http://localhost:8000/panel-test/autoload.js""#));
}

#[tokio::test]
async fn session_fragment_renders_pipeline() {
    let response = get("/panel-test").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"data-param="value""#));
    assert!(html.contains(r#"data-param="multiplier""#));
    assert!(html.contains("width:350px"));
}

#[tokio::test]
async fn autoload_script_targets_session_socket() {
    let response = get("/panel-test/autoload.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/javascript"));
    let script = body_text(response).await;
    assert!(script.contains(r#""/panel-test/ws""#));
}

#[tokio::test]
async fn wave_fragment_renders_sliders_and_plot() {
    let html = body_text(get("/wave-test").await).await;
    assert!(html.contains("Interactive Sine Wave"));
    assert_eq!(html.matches(r#"type="range""#).count(), 3);
    assert!(html.contains("<svg"));
}

#[tokio::test]
async fn configured_app_name_moves_session_routes() {
    let mut config = Config::default();
    config.panel.app_name = "pipeline".to_string();
    let response = build_router(AppState::new(config))
        .oneshot(Request::builder().uri("/pipeline/autoload.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cors_allows_configured_origin_with_credentials() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/compute")
                .header(ORIGIN, "http://localhost:3000")
                .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn cors_ignores_other_origins() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/compute")
                .header(ORIGIN, "http://evil.test")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"value": 1, "multiplier": 2}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

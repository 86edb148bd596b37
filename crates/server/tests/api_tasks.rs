use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine;
use serde_json::{json, Value};
use server::config::{BasicAuth, ServerConfig};
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_app(dir: &TempDir) -> Router {
    let mut config = ServerConfig::with_base_dir(dir.path());
    config.auth = Some(BasicAuth {
        user: "admin".to_string(),
        pass: "secret".to_string(),
    });
    let state = server::build_state(config).await.unwrap();
    server::app(state)
}

fn basic(user: &str, pass: &str) -> String {
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"))
    )
}

fn get_tasks(auth: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri("/api/tasks");
    if let Some(auth) = auth {
        req = req.header(header::AUTHORIZATION, auth);
    }
    req.body(Body::empty()).unwrap()
}

fn put_tasks(auth: Option<&str>, body: &str) -> Request<Body> {
    let mut req = Request::builder()
        .method("PUT")
        .uri("/api/tasks")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        req = req.header(header::AUTHORIZATION, auth);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_put_then_get_roundtrip() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;
    let auth = basic("admin", "secret");

    let doc = json!([{"id": 1, "title": "x", "done": false}]);
    let resp = app
        .clone()
        .oneshot(put_tasks(Some(&auth), &doc.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"status": "saved"}));

    let resp = app.oneshot(get_tasks(Some(&auth))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_json(resp).await, doc);
}

#[tokio::test]
async fn test_missing_credentials_rejected_and_store_untouched() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let resp = app
        .clone()
        .oneshot(put_tasks(None, "[]"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    assert!(!dir.path().join("data/tasks.json").exists());

    let resp = app.oneshot(get_tasks(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let resp = app
        .oneshot(get_tasks(Some(&basic("admin", "wrong"))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unconfigured_credentials_fail_closed() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig::with_base_dir(dir.path());
    let state = server::build_state(config).await.unwrap();
    let app = server::app(state);

    // Even well-formed credentials are rejected when none are configured
    let resp = app
        .oneshot(get_tasks(Some(&basic("admin", "secret"))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_preflight_needs_no_credentials() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/tasks")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let allow_methods = resp.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(allow_methods.contains("PUT"));
}

#[tokio::test]
async fn test_get_carries_permissive_cors_header() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;
    let auth = basic("admin", "secret");

    app.clone()
        .oneshot(put_tasks(Some(&auth), "[]"))
        .await
        .unwrap();
    let resp = app.oneshot(get_tasks(Some(&auth))).await.unwrap();
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_malformed_put_leaves_document_unchanged() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;
    let auth = basic("admin", "secret");

    let doc = json!([{"id": 1, "title": "x", "done": false}]);
    app.clone()
        .oneshot(put_tasks(Some(&auth), &doc.to_string()))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(put_tasks(Some(&auth), "{ not json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_json(resp).await.get("error").is_some());

    let resp = app.oneshot(get_tasks(Some(&auth))).await.unwrap();
    assert_eq!(body_json(resp).await, doc);
}

#[tokio::test]
async fn test_get_with_no_document_reports_error_in_body() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    // Nothing has been written yet; the read endpoint still answers 200
    let resp = app
        .oneshot(get_tasks(Some(&basic("admin", "secret"))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await.get("error").is_some());
}

#[tokio::test]
async fn test_static_files_served_behind_auth() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>board</html>").unwrap();
    let app = test_app(&dir).await;

    let req = Request::builder()
        .method("GET")
        .uri("/index.html")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("GET")
        .uri("/index.html")
        .header(header::AUTHORIZATION, basic("admin", "secret"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_directory_without_index_is_not_listed() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    let app = test_app(&dir).await;

    let req = Request::builder()
        .method("GET")
        .uri("/data/")
        .header(header::AUTHORIZATION, basic("admin", "secret"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

//! HTTP surface tests driven through the router in-process
//!
//! Run: `cargo test -p beacon-server --test http`

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use beacon_core::auth::compute_token;
use beacon_core::{StateTable, TokenAuth};
use beacon_server::{router, AppState, SharedState};

fn shared_state() -> SharedState {
    AppState::new(TokenAuth::new("admin", "secret"), StateTable::new(), None).into_shared()
}

fn update(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/update")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn raw_update(body: &str, content_type: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/update");
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn dashboard(auth: Option<&str>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/");
    if let Some(user_pass) = auth {
        let encoded = base64::engine::general_purpose::STANDARD.encode(user_pass);
        builder = builder.header(header::AUTHORIZATION, format!("Basic {}", encoded));
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn update_stores_device() {
    let state = shared_state();

    let resp = router(state.clone())
        .oneshot(update(json!({"data": {"deviceId": "A1", "lat": 1.0, "lng": 2.0}})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"status": "ok"}));

    let s = state.read().await;
    let record = s.table.get("A1").unwrap();
    assert_eq!(record.field("lat"), Some(&json!(1.0)));
    assert_eq!(record.field("lng"), Some(&json!(2.0)));
    assert!(!record.last_update.is_empty());
}

#[tokio::test]
async fn update_accepts_reporter_envelope() {
    let state = shared_state();

    let resp = router(state.clone())
        .oneshot(update(json!({
            "type": "device_info",
            "data": {"deviceId": "phone", "time": 1706000000, "lat": null, "lng": null, "isOnline": true}
        })))
        .await
        .unwrap();

    assert_eq!(body_json(resp).await, json!({"status": "ok"}));
    assert_eq!(
        state.read().await.table.get("phone").unwrap().field("isOnline"),
        Some(&json!(true))
    );
}

#[tokio::test]
async fn update_without_device_id_is_rejected() {
    let state = shared_state();
    router(state.clone())
        .oneshot(update(json!({"data": {"deviceId": "A1"}})))
        .await
        .unwrap();
    let before = state.read().await.table.clone();

    for body in [json!({"data": {}}), json!({}), json!({"data": {"deviceId": "", "lat": 3.0}})] {
        let resp = router(state.clone()).oneshot(update(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({"status": "error", "message": "Missing deviceId"})
        );
    }

    assert_eq!(state.read().await.table, before);
}

#[tokio::test]
async fn update_accepts_any_content_type() {
    let state = shared_state();
    let body = r#"{"data": {"deviceId": "A1", "lat": 1.0}}"#;

    for content_type in [None, Some("text/plain"), Some("application/x-www-form-urlencoded")] {
        let resp = router(state.clone())
            .oneshot(raw_update(body, content_type))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"status": "ok"}));
    }

    assert_eq!(state.read().await.table.len(), 1);
}

#[tokio::test]
async fn update_ignores_non_string_type() {
    let state = shared_state();

    for kind in [json!(1), json!(null), json!({"v": 2}), json!(["device_info"])] {
        let resp = router(state.clone())
            .oneshot(update(json!({"type": kind, "data": {"deviceId": "A1", "battery": 80}})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"status": "ok"}));
    }

    let s = state.read().await;
    assert_eq!(s.table.get("A1").unwrap().field("battery"), Some(&json!(80)));
}

#[tokio::test]
async fn update_with_non_object_data_is_rejected() {
    let state = shared_state();

    for body in [
        json!({"data": null}),
        json!({"data": "A1"}),
        json!({"data": [{"deviceId": "A1"}]}),
        json!({"data": 42}),
        json!([{"deviceId": "A1"}]),
        json!("A1"),
    ] {
        let resp = router(state.clone()).oneshot(update(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({"status": "error", "message": "Missing deviceId"})
        );
    }

    assert!(state.read().await.table.is_empty());
}

#[tokio::test]
async fn update_with_invalid_json_is_a_bad_request() {
    let state = shared_state();

    let resp = router(state.clone())
        .oneshot(raw_update("{\"data\": {", Some("application/json")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(state.read().await.table.is_empty());
}

#[tokio::test]
async fn update_replaces_whole_record() {
    let state = shared_state();

    router(state.clone())
        .oneshot(update(json!({"data": {"deviceId": "A1", "lat": 1.0, "battery": 50}})))
        .await
        .unwrap();
    router(state.clone())
        .oneshot(update(json!({"data": {"deviceId": "A1", "lng": 9.0}})))
        .await
        .unwrap();

    let s = state.read().await;
    assert_eq!(s.table.len(), 1);
    let record = s.table.get("A1").unwrap();
    assert_eq!(record.field("lng"), Some(&json!(9.0)));
    assert!(record.field("lat").is_none());
    assert!(record.field("battery").is_none());
}

#[tokio::test]
async fn dashboard_challenges_anonymous_request() {
    let resp = router(shared_state()).oneshot(dashboard(None, None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"beacon\""
    );
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn dashboard_rejects_wrong_credentials() {
    let resp = router(shared_state())
        .oneshot(dashboard(Some("admin:wrong"), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn dashboard_sets_session_cookie() {
    let resp = router(shared_state())
        .oneshot(dashboard(Some("admin:secret"), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(&format!("token={};", compute_token("admin", "secret"))));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=315360000"));

    let body = body_text(resp).await;
    assert!(body.contains("/ws"));
}

#[tokio::test]
async fn dashboard_accepts_session_cookie() {
    let cookie = format!("token={}", compute_token("admin", "secret"));
    let resp = router(shared_state())
        .oneshot(dashboard(None, Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn dashboard_ignores_invalid_cookie() {
    let resp = router(shared_state())
        .oneshot(dashboard(None, Some("token=forged")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Credentials still work alongside a stale cookie
    let resp = router(shared_state())
        .oneshot(dashboard(Some("admin:secret"), Some("token=forged")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_some());
}

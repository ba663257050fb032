// HTTP surface checks against the assembled router, no upstream traffic.

use axum::body::Body;
use http::{Request, StatusCode};
use tower::util::ServiceExt;

use flashwire::api::{create_router, AppState};
use flashwire::config::Config;

fn router() -> axum::Router {
    let state = AppState::from_config(&Config::default()).expect("state from default config");
    create_router(state)
}

#[tokio::test]
async fn health_answers_ok() {
    let resp = router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), 64).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let resp = router()
        .oneshot(
            Request::builder()
                .uri("/jin10/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_score_segment_is_rejected() {
    // Fails before any upstream fetch, so no network is involved.
    let resp = router()
        .oneshot(
            Request::builder()
                .uri("/wallstreetcn/live/global/abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_preflight_is_permissive() {
    let resp = router()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/health")
                .header("Origin", "https://reader.example")
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.status().is_success());
    assert!(resp
        .headers()
        .contains_key("access-control-allow-origin"));
}

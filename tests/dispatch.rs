//! End-to-end routing through the layered router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;

use upstream_dispatch::config::{ProxyConfig, UpstreamConfig};
use upstream_dispatch::{BuildError, HttpServer};

mod common;

fn server(upstreams: Vec<UpstreamConfig>) -> HttpServer {
    HttpServer::new(ProxyConfig {
        upstreams,
        ..ProxyConfig::default()
    })
    .unwrap()
}

async fn get(server: &HttpServer, uri: &str) -> Response {
    server
        .router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_static_file_and_proxy_routes() {
    let backend = common::start_echo_backend().await;
    let root = common::site_root("mixed");

    let server = server(vec![
        UpstreamConfig::static_response("A", "/static", Some(204)),
        UpstreamConfig::with_uri("B", "/files/", format!("file://{}", root.display())),
        UpstreamConfig::with_uri("C", "/api/", format!("http://{backend}")),
    ]);

    let response = get(&server, "/static").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["gap-upstream-address"], "A");
    assert!(text(response).await.is_empty());

    let response = get(&server, "/files/index.html").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["gap-upstream-address"], "B");
    assert_eq!(text(response).await, "<h1>www</h1>");

    let response = get(&server, "/files/css/site.css").await;
    assert_eq!(text(response).await, "body{}");

    let response = get(&server, "/api/users?page=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["gap-upstream-address"], "C");
    let echoed = text(response).await;
    assert!(echoed.starts_with("GET /api/users?page=2 HTTP/1.1"), "{echoed}");
    assert!(echoed.contains("x-request-id: "), "{echoed}");
    assert!(echoed.contains("x-forwarded-proto: http"), "{echoed}");

    let response = get(&server, "/unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_body_reaches_backend() {
    let backend = common::start_echo_backend().await;
    let server = server(vec![UpstreamConfig::with_uri("C", "/api/", format!("http://{backend}"))]);

    let response = server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/x")
                .header("content-type", "text/plain")
                .header("content-length", "10")
                .body(Body::from("hello-body"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echoed = text(response).await;
    assert!(echoed.starts_with("POST /api/x HTTP/1.1"), "{echoed}");
    assert!(echoed.contains("content-length: 10"), "{echoed}");
    assert!(echoed.ends_with("\n\nhello-body"), "{echoed}");
}

#[tokio::test]
async fn test_accept_header_defaults_to_any() {
    let backend = common::start_echo_backend().await;
    let server = server(vec![UpstreamConfig::with_uri("C", "/api/", format!("http://{backend}"))]);

    let echoed = text(get(&server, "/api/plain").await).await;
    assert!(echoed.contains("accept: */*"), "{echoed}");

    let response = server
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/json")
                .header("accept", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let echoed = text(response).await;
    assert!(echoed.contains("accept: application/json"), "{echoed}");
    assert!(!echoed.contains("*/*"), "{echoed}");
}

#[tokio::test]
async fn test_exact_route_beats_prefix_routes() {
    let server = server(vec![
        UpstreamConfig::static_response("prefix", "/a/", Some(201)),
        UpstreamConfig::static_response("deeper", "/a/b/", Some(202)),
        UpstreamConfig::static_response("exact", "/a/b/c", Some(203)),
    ]);

    assert_eq!(get(&server, "/a/b/c").await.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);
    assert_eq!(get(&server, "/a/b/c/d").await.status(), StatusCode::ACCEPTED);
    assert_eq!(get(&server, "/a/x").await.status(), StatusCode::CREATED);
    assert_eq!(get(&server, "/a").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_backend_down_renders_error_page() {
    let dead = common::closed_port().await;
    let server = server(vec![UpstreamConfig::with_uri("down", "/", format!("http://{dead}"))]);

    let response = server
        .router()
        .oneshot(
            Request::builder()
                .uri("/anything")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.headers()["x-request-id"], "abc-123");
    let page = text(response).await;
    assert!(page.contains("502 Bad Gateway"));
    assert!(page.contains("abc-123"));
}

#[test]
fn test_build_errors_name_the_upstream() {
    let build = |uri: &str| {
        HttpServer::new(ProxyConfig {
            upstreams: vec![
                UpstreamConfig::static_response("fine", "/fine", None),
                UpstreamConfig::with_uri("offender", "/x/", uri),
            ],
            ..ProxyConfig::default()
        })
    };

    match build("not a url") {
        Err(BuildError::InvalidUri { id, .. }) => assert_eq!(id, "offender"),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("build should fail"),
    }

    match build("ftp://mirror.example/pub") {
        Err(err @ BuildError::UnsupportedScheme { .. }) => {
            let msg = err.to_string();
            assert!(msg.contains("offender"));
            assert!(msg.contains("ftp"));
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("build should fail"),
    }
}

// tests/dev_server.rs

use std::fs;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use sitepipe::config::ServeSection;
use sitepipe::server::{DevServer, router};

#[tokio::test]
async fn serves_index_for_directories_and_static_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("css/style.min.css"), "body{}").unwrap();

    let app = router(dir.path());

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<h1>home</h1>");

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/css/style.min.css")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(Request::builder().uri("/missing.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dev_server_binds_the_configured_host() {
    let dir = tempfile::tempdir().unwrap();
    let serve = ServeSection {
        dir: "dist".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        enabled: true,
    };

    let server = DevServer::start(dir.path(), &serve).await.unwrap();
    assert!(server.local_addr().ip().is_loopback());
    assert_ne!(server.local_addr().port(), 0);
    assert_eq!(server.dir(), dir.path().join("dist"));
}

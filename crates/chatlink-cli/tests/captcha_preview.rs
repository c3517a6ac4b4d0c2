//! CAPTCHA preview server over real HTTP

use chatlink_auth::CaptchaSink;
use chatlink_cli::AxumCaptchaSink;
use chatlink_cli::captcha::CAPTCHA_ROUTE;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-body";

#[tokio::test]
async fn test_serves_latest_published_image() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("captcha.png");
    let sink = AxumCaptchaSink::new("127.0.0.1:0".parse().unwrap());

    sink.start().await.unwrap();
    let addr = sink.local_addr().await.unwrap();
    let url = format!("http://{}{}", addr, CAPTCHA_ROUTE);
    let http = reqwest::Client::new();

    let before = http.get(&url).send().await.unwrap();
    assert_eq!(before.status(), reqwest::StatusCode::NOT_FOUND);

    tokio::fs::write(&image, PNG).await.unwrap();
    sink.publish(&image).await.unwrap();

    let response = http.get(&url).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "image/png"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), PNG);

    // A second challenge replaces the first
    tokio::fs::write(&image, b"GIF89a-second").await.unwrap();
    sink.publish(&image).await.unwrap();
    let response = http.get(&url).send().await.unwrap();
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"GIF89a-second");

    sink.stop().await;
    assert!(sink.local_addr().await.is_none());

    let after = reqwest::Client::new().get(&url).send().await;
    assert!(after.is_err());
}

#[tokio::test]
async fn test_restart_after_stop_forgets_image() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("captcha.png");
    tokio::fs::write(&image, PNG).await.unwrap();
    let sink = AxumCaptchaSink::new("127.0.0.1:0".parse().unwrap());

    sink.start().await.unwrap();
    sink.publish(&image).await.unwrap();
    sink.stop().await;

    sink.start().await.unwrap();
    let addr = sink.local_addr().await.unwrap();
    let response = reqwest::get(format!("http://{}{}", addr, CAPTCHA_ROUTE))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    sink.stop().await;
}

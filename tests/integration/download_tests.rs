//! Integration tests for the HTTP downloader
//!
//! These tests use wiremock to serve bodies and delays, and exercise the
//! downloader against a real local socket.

use fetch_webpage::config::DownloaderConfig;
use fetch_webpage::{DownloadError, Downloader, HttpDownloader};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Span;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn downloader(parallelism: Option<usize>) -> HttpDownloader {
    HttpDownloader::new(reqwest::Client::new(), parallelism, Span::none())
}

#[tokio::test]
async fn test_streams_body_into_sink() {
    let mock_server = MockServer::start().await;
    let body: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    Mock::given(method("GET"))
        .and(path("/blob.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    let mut sink: Vec<u8> = Vec::new();
    let written = downloader(Some(1))
        .download(&cancel, &format!("{}/blob.bin", mock_server.uri()), &mut sink)
        .await
        .expect("download should succeed");

    assert_eq!(written, body.len() as u64);
    assert_eq!(sink, body);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    let mut sink: Vec<u8> = Vec::new();
    let err = downloader(None)
        .download(&cancel, &format!("{}/missing.png", mock_server.uri()), &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Status { status: 404, .. }));
    assert!(sink.is_empty(), "error bodies must not reach the sink");
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    // Reserve a port, then close it so nothing is listening there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{}", port);

    let cancel = CancellationToken::new();
    let mut sink: Vec<u8> = Vec::new();
    let err = downloader(Some(2))
        .download(&cancel, &format!("{}/gone", uri), &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Transport { .. }));
    assert!(!err.is_cancelled());
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let config = DownloaderConfig {
        parallelism: None,
        request_timeout_secs: Some(1),
    };
    let downloader = HttpDownloader::from_config(&config, Span::none()).unwrap();

    let cancel = CancellationToken::new();
    let mut sink: Vec<u8> = Vec::new();
    let err = downloader
        .download(&cancel, &mock_server.uri(), &mut sink)
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
}

#[tokio::test]
async fn test_cancellation_interrupts_transfer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&mock_server)
        .await;

    let downloader = downloader(Some(1));
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let mut sink: Vec<u8> = Vec::new();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        downloader.download(&cancel, &mock_server.uri(), &mut sink),
    )
    .await
    .expect("download should stop promptly after cancellation");

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(downloader.limiter().available(), Some(1));
}

#[tokio::test]
async fn test_parallelism_bounds_concurrent_requests() {
    let mock_server = MockServer::start().await;
    let delay = Duration::from_millis(200);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x").set_delay(delay))
        .expect(6)
        .mount(&mock_server)
        .await;

    let downloader = Arc::new(downloader(Some(2)));
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let mut tasks = JoinSet::new();
    for i in 0..6 {
        let downloader = Arc::clone(&downloader);
        let cancel = cancel.clone();
        let url = format!("{}/r{}", mock_server.uri(), i);
        tasks.spawn(async move {
            let mut sink: Vec<u8> = Vec::new();
            downloader.download(&cancel, &url, &mut sink).await
        });
    }

    tokio::time::sleep(delay / 2).await;
    assert_eq!(downloader.limiter().available(), Some(0));

    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().expect("download should succeed");
    }

    // Six requests, two at a time: at least three rounds of the delay
    assert!(
        started.elapsed() >= delay * 3,
        "finished in {:?}, limiter was not respected",
        started.elapsed()
    );
    assert_eq!(downloader.limiter().available(), Some(2));
}

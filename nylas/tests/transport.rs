// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Transport integration tests with wiremock.

use std::time::{Duration, Instant};

use jiff::Timestamp;
use nylas::{CancellationToken, Error, ErrorKind, NylasClient, RateLimit, Request, Response};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct Item {
    id: String,
}

fn client(server: &MockServer, max_retries: u32, retry_wait: Duration) -> NylasClient {
    NylasClient::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .max_retries(max_retries)
        .retry_wait(retry_wait)
        .build()
        .expect("Failed to create client")
}

#[tokio::test]
async fn transport_happy_get_sends_bearer_and_tracks_rate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/grants/g1/messages/msg-456"))
        .and(header("Authorization", "Bearer test-key"))
        .and(header("Accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-RateLimit-Limit", "100")
                .insert_header("X-RateLimit-Remaining", "99")
                .insert_header("X-RateLimit-Reset", "1700000000")
                .set_body_json(json!({
                    "data": { "id": "msg-456", "subject": "Test" },
                    "request_id": "req-1"
                })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 2, Duration::from_millis(1));
    let ctx = CancellationToken::new();
    let resp: Response<Item> = client
        .execute(&ctx, &Request::get("/v3/grants/g1/messages/msg-456"))
        .await
        .expect("Failed to execute request");

    assert_eq!(resp.data.id, "msg-456");
    assert_eq!(resp.request_id, "req-1");

    let rate = client.rate_limit();
    assert_eq!(rate.limit, 100);
    assert_eq!(rate.remaining, 99);
    assert_eq!(
        rate.reset,
        Timestamp::from_second(1_700_000_000).expect("Failed to build timestamp")
    );
}

#[tokio::test]
async fn transport_rate_snapshot_resets_without_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-RateLimit-Limit", "10")
                .insert_header("X-RateLimit-Remaining", "3")
                .set_body_json(json!({ "data": { "id": "a" } })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "b" } })))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0, Duration::from_millis(1));
    let ctx = CancellationToken::new();

    let _: Response<Item> = client
        .execute(&ctx, &Request::get("/limited"))
        .await
        .expect("Failed to execute request");
    assert_eq!(client.rate_limit().remaining, 3);

    let _: Response<Item> = client
        .execute(&ctx, &Request::get("/plain"))
        .await
        .expect("Failed to execute request");
    assert_eq!(client.rate_limit(), RateLimit::default());
}

#[tokio::test]
async fn transport_maps_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/grants/g1/calendars/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("X-Request-Id", "req-77")
                .set_body_json(json!({ "message": "not found", "type": "error" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3, Duration::from_millis(1));
    let err = client
        .execute::<Item>(
            &CancellationToken::new(),
            &Request::get("/v3/grants/g1/calendars/missing"),
        )
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::NotFound));
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.request_id(), Some("req-77"));
    let api = err.api_error().expect("Expected an API error");
    assert_eq!(api.message, "not found");
    assert_eq!(api.error_type.as_deref(), Some("error"));
}

#[tokio::test]
async fn transport_retries_transient_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "x" }, "request_id": "r" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3, Duration::from_millis(1));
    let start = Instant::now();
    let resp: Response<Item> = client
        .execute(&CancellationToken::new(), &Request::get("/flaky"))
        .await
        .expect("Failed to execute request");

    assert_eq!(resp.data.id, "x");
    assert!(start.elapsed() >= Duration::from_millis(3));
}

#[tokio::test]
async fn transport_honors_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "ok" } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3, Duration::from_millis(1));
    let start = Instant::now();
    let resp: Response<Item> = client
        .execute(&CancellationToken::new(), &Request::get("/limited"))
        .await
        .expect("Failed to execute request");

    assert_eq!(resp.data.id, "ok");
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[tokio::test]
async fn transport_zero_retries_makes_one_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0, Duration::from_millis(1));
    let err = client
        .execute::<Item>(&CancellationToken::new(), &Request::get("/down"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.api_error().map(|e| e.message.as_str()), Some("request failed with status 500"));
}

#[tokio::test]
async fn transport_client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "request_id": "r-400",
            "error": { "type": "invalid_request_error", "message": "bad body" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3, Duration::from_millis(1));
    let ctx = CancellationToken::new();

    let req = Request::post("/bad")
        .json(&json!({ "name": "x" }))
        .expect("Failed to encode body");
    let err = client.execute::<Item>(&ctx, &req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(err.request_id(), Some("r-400"));
    assert_eq!(
        err.to_string(),
        "400 bad-request: bad body (request id r-400)"
    );

    let err = client
        .execute::<Item>(&ctx, &Request::get("/forbidden"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OtherHttp);
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn transport_exhausted_retries_surface_last_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/unavailable"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 2, Duration::from_millis(1));
    let err = client
        .execute::<Item>(&CancellationToken::new(), &Request::get("/unavailable"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn transport_strips_trailing_slash_from_base() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/grants/g1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "g1" } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NylasClient::builder()
        .api_key("test-key")
        .base_url(format!("{}/", mock_server.uri()))
        .build()
        .expect("Failed to create client");
    assert_eq!(client.base_url(), mock_server.uri());

    let resp: Response<Item> = client
        .execute(&CancellationToken::new(), &Request::get("/v3/grants/g1"))
        .await
        .expect("Failed to execute request");
    assert_eq!(resp.data.id, "g1");
}

#[tokio::test]
async fn transport_missing_credential_issues_no_request() {
    let mock_server = MockServer::start().await;

    let err = NylasClient::builder()
        .base_url(mock_server.uri())
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingCredential);

    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn transport_cancelled_before_send() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "a" } })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 2, Duration::from_millis(1));
    let ctx = CancellationToken::new();
    ctx.cancel();

    let err = client
        .execute::<Item>(&ctx, &Request::get("/anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn transport_cancel_interrupts_backoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3, Duration::from_secs(30));
    let ctx = CancellationToken::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let err = client
        .execute::<Item>(&ctx, &Request::get("/down"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn transport_io_failure_is_network_error() {
    // Nothing listens on the discard port.
    let client = NylasClient::builder()
        .api_key("test-key")
        .base_url("http://127.0.0.1:9")
        .max_retries(1)
        .retry_wait(Duration::from_millis(1))
        .build()
        .expect("Failed to create client");

    let err = client
        .execute::<Item>(&CancellationToken::new(), &Request::get("/v3/grants"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn transport_decode_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0, Duration::from_millis(1));
    let err = client
        .execute::<Item>(&CancellationToken::new(), &Request::get("/garbled"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn transport_execute_discard_ignores_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fire"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0, Duration::from_millis(1));
    client
        .execute_discard(&CancellationToken::new(), &Request::post("/fire"))
        .await
        .expect("Failed to execute request");
}

#[tokio::test]
async fn transport_exhausted_429_still_updates_rate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("X-RateLimit-Limit", "5")
                .insert_header("X-RateLimit-Remaining", "0")
                .set_body_json(json!({ "message": "slow down" })),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 1, Duration::from_millis(1));
    let err = client
        .execute::<Item>(&CancellationToken::new(), &Request::get("/busy"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.status(), Some(429));
    let rate = client.rate_limit();
    assert_eq!(rate.limit, 5);
    assert_eq!(rate.remaining, 0);
}

#[tokio::test]
async fn transport_http_date_retry_after_falls_back_to_backoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "ok" } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 1, Duration::from_millis(50));
    let start = Instant::now();
    let resp: Response<Item> = client
        .execute(&CancellationToken::new(), &Request::get("/limited"))
        .await
        .expect("Failed to execute request");

    assert_eq!(resp.data.id, "ok");
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn transport_invalid_url_fails_locally() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-RateLimit-Limit", "9")
                .insert_header("X-RateLimit-Remaining", "8")
                .set_body_json(json!({ "data": { "id": "a" } })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 2, Duration::from_millis(1));
    let ctx = CancellationToken::new();
    let _: Response<Item> = client
        .execute(&ctx, &Request::get("/ok"))
        .await
        .expect("Failed to execute request");
    let before = client.rate_limit();

    // Appending the path turns it into a non-numeric port.
    let err = client
        .execute::<Item>(&ctx, &Request::get(":bad/x"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(matches!(err, Error::InvalidUrl { .. }));
    assert_eq!(err.status(), None);
    assert_eq!(client.rate_limit(), before);

    let received = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 1);
}

#[tokio::test]
async fn transport_default_client_sends_library_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header(
            "User-Agent",
            concat!("nylas-rust/", env!("CARGO_PKG_VERSION")),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "a" } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0, Duration::from_millis(1));
    let _: Response<Item> = client
        .execute(&CancellationToken::new(), &Request::get("/ua"))
        .await
        .expect("Failed to execute request");
}

#[tokio::test]
async fn transport_custom_http_client_keeps_its_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("User-Agent", "my-app/1.0"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "a" } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let http = reqwest::Client::builder()
        .user_agent("my-app/1.0")
        .build()
        .expect("Failed to create HTTP client");
    let client = NylasClient::builder()
        .api_key("test-key")
        .base_url(mock_server.uri())
        .http_client(http)
        .max_retries(0)
        .build()
        .expect("Failed to create client");

    let _: Response<Item> = client
        .execute(&CancellationToken::new(), &Request::get("/ua"))
        .await
        .expect("Failed to execute request");
}

#[tokio::test]
async fn transport_truncated_error_body_still_maps_status() {
    // Promises more body bytes than it sends, then closes the connection.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read address");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("Failed to accept");
        let mut buf = [0_u8; 1024];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(b"HTTP/1.1 502 Bad Gateway\r\ncontent-length: 100\r\n\r\n{\"mess")
            .await;
        let _ = socket.shutdown().await;
    });

    let client = NylasClient::builder()
        .api_key("test-key")
        .base_url(format!("http://{addr}"))
        .max_retries(0)
        .build()
        .expect("Failed to create client");
    let err = client
        .execute::<Item>(&CancellationToken::new(), &Request::get("/broken"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.status(), Some(502));
    assert_eq!(
        err.api_error().map(|e| e.message.as_str()),
        Some("request failed with status 502")
    );
}

//! Client integration tests.

use courier::config::{CodecName, ConfigLoader, CourierConfig};
use courier::prelude::*;
use courier_test::{recording_stage, CallLog, MockReply, MockSender};
use http::header::{AUTHORIZATION, CONTENT_ENCODING};
use http::{HeaderValue, Method, StatusCode};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

/// The caller on whose behalf an outbound request is made.
#[derive(Debug, Clone, Default)]
struct Principal {
    name: Option<String>,
    authenticated: bool,
}

impl Principal {
    fn signed_in(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            authenticated: true,
        }
    }
}

fn bearer_token_stage() -> TransformHandler {
    TransformHandler::before_send(|mut req: Request, _cancel| async move {
        let principal = req.state::<Principal>();
        if principal.authenticated {
            let token = format!("Bearer token-for-{}", principal.name.unwrap_or_default());
            let value = HeaderValue::from_str(&token)
                .map_err(|e| CourierError::handler("bearer_token", e.to_string()))?;
            req.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(req)
    })
    .with_name("bearer_token")
}

fn get(uri: &str) -> Request {
    http::Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_access_token_added_for_authenticated_caller() {
    let mock = MockSender::new().with_body("data");
    let client = Client::new(mock.clone(), [Arc::new(bearer_token_stage()) as BoxedHandler]);

    let mut request = get("https://some-remote-site.com/reports");
    request.set_state(Principal::signed_in("alice"));

    let response = client.send(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let recorded = mock.last_request().unwrap();
    assert_eq!(recorded.header_str("authorization"), Some("Bearer token-for-alice"));
    assert!(recorded.had_state);
}

#[tokio::test]
async fn test_access_token_skipped_for_anonymous_caller() {
    let mock = MockSender::new();
    let client = Client::new(mock.clone(), [Arc::new(bearer_token_stage()) as BoxedHandler]);

    // No state at all reads as the default, unauthenticated principal.
    client.send(get("https://some-remote-site.com/")).await.unwrap();

    let mut anonymous = get("https://some-remote-site.com/");
    anonymous.set_state(Principal::default());
    client.send(anonymous).await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.header_str("authorization").is_none()));
    assert!(!requests[0].had_state);
    assert!(requests[1].had_state);
}

#[tokio::test]
async fn test_builder_orders_stages() {
    let log = CallLog::new();
    let mock = MockSender::new().with_call_log(&log);

    let client = Client::builder()
        .terminal(mock)
        .stage_boxed(recording_stage("a", &log))
        .stages([None, Some(recording_stage("b", &log))])
        .stage_boxed(recording_stage("c", &log))
        .build()
        .unwrap();

    client.send(Request::default()).await.unwrap();

    assert_eq!(client.stage_names(), ["a", "b", "c"]);
    assert_eq!(
        log.entries(),
        ["a.pre", "b.pre", "c.pre", "terminal", "c.post", "b.post", "a.post"]
    );
}

#[tokio::test]
async fn test_builder_without_terminal_is_configuration_error() {
    let result = Client::builder().stage(bearer_token_stage()).build();
    match result {
        Err(err) => assert!(err.is_configuration()),
        Ok(_) => panic!("expected a configuration error"),
    }
}

#[tokio::test]
async fn test_no_stages_uses_terminal_directly() {
    let terminal: BoxedSender = Arc::new(MockSender::new());
    let client = Client::builder()
        .terminal_boxed(Arc::clone(&terminal))
        .build()
        .unwrap();

    assert!(Arc::ptr_eq(client.sender(), &terminal));
    assert!(client.stage_names().is_empty());
}

#[tokio::test]
async fn test_transport_fault_reaches_caller() {
    let log = CallLog::new();
    let mock = MockSender::new().failing("connection refused");
    let client = Client::new(mock, [recording_stage("outer", &log)]);

    let result = client.send(Request::default()).await;

    assert!(matches!(result, Err(CourierError::Transport { .. })));
    assert_eq!(log.entries(), ["outer.pre", "outer.post"]);
}

#[tokio::test]
async fn test_retry_stage_recovers_from_transient_fault() {
    let mock = MockSender::new().then(MockReply::Fail("reset by peer".into()));

    let retry = MiddlewareHandler::new(|req: Request, next: Next, cancel| async move {
        let (method, uri) = (req.method().clone(), req.uri().clone());
        match next.run(req, cancel.clone()).await {
            Err(CourierError::Transport { .. }) => {
                let retry = http::Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .map_err(|e| CourierError::handler("retry", e.to_string()))?;
                next.run(retry, cancel).await
            }
            other => other,
        }
    })
    .with_name("retry");

    let client = Client::new(mock.clone(), [Arc::new(retry) as BoxedHandler]);
    let response = client.send(get("https://api.example.com/jobs")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.request_count(), 2);
    assert!(mock.requests().iter().all(|r| r.uri.path() == "/jobs"));
}

#[tokio::test(start_paused = true)]
async fn test_send_with_cancel() {
    let mock = MockSender::new().with_delay(Duration::from_secs(60));
    let client = Client::new(mock, Vec::<BoxedHandler>::new());
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let result = client.send_with_cancel(Request::default(), &token).await;
    assert!(matches!(result, Err(CourierError::Cancelled)));
}

#[tokio::test]
async fn test_already_cancelled_token_skips_pipeline() {
    let mock = MockSender::new();
    let client = Client::new(mock.clone(), Vec::<BoxedHandler>::new());
    let token = CancellationToken::new();
    token.cancel();

    let result = client.send_with_cancel(Request::default(), &token).await;

    assert!(matches!(result, Err(CourierError::Cancelled)));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_from_config_compresses_bodies() {
    let config = ConfigLoader::new()
        .with_string(
            r#"
            [client]
            label = "uploads"

            [compression]
            enabled = true
            codec = "gzip"
            level = "best"
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.compression.codec, CodecName::Gzip);

    let mock = MockSender::new().with_status(StatusCode::CREATED);
    let client = Client::from_config(mock.clone(), &config);
    assert_eq!(client.stage_names(), ["tracing", "compression"]);

    let payload = "line of log output\n".repeat(200);
    let request = http::Request::builder()
        .method(Method::POST)
        .uri("https://logs.example.com/ingest")
        .body(Body::new(
            BytesContent::new(payload.clone())
                .with_content_type(HeaderValue::from_static("text/plain")),
        ))
        .unwrap();

    let response = client.send(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let recorded = mock.last_request().unwrap();
    assert_eq!(recorded.content_header_str(CONTENT_ENCODING.as_str()), Some("gzip"));
    assert_eq!(recorded.content_header_str("content-type"), Some("text/plain"));

    let mut restored = String::new();
    flate2::read::GzDecoder::new(&recorded.body.unwrap()[..])
        .read_to_string(&mut restored)
        .unwrap();
    assert_eq!(restored, payload);
}

#[tokio::test]
async fn test_default_config_leaves_bodies_alone() {
    let mock = MockSender::new();
    let client = Client::builder()
        .terminal(mock.clone())
        .config(&CourierConfig::default())
        .build()
        .unwrap();

    let request = http::Request::builder()
        .method(Method::PUT)
        .body(Body::from("plain"))
        .unwrap();
    client.send(request).await.unwrap();

    let recorded = mock.last_request().unwrap();
    assert_eq!(recorded.content_header_str("content-encoding"), None);
    assert_eq!(recorded.body.as_deref(), Some(&b"plain"[..]));
}

#[tokio::test]
async fn test_client_is_shared_across_tasks() {
    let mock = MockSender::new();
    let client = Client::new(mock.clone(), [Arc::new(bearer_token_stage()) as BoxedHandler]);

    let mut tasks = Vec::new();
    for i in 0..16 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let mut request = get("https://api.example.com/");
            request.set_state(Principal::signed_in(&format!("user{i}")));
            client.send(request).await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }

    let mut tokens: Vec<String> = mock
        .requests()
        .iter()
        .filter_map(|r| r.header_str("authorization").map(String::from))
        .collect();
    tokens.sort();
    tokens.dedup();
    assert_eq!(tokens.len(), 16);
}

#[tokio::test]
async fn test_client_nests_as_terminal_sender() {
    let log = CallLog::new();
    let mock = MockSender::new().with_call_log(&log);
    let inner = Client::new(mock.clone(), [recording_stage("inner", &log)]);
    let outer = Client::new(inner.clone(), [recording_stage("outer", &log)]);

    let response = HttpSender::send(&inner, Request::default(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    log.clear();

    outer.send(Request::default()).await.unwrap();

    assert_eq!(
        log.entries(),
        ["outer.pre", "inner.pre", "terminal", "inner.post", "outer.post"]
    );
    assert_eq!(mock.request_count(), 2);
}

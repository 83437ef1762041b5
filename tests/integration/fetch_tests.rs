//! Retry controller behavior against a mock server

use registry_harvest::config::SessionConfig;
use registry_harvest::fetch::{fetch, AttemptError, FetchFailure, FetchRequest, RetryPolicy};
use registry_harvest::session::SessionContext;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RATE_LIMIT_WAIT: Duration = Duration::from_millis(50);

fn create_test_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        delay_min: Duration::ZERO,
        delay_max: Duration::ZERO,
        max_attempts,
        rate_limit_wait: RATE_LIMIT_WAIT,
        transport_error_wait: Duration::from_millis(10),
        timeout: Duration::from_millis(300),
    }
}

fn create_session(server: &MockServer) -> SessionContext {
    let base = Url::parse(&server.uri()).unwrap();
    SessionContext::new(&SessionConfig::default(), &base, 1).unwrap()
}

fn request(server: &MockServer, page: &str) -> FetchRequest {
    let url = Url::parse(&format!("{}{}", server.uri(), page)).unwrap();
    FetchRequest::get(url, Duration::from_millis(300))
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

#[tokio::test]
async fn test_two_rate_limits_then_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/id/1"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/id/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let session = create_session(&server);
    let started = Instant::now();
    let success = fetch(&session, &create_test_policy(3), &request(&server, "/id/1"))
        .await
        .expect("third attempt should succeed");

    assert_eq!(success.body, "ok");
    assert_eq!(success.attempts, 3);
    // 1x then 2x the base wait
    assert_eq!(success.backoff, RATE_LIMIT_WAIT * 3);
    assert!(started.elapsed() >= RATE_LIMIT_WAIT * 3);
    assert_eq!(request_count(&server).await, 3);
    assert_eq!(session.requests_made(), 3);
}

#[tokio::test]
async fn test_rate_limited_every_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/id/1"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let session = create_session(&server);
    let failure = fetch(&session, &create_test_policy(3), &request(&server, "/id/1"))
        .await
        .unwrap_err();

    match failure {
        FetchFailure::ExhaustedRetries { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(last, AttemptError::RateLimited);
        }
        other => panic!("expected ExhaustedRetries, got {:?}", other),
    }
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_not_found_is_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/id/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let session = create_session(&server);
    let failure = fetch(&session, &create_test_policy(3), &request(&server, "/id/missing"))
        .await
        .unwrap_err();

    assert!(matches!(
        failure,
        FetchFailure::TerminalStatus { status: 404, .. }
    ));
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/id/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/id/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_string("on time"))
        .mount(&server)
        .await;

    let session = create_session(&server);
    let success = fetch(&session, &create_test_policy(3), &request(&server, "/id/slow"))
        .await
        .expect("second attempt should succeed");

    assert_eq!(success.body, "on time");
    assert_eq!(success.attempts, 2);
    assert_eq!(success.backoff, Duration::from_millis(10));
}

#[tokio::test]
async fn test_single_attempt_policy_never_sleeps() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let session = create_session(&server);
    let started = Instant::now();
    let failure = fetch(&session, &create_test_policy(1), &request(&server, "/id/1"))
        .await
        .unwrap_err();

    assert!(matches!(
        failure,
        FetchFailure::ExhaustedRetries { attempts: 1, .. }
    ));
    assert!(started.elapsed() < RATE_LIMIT_WAIT);
}

#[tokio::test]
async fn test_connection_refused_is_retried_then_exhausted() {
    // Bind then release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let base = Url::parse(&format!("http://127.0.0.1:{}", port)).unwrap();
    let session = SessionContext::new(&SessionConfig::default(), &base, 1).unwrap();
    let request = FetchRequest::get(base.join("/id/1").unwrap(), Duration::from_millis(300));

    let failure = fetch(&session, &create_test_policy(3), &request)
        .await
        .unwrap_err();

    match failure {
        FetchFailure::ExhaustedRetries { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(last, AttemptError::Transient("connection failed".to_string()));
        }
        other => panic!("expected ExhaustedRetries, got {:?}", other),
    }
    assert_eq!(session.requests_made(), 3);
}

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use resilient_fetch::{FailureReason, FetchRequest, FetcherOptions, ResilientFetcher};

fn options(server: &MockServer) -> FetcherOptions {
    FetcherOptions::builder()
        .api_base_url(server.uri())
        .base_delay_ms(10)
        .timeout(Duration::from_secs(5))
        .build()
}

fn request(server: &MockServer, route: &str) -> FetchRequest {
    FetchRequest::builder(format!("{}{}", server.uri(), route))
        .max_retries(3)
        .base_delay_ms(10)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/theepicsaxguy/homelab"))
        .respond_with(ResponseTemplate::new(403).insert_header("retry-after", "0"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/theepicsaxguy/homelab"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"stargazers_count":5,"forks_count":2}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ResilientFetcher::new(options(&server)).unwrap();
    let outcome = fetcher
        .fetch(&request(&server, "/repos/theepicsaxguy/homelab"))
        .await;

    let resource = outcome.success().unwrap();
    assert_eq!(resource.attempts, 3);
    assert_eq!(resource.content_type, "application/json");
    let value: serde_json::Value = resource.json().unwrap();
    assert_eq!(value["stargazers_count"], 5);
}

#[tokio::test]
async fn test_not_found_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/nobody/nothing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ResilientFetcher::new(options(&server)).unwrap();
    let outcome = fetcher.fetch(&request(&server, "/repos/nobody/nothing")).await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.reason, FailureReason::HttpError);
    assert_eq!(failure.attempts, 1);
    assert_eq!(failure.last_status, Some(404));
}

#[tokio::test]
async fn test_persistent_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = ResilientFetcher::new(options(&server)).unwrap();
    let outcome = fetcher.fetch(&request(&server, "/anything")).await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.reason, FailureReason::RateLimited);
    assert_eq!(failure.attempts, 3);
}

#[tokio::test]
async fn test_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "homelab-docs/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let options = FetcherOptions::builder()
        .api_base_url(server.uri())
        .user_agent("homelab-docs/1.0")
        .build();
    let fetcher = ResilientFetcher::new(options).unwrap();

    assert!(fetcher.fetch(&request(&server, "/")).await.is_success());
}

#[tokio::test]
async fn test_token_only_sent_to_api_host() {
    let api = MockServer::start().await;
    let cdn = MockServer::start().await;
    for server in [&api, &cdn] {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    let options = FetcherOptions::builder()
        .api_base_url(api.uri())
        .github_token("ghp_testtoken")
        .build();
    let fetcher = ResilientFetcher::new(options).unwrap();

    assert!(fetcher.fetch(&request(&api, "/repos/a/b")).await.is_success());
    assert!(fetcher.fetch(&request(&cdn, "/u/1")).await.is_success());

    let api_requests = api.received_requests().await.unwrap();
    assert_eq!(
        api_requests[0]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok()),
        Some("Bearer ghp_testtoken")
    );

    let cdn_requests = cdn.received_requests().await.unwrap();
    assert!(cdn_requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_timeout_is_retried_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let options = FetcherOptions::builder()
        .api_base_url(server.uri())
        .timeout(Duration::from_millis(100))
        .build();
    let fetcher = ResilientFetcher::new(options).unwrap();
    let req = FetchRequest::builder(format!("{}/slow", server.uri()))
        .max_retries(2)
        .base_delay_ms(10)
        .build()
        .unwrap();

    let outcome = fetcher.fetch(&req).await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.reason, FailureReason::NetworkError);
    assert_eq!(failure.attempts, 2);
    assert!(failure.message.contains("timed out"));
}

#[tokio::test]
async fn test_concurrent_fetches_share_fetcher() {
    let server = MockServer::start().await;
    for (route, body) in [("/a", "alpha"), ("/b", "beta")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    let fetcher = Arc::new(ResilientFetcher::new(options(&server)).unwrap());
    let a = tokio::spawn({
        let fetcher = fetcher.clone();
        let req = request(&server, "/a");
        async move { fetcher.fetch(&req).await }
    });
    let b = tokio::spawn({
        let fetcher = fetcher.clone();
        let req = request(&server, "/b");
        async move { fetcher.fetch(&req).await }
    });

    assert_eq!(a.await.unwrap().success().unwrap().body, b"alpha");
    assert_eq!(b.await.unwrap().success().unwrap().body, b"beta");
}

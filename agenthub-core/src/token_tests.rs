//! Tests for the bearer token cache.

use super::*;
use crate::aws::MemoryParameterStore;
use crate::test_utils::ManualClock;
use chrono::TimeZone;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREFIX: &str = "/app/netops/agentcore";

fn seeded_store(token_url: &str) -> Arc<MemoryParameterStore> {
    Arc::new(MemoryParameterStore::with_values([
        (format!("{}/machine_client_id", PREFIX), "client-1".to_string()),
        (format!("{}/machine_client_secret", PREFIX), "s3cret".to_string()),
        (format!("{}/cognito_token_url", PREFIX), token_url.to_string()),
        (
            format!("{}/cognito_auth_scope", PREFIX),
            "netops/invoke".to_string(),
        ),
    ]))
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=netops%2Finvoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn cache_with_clock(store: Arc<MemoryParameterStore>, clock: &ManualClock) -> TokenCache {
    TokenCache::builder(store)
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_token_reused_inside_window() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    let clock = ManualClock::new(start_time());
    let cache = cache_with_clock(
        seeded_store(&format!("{}/oauth2/token", server.uri())),
        &clock,
    );

    assert_eq!(cache.token("netops", PREFIX).await.as_deref(), Some("tok-1"));

    clock.advance(Duration::from_secs(3499));
    assert_eq!(cache.token("netops", PREFIX).await.as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn test_token_refreshed_at_window_edge() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 2).await;

    let clock = ManualClock::new(start_time());
    let cache = cache_with_clock(
        seeded_store(&format!("{}/oauth2/token", server.uri())),
        &clock,
    );

    assert!(cache.token("netops", PREFIX).await.is_some());
    clock.advance(DEFAULT_TOKEN_TTL);
    assert!(cache.cached("netops").is_none());
    assert!(cache.token("netops", PREFIX).await.is_some());
}

#[tokio::test]
async fn test_cache_is_keyed_by_agent() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 2).await;

    let clock = ManualClock::new(start_time());
    let cache = cache_with_clock(
        seeded_store(&format!("{}/oauth2/token", server.uri())),
        &clock,
    );

    cache.fetch("netops", PREFIX).await.unwrap();
    cache.fetch("k8s", PREFIX).await.unwrap();
    cache.fetch("netops", PREFIX).await.unwrap();
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 2).await;

    let cache = TokenCache::new(seeded_store(&format!("{}/oauth2/token", server.uri()))).unwrap();

    cache.fetch("netops", PREFIX).await.unwrap();
    cache.invalidate("netops");
    assert!(cache.cached("netops").is_none());
    cache.fetch("netops", PREFIX).await.unwrap();
}

#[tokio::test]
async fn test_missing_parameter_yields_none() {
    let store = Arc::new(MemoryParameterStore::with_values([(
        format!("{}/machine_client_id", PREFIX),
        "client-1".to_string(),
    )]));
    let cache = TokenCache::new(store).unwrap();

    assert!(cache.token("netops", PREFIX).await.is_none());

    let err = cache.fetch("netops", PREFIX).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingParameter(ref name) if name.ends_with("machine_client_secret")));
}

#[tokio::test]
async fn test_rejected_grant_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "invalid_client"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let cache = TokenCache::new(seeded_store(&format!("{}/oauth2/token", server.uri()))).unwrap();

    let err = cache.fetch("netops", PREFIX).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenEndpoint { status: 400, .. }));
    assert!(cache.token("netops", PREFIX).await.is_none());
}

#[tokio::test]
async fn test_malformed_token_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"nope": 1})))
        .mount(&server)
        .await;

    let cache = TokenCache::new(seeded_store(&format!("{}/oauth2/token", server.uri()))).unwrap();
    let err = cache.fetch("netops", PREFIX).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let cache = TokenCache::builder(seeded_store("http://127.0.0.1:1/oauth2/token"))
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = cache.fetch("netops", PREFIX).await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
}

#[test]
fn test_credentials_debug_redacts_secret() {
    let creds = M2mCredentials {
        client_id: "id".to_string(),
        client_secret: "hunter2".to_string(),
        token_url: "https://auth".to_string(),
        scope: "s".to_string(),
    };
    let debug = format!("{:?}", creds);
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("[REDACTED]"));
}

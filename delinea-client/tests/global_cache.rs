//! Clients built without an explicit cache share the process-wide one.
//!
//! Kept in its own test binary so no other test touches the global cache.

use delinea_client::{DelineaConfig, SecretClient, TokenCache, TokenSource};
use secrecy::ExposeSecret;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn default_clients_share_process_wide_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "process-token",
            "token_type": "bearer",
            "expires_in": 1199,
            "refresh_token": "process-refresh",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/secrets/1234/summary"))
        .and(header("authorization", "Bearer process-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "db-reader",
            "secretTemplateId": 6003,
        })))
        .expect(2)
        .mount(&server)
        .await;

    let config = DelineaConfig::new(server.uri(), "svc-reader", "hunter2");

    let first = SecretClient::connect(config.clone(), 1234).await.unwrap();
    assert_eq!(first.last_token_source(), Some(TokenSource::Server));

    let cached = TokenCache::global().get().await.unwrap();
    assert_eq!(cached.access_token.expose_secret(), "process-token");
    assert_eq!(
        cached.refresh_token.unwrap().expose_secret(),
        "process-refresh"
    );

    let second = SecretClient::connect(config, 1234).await.unwrap();
    assert_eq!(second.last_token_source(), Some(TokenSource::Cached));
    assert_eq!(second.name(), "db-reader");
}

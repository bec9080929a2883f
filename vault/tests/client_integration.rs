//! End-to-end client behavior against a mock vault server.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rust_common::{TracingConfig, try_init_tracing};
use serde_json::json;
use std::time::Duration;
use vault_tokenization::{
    AesGcmEncryptor, PayloadEncryptor, TokenizationClient, VaultConfig, VaultError,
};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: [u8; 32] = [11u8; 32];

fn init_tracing() {
    let _ = try_init_tracing(&TracingConfig::default().with_log_level("debug"));
}

fn config(server: &MockServer) -> VaultConfig {
    VaultConfig::new(
        format!("{}/api/v1", server.uri()),
        format!("{}/token", server.uri()),
        "payments",
        "s3cret",
    )
    .with_max_retries(2)
    .with_initial_retry_delay(Duration::from_millis(1))
    .with_cache_enabled(true)
    .with_encryption_enabled(false)
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "abc",
            "expiresIn": 300,
            "refreshExpiresIn": 1800,
            "tokenType": "Bearer",
            "scope": "tokenize"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn tokenize_then_detokenize_is_served_from_cache() {
    init_tracing();
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/tokenize"))
        .and(header("authorization", "Bearer abc"))
        .and(body_json(json!({"value": "4111111111111111"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok_4111",
            "exists": false,
            "newlyCreated": true,
            "dataType": "string"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/detokenize"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = TokenizationClient::new(config(&server)).unwrap();
    let token = client.tokenize("4111111111111111").await.unwrap().token;
    let value = client.detokenize(token).await.unwrap().value;

    assert_eq!(value.as_deref(), Some("4111111111111111"));
    assert!(client.is_token_valid().await);
}

#[tokio::test]
async fn unauthorized_response_refreshes_token_once() {
    init_tracing();
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/tokenize"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token revoked"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tokenize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok_1", "exists": true, "newlyCreated": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TokenizationClient::new(config(&server)).unwrap();
    let resp = client.tokenize("v").await.unwrap();
    assert_eq!(resp.token, "tok_1");
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    init_tracing();
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/batch/tokenize"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(3)
        .mount(&server)
        .await;

    let client = TokenizationClient::new(config(&server)).unwrap();
    let err = client.batch_tokenize(vec!["a".into(), "b".into()]).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to batch tokenize: HTTP 503 - maintenance");
    assert_eq!(client.cache_len(), 0);
}

#[tokio::test]
async fn rejected_credentials_fail_without_calling_vault() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/detokenize"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = TokenizationClient::new(config(&server)).unwrap();
    match client.detokenize("tok_1").await {
        Err(VaultError::AuthenticationFailed { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid_client");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn encrypted_round_trip() {
    init_tracing();
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let sealed = AesGcmEncryptor::new(&KEY)
        .unwrap()
        .encrypt(br#"{"value":"555-12-3456","exists":true,"dataType":"ssn"}"#)
        .unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/encrypted/detokenize"))
        .and(body_string_contains("payload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"payload": sealed.payload, "iv": sealed.iv})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server)
        .with_encryption_enabled(true)
        .with_encryption_key(STANDARD.encode(KEY));
    let client = TokenizationClient::new(config).unwrap();
    assert!(client.is_encryption_active());

    let resp = client.detokenize("tok_ssn").await.unwrap();
    assert_eq!(resp.value.as_deref(), Some("555-12-3456"));
    assert_eq!(resp.data_type.as_deref(), Some("ssn"));
}

#[tokio::test]
async fn backend_decryption_unavailable_disables_encryption_for_good() {
    init_tracing();
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/encrypted/tokenize"))
        .respond_with(ResponseTemplate::new(419))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tokenize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok_x", "exists": false, "newlyCreated": true
        })))
        .expect(2)
        .mount(&server)
        .await;

    let config = config(&server)
        .with_encryption_enabled(true)
        .with_encryption_key(STANDARD.encode(KEY))
        .with_cache_enabled(false);
    let client = TokenizationClient::new(config).unwrap();

    client.tokenize("first").await.unwrap();
    assert!(!client.is_encryption_active());
    client.tokenize("second").await.unwrap();
}

#[tokio::test]
async fn batch_detokenize_merges_cache_hits_first() {
    init_tracing();
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/tokenize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok_b", "exists": false, "newlyCreated": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/batch/detokenize"))
        .and(body_json(json!({"tokens": ["tok_a", "tok_c"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"token": "tok_a", "value": "a", "exists": true},
                {"token": "tok_c", "value": null, "exists": false}
            ],
            "summary": {"processedCount": 2, "foundCount": 1, "notFoundCount": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TokenizationClient::new(config(&server)).unwrap();
    client.tokenize("b").await.unwrap();

    let resp = client
        .batch_detokenize(vec!["tok_a".into(), "tok_b".into(), "tok_c".into()])
        .await
        .unwrap();

    let tokens: Vec<_> = resp.results.iter().map(|r| r.token.as_str()).collect();
    assert_eq!(tokens, ["tok_b", "tok_a", "tok_c"]);
    assert_eq!(resp.summary.processed_count, 3);
    assert_eq!(resp.summary.found_count, 2);
    assert_eq!(resp.summary.not_found_count, 1);
}

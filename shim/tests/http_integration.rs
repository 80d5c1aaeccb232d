// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP integration tests for the transit API.
//!
//! These tests use `axum-test` to drive the full request/response cycle
//! through the Axum router with all layers applied.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::TestServer;
use common::{FailingCipher, RecordingCipher};
use serde_json::json;
use sops_kms_shim::application::create_router;
use sops_kms_shim::constants::VAULT_PREFIX;
use sops_kms_shim::models::{DecryptResponse, EncryptResponse, ErrorResponse};
use transit_cipher::utils::{base64_decode, base64_encode};
use transit_cipher::{Cipher, StubCipher};

fn create_test_server(cipher: Arc<dyn Cipher>) -> TestServer {
    TestServer::new(create_router(cipher)).unwrap()
}

fn stub_server() -> TestServer {
    create_test_server(Arc::new(StubCipher))
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_200_with_empty_body() {
    let server = stub_server();
    for _ in 0..5 {
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert!(response.as_bytes().is_empty());
    }
}

#[tokio::test]
async fn test_health_does_not_touch_cipher() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    server.get("/health").await.assert_status_ok();
    assert_eq!(cipher.calls(), 0);
}

// =============================================================================
// Encrypt Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_encrypt_example_scenario() {
    let server = stub_server();
    let response = server
        .put("/v1/transit/encrypt/k1")
        .json(&json!({"plaintext": "SGVsbG8="}))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({"ciphertext": "vault:v1:SGVsbG8="}));
}

#[tokio::test]
async fn test_encrypt_empty_plaintext() {
    let server = stub_server();
    let response = server
        .put("/v1/transit/encrypt/test-key-456")
        .json(&json!({"plaintext": ""}))
        .await;
    response.assert_status_ok();
    let body: EncryptResponse = response.json();
    assert_eq!(body.ciphertext, VAULT_PREFIX);
}

#[tokio::test]
async fn test_encrypt_with_invalid_json_returns_400() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let response = server
        .put("/v1/transit/encrypt/test-key")
        .content_type("application/json")
        .bytes(Bytes::from("invalid json"))
        .await;
    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert_eq!(body.errors.len(), 1);
    assert_eq!(cipher.calls(), 0);
}

#[tokio::test]
async fn test_encrypt_with_invalid_base64_returns_400() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let response = server
        .put("/v1/transit/encrypt/test-key")
        .json(&json!({"plaintext": "***"}))
        .await;
    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(body.errors[0].starts_with("invalid base64 plaintext"));
    assert_eq!(cipher.calls(), 0);
}

#[tokio::test]
async fn test_encrypt_with_text_plain_returns_400() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let response = server
        .put("/v1/transit/encrypt/test-key")
        .text(r#"{"plaintext":"dGVzdA=="}"#)
        .await;
    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert_eq!(body.errors, ["invalid content-type: text/plain"]);
    assert_eq!(cipher.calls(), 0);
}

#[tokio::test]
async fn test_encrypt_backend_failure_returns_500() {
    let server = create_test_server(Arc::new(FailingCipher));
    let response = server
        .put("/v1/transit/encrypt/k1")
        .json(&json!({"plaintext": "SGVsbG8="}))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({"errors": ["failed to encrypt: key k1 is disabled"]}));
}

#[tokio::test]
async fn test_key_ids_with_slashes_reach_cipher() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let key_ids = [
        "alias/sops",
        "arn:aws:kms:us-east-1:111122223333:key/1234abcd-12ab-34cd-56ef-1234567890ab",
        "arn:aws:kms:us-east-1:111122223333:alias/team/sops",
    ];

    for key_id in key_ids {
        let response = server
            .put(&format!("/v1/transit/encrypt/{key_id}"))
            .json(&json!({"plaintext": "SGVsbG8="}))
            .await;
        response.assert_status_ok();
        let encrypted: EncryptResponse = response.json();

        let response = server
            .put(&format!("/v1/transit/decrypt/{key_id}"))
            .json(&json!({"ciphertext": encrypted.ciphertext}))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({"plaintext": "SGVsbG8="}));
    }

    let expected: Vec<String> = key_ids
        .iter()
        .flat_map(|key_id| [key_id.to_string(), key_id.to_string()])
        .collect();
    assert_eq!(cipher.key_ids(), expected);
}

#[tokio::test]
async fn test_percent_encoded_key_id_is_decoded() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let response = server
        .put("/v1/transit/encrypt/arn%3Aaws%3Akms%3Aus-east-1%3A1%3Akey/my%20key")
        .json(&json!({"plaintext": "SGVsbG8="}))
        .await;
    response.assert_status_ok();
    assert_eq!(cipher.key_ids(), ["arn:aws:kms:us-east-1:1:key/my key"]);
}

#[tokio::test]
async fn test_missing_key_id_is_not_routed() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let response = server
        .put("/v1/transit/encrypt/")
        .json(&json!({"plaintext": "SGVsbG8="}))
        .await;
    response.assert_status_not_found();
    assert_eq!(cipher.calls(), 0);
}

#[tokio::test]
async fn test_encrypt_requires_put() {
    let server = stub_server();
    let response = server
        .post("/v1/transit/encrypt/k1")
        .json(&json!({"plaintext": "SGVsbG8="}))
        .await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Decrypt Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_decrypt_returns_base64_plaintext() {
    let server = stub_server();
    let token = base64_encode(b"Hello, World!");
    let response = server
        .put("/v1/transit/decrypt/test-key-123")
        .json(&json!({"ciphertext": format!("{VAULT_PREFIX}{token}")}))
        .await;
    response.assert_status_ok();
    let body: DecryptResponse = response.json();
    assert_eq!(body.plaintext, base64_encode(b"Hello, World!"));
}

#[tokio::test]
async fn test_decrypt_example_invalid_format() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let response = server
        .put("/v1/transit/decrypt/k1")
        .json(&json!({"ciphertext": "invalid-format"}))
        .await;
    response.assert_status_bad_request();
    response.assert_json(&json!({"errors": ["invalid ciphertext format"]}));
    assert_eq!(cipher.calls(), 0);
}

#[tokio::test]
async fn test_decrypt_missing_ciphertext_is_rejected() {
    let server = stub_server();
    for body in [json!({"ciphertext": ""}), json!({})] {
        let response = server.put("/v1/transit/decrypt/k1").json(&body).await;
        response.assert_status_bad_request();
    }
}

#[tokio::test]
async fn test_decrypt_prefix_only_is_valid() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let response = server
        .put("/v1/transit/decrypt/k1")
        .json(&json!({"ciphertext": VAULT_PREFIX}))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({"plaintext": ""}));
    assert_eq!(cipher.calls(), 1);
}

#[tokio::test]
async fn test_decrypt_prefix_is_case_sensitive() {
    let server = stub_server();
    let response = server
        .put("/v1/transit/decrypt/k1")
        .json(&json!({"ciphertext": "VAULT:V1:SGVsbG8="}))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_decrypt_with_invalid_json_returns_400() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let response = server
        .put("/v1/transit/decrypt/test-key")
        .content_type("application/json")
        .bytes(Bytes::from("{invalid json"))
        .await;
    response.assert_status_bad_request();
    assert_eq!(cipher.calls(), 0);
}

#[tokio::test]
async fn test_decrypt_backend_failure_returns_500() {
    let server = create_test_server(Arc::new(FailingCipher));
    let response = server
        .put("/v1/transit/decrypt/k1")
        .json(&json!({"ciphertext": "vault:v1:SGVsbG8="}))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json();
    assert_eq!(body.errors, ["failed to decrypt: key k1 is disabled"]);
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[tokio::test]
async fn test_round_trip_preserves_bytes() {
    let server = stub_server();
    let payloads: [&[u8]; 5] = [
        b"",
        b"Hello, Vault!",
        &[0, 1, 2, 254, 255],
        &[0xAB; 32],
        "héllo wörld".as_bytes(),
    ];

    for payload in payloads {
        let response = server
            .put("/v1/transit/encrypt/test-key")
            .json(&json!({"plaintext": base64_encode(payload)}))
            .await;
        response.assert_status_ok();
        let encrypted: EncryptResponse = response.json();
        assert!(encrypted.ciphertext.starts_with(VAULT_PREFIX));

        let response = server
            .put("/v1/transit/decrypt/test-key")
            .json(&json!({"ciphertext": encrypted.ciphertext}))
            .await;
        response.assert_status_ok();
        let decrypted: DecryptResponse = response.json();
        assert_eq!(base64_decode(&decrypted.plaintext).unwrap(), payload);
    }
}

// =============================================================================
// Request Body Size Limit Tests
// =============================================================================

#[tokio::test]
async fn test_oversized_request_body_returns_413() {
    let cipher = RecordingCipher::new();
    let server = create_test_server(cipher.clone());
    let oversized_body = vec![b'a'; 1024 * 1024 + 1];
    let response = server
        .put("/v1/transit/encrypt/k1")
        .content_type("application/json")
        .bytes(Bytes::from(oversized_body))
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: ErrorResponse = response.json();
    assert_eq!(body.errors.len(), 1);
    assert_eq!(cipher.calls(), 0);
}

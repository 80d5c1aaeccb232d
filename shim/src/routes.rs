// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers for the Vault transit compatible API.
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Readiness probe |
//! | PUT | `/v1/transit/encrypt/{key_id}` | [`encrypt`] | Encrypt base64 plaintext |
//! | PUT | `/v1/transit/decrypt/{key_id}` | [`decrypt`] | Decrypt `vault:v1:` ciphertext |
//!
//! Failures are answered with `{"errors": ["<message>"]}`, see
//! [`AppError`].

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use transit_cipher::utils::{base64_decode, base64_encode};
use zeroize::Zeroizing;

use crate::application::AppState;
use crate::constants::VAULT_PREFIX;
use crate::errors::AppError;
use crate::models::{DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse};

/// JSON body extractor with the transit engine's content-type rules.
///
/// A missing (or empty) `Content-Type` is accepted. Otherwise the value must
/// start with `application/json`, parameters such as `charset` are ignored.
/// The header is checked before the body is read.
pub struct TransitJson<T>(pub T);

impl<S, T> FromRequest<S> for TransitJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = req.headers().get(CONTENT_TYPE) {
            let content_type = String::from_utf8_lossy(value.as_bytes());
            if !content_type.is_empty() && !content_type.starts_with("application/json") {
                return Err(AppError::InvalidContentType(content_type.into_owned()));
            }
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BodyRejected {
                status: rejection.status(),
                message: rejection.body_text(),
            })?;

        let value =
            serde_json::from_slice(&body).map_err(|err| AppError::InvalidJson(err.to_string()))?;

        Ok(Self(value))
    }
}

/// Readiness probe. Always `200 OK` with an empty body.
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Encrypts a base64 plaintext with the backend key `key_id`.
///
/// # Response
///
/// ```json
/// {"ciphertext": "vault:v1:<backend token>"}
/// ```
///
/// # Errors
///
/// - [`AppError::InvalidContentType`] / [`AppError::InvalidJson`] - 400
/// - [`AppError::InvalidBase64`] - 400
/// - [`AppError::Cipher`] - 500, carries the backend message
#[tracing::instrument(skip(state, request))]
pub async fn encrypt(
    State(state): State<Arc<AppState>>,
    Path(key_id): Path<String>,
    TransitJson(request): TransitJson<EncryptRequest>,
) -> Result<Json<EncryptResponse>, AppError> {
    tracing::info!("[shim] encrypting data with KMS");

    let plaintext = Zeroizing::new(
        base64_decode(&request.plaintext).map_err(|err| AppError::InvalidBase64(err.to_string()))?,
    );

    let token = state.cipher.encrypt(&key_id, &plaintext).await?;

    Ok(Json(EncryptResponse {
        ciphertext: format!("{VAULT_PREFIX}{token}"),
    }))
}

/// Decrypts a `vault:v1:` ciphertext with the backend key `key_id`.
///
/// Everything after the prefix goes to the backend verbatim. A ciphertext that
/// is exactly the prefix is passed on as an empty token.
///
/// # Response
///
/// ```json
/// {"plaintext": "<base64>"}
/// ```
///
/// # Errors
///
/// - [`AppError::InvalidContentType`] / [`AppError::InvalidJson`] - 400
/// - [`AppError::InvalidCiphertextFormat`] - 400, prefix missing
/// - [`AppError::Cipher`] - 500, carries the backend message
#[tracing::instrument(skip(state, request))]
pub async fn decrypt(
    State(state): State<Arc<AppState>>,
    Path(key_id): Path<String>,
    TransitJson(request): TransitJson<DecryptRequest>,
) -> Result<Json<DecryptResponse>, AppError> {
    tracing::info!("[shim] decrypting data with KMS");

    let Some(token) = request.ciphertext.strip_prefix(VAULT_PREFIX) else {
        return Err(AppError::InvalidCiphertextFormat);
    };

    let plaintext = Zeroizing::new(state.cipher.decrypt(&key_id, token).await?);

    Ok(Json(DecryptResponse {
        plaintext: base64_encode(&plaintext),
    }))
}

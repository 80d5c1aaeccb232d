// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use transit_cipher::CipherError;

use crate::models::ErrorResponse;

/// Per-request failures of the transit endpoints.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("invalid content-type: {0}")]
    InvalidContentType(String),
    #[error("{0}")]
    InvalidJson(String),
    #[error("invalid base64 plaintext: {0}")]
    InvalidBase64(String),
    #[error("invalid ciphertext format")]
    InvalidCiphertextFormat,
    #[error("{message}")]
    BodyRejected { status: StatusCode, message: String },
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidContentType(_)
            | Self::InvalidJson(_)
            | Self::InvalidBase64(_)
            | Self::InvalidCiphertextFormat => StatusCode::BAD_REQUEST,
            Self::BodyRejected { status, .. } => *status,
            Self::Cipher(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        tracing::error!(status = status.as_u16(), error = %message, "[shim] error response");

        let body = Json(ErrorResponse {
            errors: vec![message],
        });

        (status, body).into_response()
    }
}

/// Failures of the server lifecycle and the process orchestrator.
#[derive(thiserror::Error, Debug)]
pub enum ShimError {
    #[error("KMS_SHIM_KEY_ID or AWS_KMS_KEY_ID environment variable is required")]
    MissingKeyId,
    #[error(
        "conflicting argument {0}: the transit endpoint is provided through SOPS_VAULT_URIS, remove the flag"
    )]
    ConflictingArgument(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server stopped unexpectedly: {0}")]
    ServerFailed(#[source] std::io::Error),
    #[error("server did not become healthy after {attempts} attempts")]
    Unhealthy { attempts: u32 },
    #[error("failed to create health check client: {0}")]
    HealthClient(#[source] reqwest::Error),
    #[error("failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for {command}: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} --version exited with {status}")]
    Version { command: String, status: String },
    #[error("server task failed: {0}")]
    Join(String),
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Invalid values found while loading [`crate::configuration::Config`].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid boolean value for {name}: {value:?}")]
    InvalidBool { name: &'static str, value: String },
    #[error("invalid log format for {name}: {value:?} (expected \"text\" or \"json\")")]
    InvalidLogFormat { name: &'static str, value: String },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_validation_errors_map_to_400() {
        let response = AppError::InvalidCiphertextFormat.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!({"errors": ["invalid ciphertext format"]}));
    }

    #[tokio::test]
    async fn test_content_type_error_message() {
        let response = AppError::InvalidContentType("text/plain".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["errors"][0], "invalid content-type: text/plain");
    }

    #[tokio::test]
    async fn test_cipher_errors_map_to_500_with_backend_message() {
        let err = AppError::from(CipherError::Encrypt("AccessDeniedException".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["errors"][0], "failed to encrypt: AccessDeniedException");
        assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_body_rejection_keeps_status() {
        let err = AppError::BodyRejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".to_string(),
        };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_string(), "length limit exceeded");
    }

    #[test]
    fn test_missing_key_id_names_the_variables() {
        let message = ShimError::MissingKeyId.to_string();
        assert!(message.contains("KMS_SHIM_KEY_ID"));
        assert!(message.contains("AWS_KMS_KEY_ID"));
    }
}

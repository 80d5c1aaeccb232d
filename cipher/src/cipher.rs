// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("failed to encrypt: {0}")]
    Encrypt(String),
    #[error("failed to decrypt: {0}")]
    Decrypt(String),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Encryption and decryption against a key held by a key-management backend.
///
/// Implementations must be safe to call concurrently for different keys and
/// payloads. Cancellation happens by dropping the returned future.
#[async_trait]
pub trait Cipher: Send + Sync {
    /// Encrypts `plaintext` (which may be empty) with the key `key_id`.
    ///
    /// Returns an opaque ciphertext token; callers must store it verbatim.
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<String, CipherError>;

    /// Decrypts a token previously returned by [`Cipher::encrypt`].
    async fn decrypt(&self, key_id: &str, ciphertext: &str) -> Result<Vec<u8>, CipherError>;
}

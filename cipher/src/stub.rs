// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;

use crate::cipher::{Cipher, CipherError};
use crate::utils::{base64_decode, base64_encode};

/// Deterministic [`Cipher`] that "encrypts" by base64-encoding the plaintext.
///
/// Provides no confidentiality whatsoever. Meant for tests and for exercising
/// the transit protocol without a key-management backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubCipher;

#[async_trait]
impl Cipher for StubCipher {
    async fn encrypt(&self, _key_id: &str, plaintext: &[u8]) -> Result<String, CipherError> {
        Ok(base64_encode(plaintext))
    }

    async fn decrypt(&self, _key_id: &str, ciphertext: &str) -> Result<Vec<u8>, CipherError> {
        base64_decode(ciphertext).map_err(|err| CipherError::Decrypt(err.to_string()))
    }
}

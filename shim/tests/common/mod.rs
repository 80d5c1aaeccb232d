// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use transit_cipher::{Cipher, CipherError, StubCipher};

/// [`StubCipher`] that records the key id of every call.
#[derive(Default)]
pub struct RecordingCipher {
    key_ids: Mutex<Vec<String>>,
}

impl RecordingCipher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.key_ids.lock().unwrap().len()
    }

    pub fn key_ids(&self) -> Vec<String> {
        self.key_ids.lock().unwrap().clone()
    }

    fn record(&self, key_id: &str) {
        self.key_ids.lock().unwrap().push(key_id.to_string());
    }
}

#[async_trait]
impl Cipher for RecordingCipher {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<String, CipherError> {
        self.record(key_id);
        StubCipher.encrypt(key_id, plaintext).await
    }

    async fn decrypt(&self, key_id: &str, ciphertext: &str) -> Result<Vec<u8>, CipherError> {
        self.record(key_id);
        StubCipher.decrypt(key_id, ciphertext).await
    }
}

/// Cipher whose backend always refuses the request.
pub struct FailingCipher;

#[async_trait]
impl Cipher for FailingCipher {
    async fn encrypt(&self, key_id: &str, _plaintext: &[u8]) -> Result<String, CipherError> {
        Err(CipherError::Encrypt(format!("key {key_id} is disabled")))
    }

    async fn decrypt(&self, key_id: &str, _ciphertext: &str) -> Result<Vec<u8>, CipherError> {
        Err(CipherError::Decrypt(format!("key {key_id} is disabled")))
    }
}

// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! AWS KMS implementation of the [`Cipher`] capability.
//!
//! Tokens produced by [`KmsCipher::encrypt`] are the standard base64 encoding
//! of the KMS `CiphertextBlob`. The blob already names the key it was produced
//! with; the key id is still sent on decrypt so KMS rejects a token that was
//! sealed under a different key.
//!
//! # Plaintext envelope
//!
//! KMS rejects zero-length plaintext, yet an empty payload is a valid transit
//! request. Every plaintext is therefore prefixed with [`ENVELOPE_VERSION`]
//! before it leaves the process and the byte is checked and stripped after
//! decryption.
//!
//! # Security
//!
//! - The sealed plaintext buffer is zeroized once the request has been sent
//! - No retries happen here; the SDK retry policy is the only one in effect

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_kms::Client;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::EncryptionAlgorithmSpec;
use zeroize::Zeroizing;

use crate::cipher::{Cipher, CipherError};
use crate::constants::{ENVELOPE_VERSION, MAX_KMS_PLAINTEXT};
use crate::utils::{base64_decode, base64_encode};

/// [`Cipher`] backed by AWS KMS symmetric keys.
#[derive(Clone, Debug)]
pub struct KmsCipher {
    client: Client,
}

impl KmsCipher {
    /// Wraps an already configured KMS client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the default AWS configuration chain.
    ///
    /// `endpoint` overrides the KMS endpoint, e.g. for a local KMS emulator.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Config`] when no region can be resolved.
    pub async fn from_env(endpoint: Option<&str>) -> Result<Self, CipherError> {
        let shared_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let region: Option<&Region> = shared_config.region();
        let Some(region) = region else {
            return Err(CipherError::Config(
                "AWS region is not configured (set AWS_REGION or AWS_PROFILE)".to_string(),
            ));
        };

        tracing::debug!(region = %region, endpoint = ?endpoint, "[cipher] creating KMS client");

        let mut builder = aws_sdk_kms::config::Builder::from(&shared_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self::new(Client::from_conf(builder.build())))
    }
}

#[async_trait]
impl Cipher for KmsCipher {
    #[tracing::instrument(skip(self, plaintext), fields(len = plaintext.len()))]
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<String, CipherError> {
        let sealed = seal(plaintext)?;

        let output = self
            .client
            .encrypt()
            .key_id(key_id)
            .encryption_algorithm(EncryptionAlgorithmSpec::SymmetricDefault)
            .plaintext(Blob::new(sealed.as_slice()))
            .send()
            .await
            .map_err(|err| CipherError::Encrypt(DisplayErrorContext(&err).to_string()))?;

        let blob = output
            .ciphertext_blob()
            .ok_or_else(|| CipherError::Encrypt("KMS returned no ciphertext".to_string()))?;

        Ok(base64_encode(blob.as_ref()))
    }

    #[tracing::instrument(skip(self, ciphertext))]
    async fn decrypt(&self, key_id: &str, ciphertext: &str) -> Result<Vec<u8>, CipherError> {
        let blob = base64_decode(ciphertext)
            .map_err(|err| CipherError::Decrypt(format!("invalid ciphertext token: {err}")))?;

        let output = self
            .client
            .decrypt()
            .key_id(key_id)
            .encryption_algorithm(EncryptionAlgorithmSpec::SymmetricDefault)
            .ciphertext_blob(Blob::new(blob))
            .send()
            .await
            .map_err(|err| CipherError::Decrypt(DisplayErrorContext(&err).to_string()))?;

        let sealed = output
            .plaintext()
            .ok_or_else(|| CipherError::Decrypt("KMS returned no plaintext".to_string()))?;

        unseal(sealed.as_ref())
    }
}

/// Prefixes `plaintext` with the envelope version byte.
fn seal(plaintext: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    if plaintext.len() >= MAX_KMS_PLAINTEXT {
        return Err(CipherError::Encrypt(format!(
            "plaintext of {} bytes exceeds the KMS limit of {} bytes",
            plaintext.len(),
            MAX_KMS_PLAINTEXT - 1
        )));
    }

    let mut sealed = Zeroizing::new(Vec::with_capacity(plaintext.len() + 1));
    sealed.push(ENVELOPE_VERSION);
    sealed.extend_from_slice(plaintext);
    Ok(sealed)
}

/// Checks and strips the envelope version byte.
fn unseal(sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
    match sealed.split_first() {
        Some((&ENVELOPE_VERSION, plaintext)) => Ok(plaintext.to_vec()),
        Some((version, _)) => Err(CipherError::Decrypt(format!(
            "unsupported plaintext envelope version {version:#04x}"
        ))),
        None => Err(CipherError::Decrypt("empty plaintext envelope".to_string())),
    }
}

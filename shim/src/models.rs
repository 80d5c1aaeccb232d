// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Wire types of the Vault transit engine subset served by the shim.
//!
//! Missing request fields decode as empty strings, so `{}` is accepted by the
//! JSON layer and then rejected (or encrypted as an empty payload) by the
//! handlers.

use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

/// Body of `PUT /v1/transit/encrypt/{key_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct EncryptRequest {
    /// Base64 encoded plaintext.
    #[serde(default)]
    pub plaintext: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// `vault:v1:` followed by the backend token.
    pub ciphertext: String,
}

/// Body of `PUT /v1/transit/decrypt/{key_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecryptRequest {
    /// Must start with `vault:v1:`.
    #[serde(default)]
    pub ciphertext: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct DecryptResponse {
    /// Base64 encoded plaintext.
    pub plaintext: String,
}

/// Error body shared by every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Transit Cipher
//!
//! The encrypt/decrypt capability behind the Vault transit compatible shim.
//!
//! The shim never performs cryptography itself. Every transit request is handed
//! to an implementation of [`Cipher`], which returns an opaque ciphertext token
//! on encrypt and the original bytes on decrypt.
//!
//! ## Implementations
//!
//! - [`KmsCipher`]: AWS KMS symmetric keys (`SYMMETRIC_DEFAULT`)
//! - [`StubCipher`]: base64 identity, for tests and local experiments

pub mod cipher;
pub mod constants;
pub mod kms;
pub mod stub;
pub mod utils;

pub use cipher::{Cipher, CipherError};
pub use kms::KmsCipher;
pub use stub::StubCipher;

// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

/// Leading byte of every plaintext handed to KMS.
///
/// KMS refuses zero-length plaintext, so payloads travel as
/// `ENVELOPE_VERSION || plaintext`.
pub const ENVELOPE_VERSION: u8 = 0x01;

/// KMS limit on the plaintext size of a single `Encrypt` call.
pub const MAX_KMS_PLAINTEXT: usize = 4096;

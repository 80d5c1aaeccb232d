// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

/// Marker that prefixes every transit ciphertext.
pub const VAULT_PREFIX: &str = "vault:v1:";
/// Path prefix of the encrypt endpoint, followed by `/{key_id}`.
pub const ENCRYPT_PATH: &str = "/v1/transit/encrypt";

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8200";
pub const DEFAULT_COMMAND: &str = "sops";

// Configuration sources, first non-empty value wins
pub const ENV_KEY_ID: [&str; 2] = ["KMS_SHIM_KEY_ID", "AWS_KMS_KEY_ID"];
pub const ENV_SERVER_ADDR: &str = "KMS_SHIM_SERVER_ADDR";
pub const ENV_COMMAND: &str = "KMS_SHIM_COMMAND";
pub const ENV_SERVER_ONLY: &str = "KMS_SHIM_SERVER_ONLY";
pub const ENV_KMS_ENDPOINT: &str = "KMS_SHIM_KMS_ENDPOINT";
pub const ENV_LOG_FORMAT: &str = "KMS_SHIM_LOG_FORMAT";

// Environment handed to the child process
pub const CHILD_ENV_VAULT_ADDR: &str = "VAULT_ADDR";
pub const CHILD_ENV_VAULT_TOKEN: &str = "VAULT_TOKEN";
pub const CHILD_ENV_VAULT_URIS: &str = "SOPS_VAULT_URIS";
/// The shim performs no authentication; sops only needs a non-empty token.
pub const DUMMY_VAULT_TOKEN: &str = "dummy";

/// sops flag that would point it at a different transit endpoint.
pub const CONFLICTING_FLAG: &str = "--hc-vault-transit";

pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const HEALTH_POLL_ATTEMPTS: u32 = 30;

pub const MAX_REQUEST_BODY: usize = 1024 * 1024; // 1 MB

/// Exit code for failures that happen before or around the child process.
pub const EXIT_CODE_ERROR: u8 = 125;

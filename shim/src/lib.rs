// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # sops KMS shim
//!
//! Lets sops encrypt and decrypt data keys with AWS KMS by speaking the
//! HashiCorp Vault transit protocol on a loopback port.
//!
//! ## Architecture
//!
//! ```text
//! sops -> HTTP (Vault transit API) -> shim (this crate) -> Cipher -> AWS KMS
//!  ^                                    |
//!  +------ spawned with SOPS_VAULT_URIS +
//! ```
//!
//! The binary starts the shim on `127.0.0.1:8200`, runs `sops` with the
//! forwarded arguments and exits with sops' exit code. The server is shut down
//! on every exit path.
//!
//! ## Modules
//!
//! - [`application`]: Axum router and the background server lifecycle
//! - [`configuration`]: command line and environment configuration
//! - [`constants`]: protocol constants, defaults and limits
//! - [`errors`]: HTTP and orchestration error types
//! - [`models`]: transit request/response bodies
//! - [`routes`]: `/health`, encrypt and decrypt handlers
//! - [`version`]: `--version` reporting
//! - [`wrapper`]: child process orchestration and server-only mode
//!
//! ## Usage
//!
//! ```bash
//! export KMS_SHIM_KEY_ID=alias/sops
//! sops-kms-shim -e secrets.yaml > secrets.enc.yaml
//! sops-kms-shim -d secrets.enc.yaml
//! ```
//!
//! ## Library usage
//!
//! [`wrapper::run_server`] starts the shim inside another program and returns
//! the environment a sops client needs:
//!
//! ```no_run
//! # async fn example() -> Result<(), sops_kms_shim::errors::ShimError> {
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use transit_cipher::KmsCipher;
//!
//! let cipher = Arc::new(KmsCipher::from_env(None).await?);
//! let cancel = CancellationToken::new();
//! let (env, server) =
//!     sops_kms_shim::wrapper::run_server("127.0.0.1:8200", "alias/sops", cipher, &cancel)
//!         .await?;
//! // point the sops client at env["SOPS_VAULT_URIS"] ...
//! server.shutdown().await?;
//! # let _ = env;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod models;
pub mod routes;
pub mod version;
pub mod wrapper;

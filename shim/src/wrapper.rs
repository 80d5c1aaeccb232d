// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Orchestration of the shim server and the child command (sops).
//!
//! # Wrapper flow
//!
//! 1. Check preconditions: a key id is configured and the forwarded arguments
//!    do not carry their own transit endpoint. Nothing is started otherwise.
//! 2. Start the [`TransitServer`] and wait until it is healthy
//! 3. Spawn the child with inherited stdio and the variables from
//!    [`client_env`]
//! 4. Wait for the child, or kill it when the run is cancelled
//! 5. Shut the server down, whatever happened in 2-4
//!
//! The child is told about the shim only through `SOPS_VAULT_URIS`,
//! `VAULT_ADDR` and `VAULT_TOKEN`; no flag is injected into its arguments.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use transit_cipher::Cipher;

use crate::application::{TransitServer, create_router};
use crate::configuration::Config;
use crate::constants::{
    CHILD_ENV_VAULT_ADDR, CHILD_ENV_VAULT_TOKEN, CHILD_ENV_VAULT_URIS, CONFLICTING_FLAG,
    DUMMY_VAULT_TOKEN, ENCRYPT_PATH,
};
use crate::errors::ShimError;

/// Environment a transit client needs to reach the shim at `addr` for `key_id`.
///
/// Each `/`-separated segment of `key_id` is percent-encoded, so aliases keep
/// their path shape while spaces, `?` or `#` cannot break the URI.
pub fn client_env(addr: SocketAddr, key_id: &str) -> BTreeMap<String, String> {
    let key_path = key_id
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");

    BTreeMap::from([
        (CHILD_ENV_VAULT_ADDR.to_string(), format!("http://{addr}")),
        (CHILD_ENV_VAULT_TOKEN.to_string(), DUMMY_VAULT_TOKEN.to_string()),
        (
            CHILD_ENV_VAULT_URIS.to_string(),
            format!("http://{addr}{ENCRYPT_PATH}/{key_path}"),
        ),
    ])
}

/// Returns the first argument that would point the child at another transit
/// endpoint, either `--hc-vault-transit` or `--hc-vault-transit=<uri>`.
pub fn find_conflicting_argument(args: &[String]) -> Option<&str> {
    args.iter().map(String::as_str).find(|arg| {
        *arg == CONFLICTING_FLAG
            || arg
                .strip_prefix(CONFLICTING_FLAG)
                .is_some_and(|rest| rest.starts_with('='))
    })
}

/// Checks everything that must hold before any server is started.
///
/// Returns the configured key id.
pub fn preflight<'a>(config: &'a Config, args: &[String]) -> Result<&'a str, ShimError> {
    let key_id = config.require_key_id()?;

    if let Some(arg) = find_conflicting_argument(args) {
        return Err(ShimError::ConflictingArgument(arg.to_string()));
    }

    Ok(key_id)
}

/// Starts the shim for `key_id` on `addr` and waits until it is healthy.
///
/// Returns the environment a client must use together with the running
/// server. The caller owns the server and is expected to call
/// [`TransitServer::shutdown`]. If the server never becomes healthy it is shut
/// down before the error is returned.
#[tracing::instrument(skip(cipher, cancel))]
pub async fn run_server(
    addr: &str,
    key_id: &str,
    cipher: Arc<dyn Cipher>,
    cancel: &CancellationToken,
) -> Result<(BTreeMap<String, String>, TransitServer), ShimError> {
    let mut server = TransitServer::start(addr, create_router(cipher)).await?;

    if let Err(err) = server.wait_ready(cancel).await {
        tracing::error!(error = %err, "[shim] server failed to start");
        if let Err(shutdown_err) = server.shutdown().await {
            tracing::error!(error = %shutdown_err, "[shim] server shutdown failed");
        }
        return Err(err);
    }

    Ok((client_env(server.local_addr(), key_id), server))
}

/// Runs the child command behind the shim and returns its exit code.
///
/// A non-zero exit of the child is not an error: the code is returned as is.
/// Errors are reserved for failures that prevent the child from running to
/// completion (preconditions, startup, launch, cancellation).
#[tracing::instrument(skip(config, cipher, cancel), fields(command = %config.command))]
pub async fn run_wrapper(
    config: &Config,
    cipher: Arc<dyn Cipher>,
    args: &[String],
    cancel: &CancellationToken,
) -> Result<i32, ShimError> {
    let key_id = preflight(config, args)?;

    tracing::info!(
        key_id,
        addr = %config.server_addr,
        "[shim] starting Vault transit compatible server for KMS"
    );

    let (env, server) = run_server(&config.server_addr, key_id, cipher, cancel).await?;

    let result = run_child(&config.command, args, &env, cancel).await;

    if let Err(err) = server.shutdown().await {
        tracing::error!(error = %err, "[shim] server shutdown failed");
    }

    result
}

/// Serves until `cancel` fires, for clients started outside the shim.
#[tracing::instrument(skip(config, cipher, cancel))]
pub async fn run_server_only(
    config: &Config,
    cipher: Arc<dyn Cipher>,
    cancel: &CancellationToken,
) -> Result<(), ShimError> {
    let key_id = config.require_key_id()?;

    let (env, mut server) = run_server(&config.server_addr, key_id, cipher, cancel).await?;

    for (name, value) in &env {
        tracing::info!("[shim] client environment: {}={}", name, value);
    }
    tracing::info!("[shim] serving until interrupted");

    let served = server.serve_until_cancelled(cancel).await;
    if let Err(err) = &served {
        tracing::error!(error = %err, "[shim] server stopped unexpectedly");
    }

    let stopped = server.shutdown().await;
    served.and(stopped)
}

#[tracing::instrument(skip(args, env, cancel))]
async fn run_child(
    command: &str,
    args: &[String],
    env: &BTreeMap<String, String>,
    cancel: &CancellationToken,
) -> Result<i32, ShimError> {
    tracing::info!(?args, "[shim] server started successfully, executing command");

    let mut child = Command::new(command)
        .args(args)
        .envs(env)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ShimError::Spawn {
            command: command.to_string(),
            source,
        })?;

    tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|source| ShimError::Wait {
                command: command.to_string(),
                source,
            })?;
            let code = exit_code(status);
            tracing::debug!(code, "[shim] command exited");
            Ok(code)
        }
        _ = cancel.cancelled() => {
            tracing::warn!("[shim] cancelled, terminating command");
            if let Err(err) = child.kill().await {
                tracing::error!(error = %err, "[shim] failed to terminate command");
            }
            Err(ShimError::Cancelled)
        }
    }
}

/// Maps a child's termination to the shim's own exit code.
///
/// Normal exits keep their code; on Unix a signal `n` maps to `128 + n`, the
/// shell convention.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    i32::from(crate::constants::EXIT_CODE_ERROR)
}

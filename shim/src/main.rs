// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sops_kms_shim::configuration::{Cli, Config, LogFormat};
use sops_kms_shim::constants::EXIT_CODE_ERROR;
use sops_kms_shim::{version, wrapper};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use transit_cipher::{Cipher, KmsCipher};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
    );

    // stdout belongs to the child command
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().with_current_span(false).init(),
    }
}

/// Cancels `cancel` on SIGINT, and on SIGTERM where available.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "[shim] unable to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    tracing::warn!(error = %err, "[shim] unable to listen for SIGINT");
                    return;
                }
                tracing::info!("[shim] received SIGINT");
            }
            _ = terminate => tracing::info!("[shim] received SIGTERM"),
        }

        cancel.cancel();
    });
}

async fn print_version() -> Result<()> {
    let command = Config::command_from_lookup(|name| std::env::var(name).ok());
    let mut stdout = std::io::stdout();
    version::show_version(&command, &mut stdout)
        .await
        .with_context(|| format!("failed to execute {command} --version"))
}

async fn run(cli: Cli, config: Config) -> Result<i32> {
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    // fail on configuration problems before talking to AWS
    if config.server_only {
        config.require_key_id()?;
    } else {
        wrapper::preflight(&config, &cli.args)?;
    }

    let cipher: Arc<dyn Cipher> = Arc::new(
        KmsCipher::from_env(config.kms_endpoint.as_deref())
            .await
            .context("failed to create cipher")?,
    );

    if config.server_only {
        wrapper::run_server_only(&config, cipher, &cancel).await?;
        return Ok(0);
    }

    Ok(wrapper::run_wrapper(&config, cipher, &cli.args, &cancel).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config::from_env();
    init_tracing(
        config
            .as_ref()
            .map(|config| config.log_format)
            .unwrap_or_default(),
    );

    if cli.wants_version() {
        return match print_version().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                tracing::error!("[shim] {:#}", err);
                ExitCode::from(EXIT_CODE_ERROR)
            }
        };
    }

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "[shim] invalid configuration");
            return ExitCode::from(EXIT_CODE_ERROR);
        }
    };

    tracing::debug!("[shim] {:?}", &config);

    match run(cli, config).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(EXIT_CODE_ERROR)),
        Err(err) => {
            tracing::error!("[shim] {:#}", err);
            ExitCode::from(EXIT_CODE_ERROR)
        }
    }
}

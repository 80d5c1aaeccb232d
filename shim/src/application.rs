// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Router construction and the lifecycle of the background HTTP server.
//!
//! A [`TransitServer`] moves through *starting -> ready -> shutting down ->
//! stopped*:
//!
//! 1. [`TransitServer::start`] binds the listener and spawns the serve task.
//!    A failed bind is reported here, nothing is spawned in that case.
//! 2. [`TransitServer::wait_ready`] polls `GET /health` until it answers,
//!    racing the poll against an early exit of the serve task and against
//!    cancellation.
//! 3. [`TransitServer::serve_until_cancelled`] keeps the server up until
//!    cancellation, or reports the serve task dying underneath it.
//! 4. [`TransitServer::shutdown`] stops accepting connections and waits for
//!    in-flight requests. Dropping the handle triggers the same graceful
//!    shutdown without waiting for it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use transit_cipher::Cipher;

use crate::constants::{HEALTH_POLL_ATTEMPTS, HEALTH_POLL_INTERVAL, MAX_REQUEST_BODY};
use crate::errors::ShimError;
use crate::routes;

pub struct AppState {
    pub cipher: Arc<dyn Cipher>,
}

impl AppState {
    pub fn new(cipher: Arc<dyn Cipher>) -> Self {
        Self { cipher }
    }
}

/// Builds the transit router around `cipher`.
pub fn create_router(cipher: Arc<dyn Cipher>) -> Router {
    let state = Arc::new(AppState::new(cipher));

    Router::new()
        .route("/health", get(routes::health))
        // KMS aliases and ARNs contain `/`
        .route("/v1/transit/encrypt/{*key_id}", put(routes::encrypt))
        .route("/v1/transit/decrypt/{*key_id}", put(routes::decrypt))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle to the HTTP server running on a background task.
pub struct TransitServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    failed: Option<oneshot::Receiver<std::io::Error>>,
    task: Option<JoinHandle<()>>,
}

impl TransitServer {
    /// Binds `addr` and starts serving `router` in the background.
    ///
    /// Returns as soon as the listener is bound; call
    /// [`wait_ready`](Self::wait_ready) before sending traffic.
    ///
    /// # Errors
    ///
    /// - [`ShimError::Bind`] - the address is invalid or already in use
    #[tracing::instrument(skip(router))]
    pub async fn start(addr: &str, router: Router) -> Result<Self, ShimError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ShimError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (failed_tx, failed_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    // fires on an explicit shutdown and when the handle is dropped
                    let _ = shutdown_rx.await;
                })
                .await;

            if let Err(err) = result {
                tracing::error!(error = %err, "[shim] server error");
                let _ = failed_tx.send(err);
            }
        });

        tracing::info!("[shim] listening at http://{}", local_addr);

        Ok(Self {
            local_addr,
            shutdown: Some(shutdown_tx),
            failed: Some(failed_rx),
            task: Some(task),
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits until `GET /health` answers `200 OK`.
    ///
    /// Each attempt is bounded by [`HEALTH_POLL_INTERVAL`] and attempts are
    /// spaced by the same interval, up to [`HEALTH_POLL_ATTEMPTS`].
    ///
    /// # Errors
    ///
    /// - [`ShimError::Unhealthy`] - attempts exhausted
    /// - [`ShimError::ServerFailed`] - the serve task exited with an error
    /// - [`ShimError::Cancelled`] - `cancel` fired first
    #[tracing::instrument(skip(self, cancel), fields(addr = %self.local_addr))]
    pub async fn wait_ready(&mut self, cancel: &CancellationToken) -> Result<(), ShimError> {
        let url = format!("http://{}/health", self.local_addr);

        tokio::select! {
            result = poll_health(&url) => result,
            err = self.stopped() => Err(err),
            _ = cancel.cancelled() => Err(ShimError::Cancelled),
        }
    }

    /// Serves until `cancel` fires.
    ///
    /// # Errors
    ///
    /// - [`ShimError::ServerFailed`] - the serve task exited before `cancel`
    #[tracing::instrument(skip(self, cancel), fields(addr = %self.local_addr))]
    pub async fn serve_until_cancelled(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<(), ShimError> {
        tokio::select! {
            err = self.stopped() => Err(err),
            _ = cancel.cancelled() => Ok(()),
        }
    }

    /// Resolves once the serve task has exited on its own.
    ///
    /// Pending for as long as the server runs. Safe to race in `select!`,
    /// the failure report is only consumed once it arrived.
    async fn stopped(&mut self) -> ShimError {
        let Some(failed) = self.failed.as_mut() else {
            return std::future::pending().await;
        };

        let result = failed.await;
        self.failed = None;

        match result {
            Ok(err) => ShimError::ServerFailed(err),
            Err(_) => ShimError::ServerFailed(std::io::Error::other("server task exited")),
        }
    }

    /// Stops accepting connections and waits for in-flight requests.
    #[tracing::instrument(skip(self), fields(addr = %self.local_addr))]
    pub async fn shutdown(mut self) -> Result<(), ShimError> {
        tracing::info!("[shim] shutting down server");

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.map_err(|err| ShimError::Join(err.to_string()))?;
        }

        tracing::debug!("[shim] server stopped");

        Ok(())
    }
}

impl Drop for TransitServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            tracing::warn!(
                addr = %self.local_addr,
                "[shim] server handle dropped, shutting down in the background"
            );
            let _ = shutdown.send(());
        }
    }
}

async fn poll_health(url: &str) -> Result<(), ShimError> {
    let client = reqwest::Client::builder()
        .timeout(HEALTH_POLL_INTERVAL)
        .no_proxy()
        .build()
        .map_err(ShimError::HealthClient)?;

    for attempt in 1..=HEALTH_POLL_ATTEMPTS {
        match client.get(url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                tracing::debug!(attempt, "[shim] server is healthy");
                return Ok(());
            }
            Ok(response) => {
                tracing::debug!(attempt, status = %response.status(), "[shim] health check failed");
            }
            Err(err) => {
                tracing::debug!(attempt, error = %err, "[shim] health check failed");
            }
        }
        tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
    }

    Err(ShimError::Unhealthy {
        attempts: HEALTH_POLL_ATTEMPTS,
    })
}

//! # HTTP Server
//!
//! Serves the broker API over the provisioning controller and owns the
//! policy for fatal provisioning failures: when enabled, the first one
//! stops the server and is returned from [`BrokerServer::serve`] so the
//! process exits non-zero and its supervisor restarts it.

pub mod broker_routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::broker::{AdminBackend, BrokerConfig, BrokerError, BrokerResult, ProvisioningController};

pub use broker_routes::{broker_routes, BrokerState};

/// Latch for the first fatal error seen while serving
#[derive(Clone)]
pub struct HaltSignal {
    enabled: bool,
    sender: Arc<watch::Sender<Option<BrokerError>>>,
}

impl HaltSignal {
    pub fn new(enabled: bool) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            enabled,
            sender: Arc::new(sender),
        }
    }

    /// Record an error; only fatal errors trip the latch, and only once
    pub fn report(&self, err: &BrokerError) {
        if !self.enabled || !err.is_fatal() {
            return;
        }

        let tripped = self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(err.clone());
            true
        });
        if tripped {
            error!(error = %err, "Fatal provisioning failure, halting broker");
        }
    }

    /// The error that tripped the latch, if any
    pub fn reason(&self) -> Option<BrokerError> {
        self.sender.borrow().clone()
    }

    /// Resolves once the latch trips
    pub async fn halted(&self) {
        let mut receiver = self.sender.subscribe();
        let _ = receiver.wait_for(Option::is_some).await;
    }
}

/// Broker API server
pub struct BrokerServer<B> {
    state: Arc<BrokerState<B>>,
    listen_port: u16,
}

impl<B: AdminBackend + 'static> BrokerServer<B> {
    pub fn new(controller: ProvisioningController<B>, config: &BrokerConfig) -> Self {
        let halt = HaltSignal::new(config.halt_on_provisioning_failure);
        Self {
            state: Arc::new(BrokerState::new(Arc::new(controller), halt)),
            listen_port: config.listen_port,
        }
    }

    /// Router with request tracing
    pub fn router(&self) -> Router {
        broker_routes(self.state.clone()).layer(TraceLayer::new_for_http())
    }

    /// Serve until interrupted or halted by a fatal error.
    ///
    /// Returns the fatal error when the server halted because of one.
    pub async fn serve(self) -> BrokerResult<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.listen_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| BrokerError::Internal {
                message: format!("failed to bind to {}: {}", addr, e),
            })?;

        info!(port = self.listen_port, "Starting broker API server");

        let halt = self.state.halt().clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal(halt.clone()))
            .await
            .map_err(|e| BrokerError::Internal {
                message: format!("server error: {}", e),
            })?;

        match halt.reason() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn shutdown_signal(halt: HaltSignal) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
        _ = halt.halted() => info!("Shutting down after fatal error"),
    }
}

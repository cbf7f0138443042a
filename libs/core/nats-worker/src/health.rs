//! Probe endpoints for K8s.

use crate::connection::{unique_client_name, ConnectionSettings};
use crate::error::NatsError;
use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const HEALTHY_BODY: &str = "I'm healthy";
pub const NOT_LIVE_BODY: &str = "I'm not live";
pub const READY_BODY: &str = "I'm ready";
pub const METRICS_BODY: &str = "Nothing";

/// Verifies that the broker can be reached.
#[async_trait]
pub trait BrokerProbe: Send + Sync {
    async fn probe(&self) -> Result<(), NatsError>;
}

/// Probes by opening a fresh connection and closing it again.
///
/// Every call uses a new connection name, the configured client name with a
/// timestamp appended, so probes never collide with the worker's connection.
#[derive(Debug, Clone)]
pub struct NatsProbe {
    settings: ConnectionSettings,
}

impl NatsProbe {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl BrokerProbe for NatsProbe {
    async fn probe(&self) -> Result<(), NatsError> {
        let name = unique_client_name(&self.settings.client_name, Utc::now());
        let client = self.settings.with_client_name(name).connect().await?;

        client
            .flush()
            .await
            .map_err(|e| NatsError::Flush(e.to_string()))?;

        // Dropping the last handle closes the connection
        drop(client);
        Ok(())
    }
}

/// Probe server: `/healthz`, `/ready`, `/metrics`.
pub struct HealthServer {
    port: u16,
    probe: Arc<dyn BrokerProbe>,
}

impl HealthServer {
    /// Create a new probe server.
    pub fn new(port: u16, probe: impl BrokerProbe + 'static) -> Self {
        Self {
            port,
            probe: Arc::new(probe),
        }
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/healthz", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.probe.clone())
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let addr = format!("0.0.0.0:{}", self.port);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %addr, "Starting probe server");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Probe server stopped");
        Ok(())
    }
}

/// Liveness: 200 if a throwaway broker connection succeeds, 503 otherwise.
async fn health_handler(State(probe): State<Arc<dyn BrokerProbe>>) -> impl IntoResponse {
    match probe.probe().await {
        Ok(()) => {
            debug!("Liveness probe succeeded");
            (StatusCode::OK, HEALTHY_BODY)
        }
        Err(e) => {
            error!(error = %e, "Liveness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, NOT_LIVE_BODY)
        }
    }
}

/// Readiness: always ready.
async fn ready_handler() -> &'static str {
    READY_BODY
}

/// Placeholder, no metrics are collected.
async fn metrics_handler() -> &'static str {
    METRICS_BODY
}

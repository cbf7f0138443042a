//! Durable demo consumer (NATS JetStream)
//!
//! Subscribes to `demo` through a durable consumer, spends 30 seconds on each
//! message, acknowledges it, and serves K8s probes on `LISTEN_PORT`.
//!
//! ## Architecture
//!
//! ```text
//! NATS JetStream (stream = STAN_CLUSTERID, subject = demo)
//!   ↓ (durable consumer: i-will-remember, max_ack_pending = 1)
//! NatsWorker<SlowProcessor>
//!   ↓ (log, sleep 30s)
//! ack
//!
//! HealthServer
//!   /healthz  → throwaway broker connection
//!   /ready    → always ready
//!   /metrics  → placeholder
//! ```
//!
//! ## Exit codes
//!
//! - `2`: missing configuration, or the broker is unreachable at startup
//! - `1`: the probe server or the worker failed after startup
//! - `0`: clean shutdown on SIGINT/SIGTERM

pub mod config;
pub mod processor;

use crate::config::DemoConfig;
use crate::processor::SlowProcessor;
use core_config::{ConfigError, Environment, FromEnv};
use nats_worker::{HealthServer, NatsError, NatsProbe, NatsWorker};
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Why the service stopped.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("failed to connect to NATS")]
    Connect(#[source] NatsError),

    #[error("failed to create durable subscription")]
    Subscribe(#[source] NatsError),

    #[error("worker stopped unexpectedly")]
    Worker(#[source] NatsError),

    #[error("probe server failed")]
    Server(#[source] std::io::Error),
}

impl StartupError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::Config(_) | StartupError::Connect(_) | StartupError::Subscribe(_) => 2,
            StartupError::Worker(_) | StartupError::Server(_) => 1,
        }
    }
}

/// Run the service.
///
/// 1. Sets up structured logging (JSON for prod, pretty for dev)
/// 2. Reads the configuration; nothing touches the network before this succeeds
/// 3. Connects to NATS and creates the durable subscription
/// 4. Runs the worker and the probe server until SIGINT/SIGTERM
///
/// # Errors
///
/// See [`StartupError::exit_code`] for how each failure maps to an exit code.
pub async fn run() -> Result<(), StartupError> {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        "Starting durable demo consumer"
    );

    let config = DemoConfig::from_env()
        .inspect_err(|e| error!(error = %e, "Missing required configuration"))?;
    info!(
        cluster_id = %config.cluster_id,
        client_id = %config.client_id,
        listen_port = config.listen_port,
        "Configuration loaded"
    );

    let settings = config.connection_settings();
    let client = settings.connect().await.map_err(StartupError::Connect)?;
    let jetstream = async_nats::jetstream::new(client);

    let processor = SlowProcessor::default();
    let worker = NatsWorker::new(jetstream, processor, config.worker_config())
        .await
        .map_err(StartupError::Subscribe)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let health_server = HealthServer::new(config.listen_port, NatsProbe::new(settings));
    let server = health_server.run(shutdown_requested(shutdown_rx.clone()));
    tokio::pin!(server);

    tokio::select! {
        result = worker.run(shutdown_rx) => {
            result.map_err(StartupError::Worker)?;
            server.await.map_err(StartupError::Server)?;
        }
        result = &mut server => {
            result.map_err(StartupError::Server)?;
        }
    }

    info!("Durable demo consumer stopped");
    Ok(())
}

/// Resolves once the shutdown flag is set.
async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }
}

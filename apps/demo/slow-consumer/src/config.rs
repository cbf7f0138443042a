//! Service configuration, read once from the environment.

use core_config::{env_non_empty, env_optional, ConfigError, FromEnv};
use nats_worker::{ConnectionSettings, SubscriptionConfig, WorkerConfig};
use tracing::warn;

/// Port used when `LISTEN_PORT` is absent or invalid.
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

/// The demo subscription: one durable consumer on `demo`, one message at a time.
pub struct DemoSubscription;

impl SubscriptionConfig for DemoSubscription {
    const SUBJECT: &'static str = "demo";
    const DURABLE_NAME: &'static str = "i-will-remember";
    const MAX_INFLIGHT: i64 = 1;
    // Must outlast the processing delay, or the broker redelivers mid-flight
    const ACK_WAIT_SECS: u64 = 60;
}

/// Immutable service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// `NATS_URL`: broker override, `None` uses the client default
    pub nats_url: Option<String>,

    /// `STAN_CLUSTERID`: names the JetStream stream holding the subject
    pub cluster_id: String,

    /// `STAN_CLIENTID`: connection name of the long-lived connection
    pub client_id: String,

    /// `LISTEN_PORT`: probe server port
    pub listen_port: u16,
}

impl FromEnv for DemoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let cluster_id = env_non_empty("STAN_CLUSTERID")?;
        let client_id = env_non_empty("STAN_CLIENTID")?;

        Ok(Self {
            nats_url: env_optional("NATS_URL"),
            cluster_id,
            client_id,
            listen_port: parse_listen_port(env_optional("LISTEN_PORT").as_deref()),
        })
    }
}

impl DemoConfig {
    /// Settings for the long-lived connection (and the probe's throwaway ones).
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings::new(self.nats_url.clone(), self.client_id.clone())
    }

    /// Durable subscription on the cluster's stream.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::from_subscription::<DemoSubscription>(self.cluster_id.clone())
    }
}

/// Use the given port when it is a valid, positive port number.
pub fn parse_listen_port(raw: Option<&str>) -> u16 {
    let Some(raw) = raw else {
        return DEFAULT_LISTEN_PORT;
    };

    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => {
            warn!(value = %raw, default = DEFAULT_LISTEN_PORT, "Invalid LISTEN_PORT, using default");
            DEFAULT_LISTEN_PORT
        }
    }
}

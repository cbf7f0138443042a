//! NATS connection settings.

use crate::error::NatsError;
use async_nats::{Client, ConnectOptions};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// URL used when no override is configured.
pub const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Broker URL override; `None` means [`DEFAULT_NATS_URL`]
    pub url: Option<String>,

    /// Connection name reported to the broker
    pub client_name: String,
}

impl ConnectionSettings {
    /// Create connection settings.
    pub fn new(url: Option<String>, client_name: impl Into<String>) -> Self {
        Self {
            url,
            client_name: client_name.into(),
        }
    }

    /// The URL that will actually be dialed.
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_NATS_URL)
    }

    /// Same broker, different connection name.
    pub fn with_client_name(&self, client_name: impl Into<String>) -> Self {
        Self {
            url: self.url.clone(),
            client_name: client_name.into(),
        }
    }

    /// Open a connection.
    ///
    /// Fails immediately if the broker cannot be reached; there is no retry.
    pub async fn connect(&self) -> Result<Client, NatsError> {
        debug!(url = %self.url(), name = %self.client_name, "Connecting to NATS");
        let client = ConnectOptions::new()
            .name(&self.client_name)
            .connect(self.url())
            .await?;
        info!(url = %self.url(), name = %self.client_name, "Connected to NATS");
        Ok(client)
    }
}

/// Derive a one-off client name by appending a timestamp to `base`.
pub fn unique_client_name(base: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}", base, at.format("%Y%m%d%H%M%S%6f"))
}

//! NATS test infrastructure
//!
//! Provides a `TestNats` helper that creates a NATS container with JetStream for testing.

use async_nats::Client;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::nats::Nats;

/// Test NATS wrapper that ensures proper cleanup
///
/// The container is stopped and removed when this struct is dropped.
/// JetStream is enabled.
pub struct TestNats {
    #[allow(dead_code)]
    container: ContainerAsync<Nats>,
    client: Client,
    pub connection_string: String,
}

impl TestNats {
    /// Start a NATS container with JetStream (`-js`).
    pub async fn new() -> Self {
        let container = Nats::default()
            .with_tag("latest")
            .with_cmd(["-js"])
            .start()
            .await
            .expect("Failed to start NATS container");

        let host_port = container
            .get_host_port_ipv4(4222)
            .await
            .expect("Failed to get NATS port");

        let connection_string = format!("nats://127.0.0.1:{}", host_port);

        let client = async_nats::connect(&connection_string)
            .await
            .expect("Failed to connect to NATS");

        tracing::info!(port = host_port, "Test NATS ready with JetStream");

        Self {
            container,
            client,
            connection_string,
        }
    }

    /// Get a cloned client
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Get a JetStream context
    pub fn jetstream(&self) -> async_nats::jetstream::Context {
        async_nats::jetstream::new(self.client.clone())
    }

    /// Get the connection string for manual client creation
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Number of messages the durable consumer has delivered but not yet
    /// had acknowledged.
    pub async fn ack_pending(&self, stream: &str, durable: &str) -> usize {
        let stream = self
            .jetstream()
            .get_stream(stream)
            .await
            .expect("Failed to get stream");
        let mut consumer = stream
            .get_consumer::<async_nats::jetstream::consumer::pull::Config>(durable)
            .await
            .expect("Failed to get consumer");
        consumer
            .info()
            .await
            .expect("Failed to get consumer info")
            .num_ack_pending
    }

    /// Stream sequence up to which the durable consumer has had every
    /// message acknowledged.
    pub async fn ack_floor(&self, stream: &str, durable: &str) -> u64 {
        let stream = self
            .jetstream()
            .get_stream(stream)
            .await
            .expect("Failed to get stream");
        let mut consumer = stream
            .get_consumer::<async_nats::jetstream::consumer::pull::Config>(durable)
            .await
            .expect("Failed to get consumer");
        consumer
            .info()
            .await
            .expect("Failed to get consumer info")
            .ack_floor
            .stream_sequence
    }
}

impl Drop for TestNats {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test NATS container");
    }
}

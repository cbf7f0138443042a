//! NATS JetStream producer for publishing messages.

use crate::config::{SubscriptionConfig, WorkerConfig};
use crate::error::NatsError;
use async_nats::jetstream::Context;
use tracing::debug;

/// Publishes raw payloads to a subject captured by a stream.
pub struct NatsProducer {
    jetstream: Context,
    stream_name: String,
    subject: String,
}

impl NatsProducer {
    /// Create a new NATS producer.
    pub fn new(jetstream: Context, stream_name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            jetstream,
            stream_name: stream_name.into(),
            subject: subject.into(),
        }
    }

    /// Create a producer targeting a subscription's subject.
    pub fn for_subscription<S: SubscriptionConfig>(
        jetstream: Context,
        stream_name: impl Into<String>,
    ) -> Self {
        Self::new(jetstream, stream_name, S::SUBJECT)
    }

    /// Create a producer matching a worker's stream and subject.
    pub fn for_worker(jetstream: Context, config: &WorkerConfig) -> Self {
        Self::new(jetstream, config.stream_name.clone(), config.subject.clone())
    }

    /// Get the subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Publish a payload and wait for the stream to store it.
    ///
    /// Returns the stream sequence number of the message.
    pub async fn send(&self, payload: impl Into<Vec<u8>>) -> Result<u64, NatsError> {
        let payload: Vec<u8> = payload.into();

        let ack = self
            .jetstream
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| NatsError::publish_error(e.to_string()))?
            .await
            .map_err(|e| NatsError::publish_error(e.to_string()))?;

        debug!(
            stream = %self.stream_name,
            subject = %self.subject,
            sequence = ack.sequence,
            "Published message"
        );

        Ok(ack.sequence)
    }
}

//! Durable NATS JetStream consumer.

use crate::config::WorkerConfig;
use crate::error::NatsError;
use async_nats::jetstream::consumer::pull::{Config as ConsumerConfig, Stream as MessageStream};
use async_nats::jetstream::consumer::{AckPolicy, Consumer};
use async_nats::jetstream::stream::Config as StreamConfig;
use async_nats::jetstream::Context;
use tracing::{debug, info};

/// Durable, manually acknowledged consumer on a single subject.
pub struct NatsConsumer {
    jetstream: Context,
    config: WorkerConfig,
}

impl NatsConsumer {
    /// Create a new NATS consumer.
    pub fn new(jetstream: Context, config: WorkerConfig) -> Self {
        Self { jetstream, config }
    }

    /// Get the worker configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Ensure the stream exists, creating it if necessary.
    pub async fn ensure_stream(&self) -> Result<(), NatsError> {
        match self.jetstream.get_stream(&self.config.stream_name).await {
            Ok(mut stream) => {
                let info = stream.info().await.map_err(NatsError::from_jetstream_error)?;
                debug!(
                    stream = %self.config.stream_name,
                    messages = info.state.messages,
                    "Stream already exists"
                );
                Ok(())
            }
            Err(_) => {
                info!(
                    stream = %self.config.stream_name,
                    subject = %self.config.subject,
                    "Creating stream"
                );

                self.jetstream
                    .create_stream(StreamConfig {
                        name: self.config.stream_name.clone(),
                        subjects: vec![self.config.subject.clone()],
                        ..Default::default()
                    })
                    .await
                    .map_err(NatsError::from_jetstream_error)?;

                info!(stream = %self.config.stream_name, "Stream created");
                Ok(())
            }
        }
    }

    /// Ensure the durable consumer exists, creating it if necessary.
    pub async fn ensure_consumer(&self) -> Result<Consumer<ConsumerConfig>, NatsError> {
        let stream = self
            .jetstream
            .get_stream(&self.config.stream_name)
            .await
            .map_err(NatsError::from_jetstream_error)?;

        match stream
            .get_consumer::<ConsumerConfig>(&self.config.durable_name)
            .await
        {
            Ok(consumer) => {
                debug!(durable = %self.config.durable_name, "Consumer already exists");
                Ok(consumer)
            }
            Err(_) => {
                info!(
                    durable = %self.config.durable_name,
                    stream = %self.config.stream_name,
                    max_inflight = self.config.max_inflight,
                    "Creating durable consumer"
                );

                let consumer = stream
                    .create_consumer(self.consumer_config())
                    .await
                    .map_err(NatsError::from_jetstream_error)?;

                info!(durable = %self.config.durable_name, "Consumer created");
                Ok(consumer)
            }
        }
    }

    /// Consumer settings for this worker.
    pub fn consumer_config(&self) -> ConsumerConfig {
        consumer_config(&self.config)
    }

    /// Initialize stream and consumer.
    pub async fn init(&self) -> Result<(), NatsError> {
        self.ensure_stream().await?;
        self.ensure_consumer().await?;
        Ok(())
    }

    /// Open the continuous message stream of the durable consumer.
    pub async fn messages(&self) -> Result<MessageStream, NatsError> {
        let consumer = self.ensure_consumer().await?;

        consumer
            .stream()
            .max_messages_per_batch(self.config.channel_capacity())
            .messages()
            .await
            .map_err(|e| NatsError::consumer_error(e.to_string()))
    }
}

/// Durable, explicit ack, bounded inflight.
fn consumer_config(config: &WorkerConfig) -> ConsumerConfig {
    ConsumerConfig {
        durable_name: Some(config.durable_name.clone()),
        name: Some(config.durable_name.clone()),
        ack_policy: AckPolicy::Explicit,
        ack_wait: config.ack_wait,
        max_ack_pending: config.max_inflight,
        filter_subject: config.subject.clone(),
        ..Default::default()
    }
}

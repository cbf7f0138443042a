//! Error types for the NATS worker.

use thiserror::Error;

/// Error that can occur in NATS worker operations.
#[derive(Debug, Error)]
pub enum NatsError {
    /// NATS connection error
    #[error("NATS connection error: {0}")]
    Connection(#[from] async_nats::ConnectError),

    /// Connection established but the round trip failed
    #[error("NATS flush error: {0}")]
    Flush(String),

    /// JetStream error (stream or consumer management)
    #[error("JetStream error: {0}")]
    JetStream(String),

    /// Consumer error (message stream)
    #[error("Consumer error: {0}")]
    Consumer(String),

    /// Acknowledgment error
    #[error("Ack error: {0}")]
    Ack(String),

    /// Publish error
    #[error("Publish error: {0}")]
    Publish(String),
}

impl NatsError {
    /// Create a JetStream error from an async_nats error.
    pub fn from_jetstream_error(error: impl std::fmt::Display) -> Self {
        Self::JetStream(error.to_string())
    }

    /// Create a consumer error.
    pub fn consumer_error(msg: impl Into<String>) -> Self {
        Self::Consumer(msg.into())
    }

    /// Create an ack error.
    pub fn ack_error(msg: impl Into<String>) -> Self {
        Self::Ack(msg.into())
    }

    /// Create a publish error.
    pub fn publish_error(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }
}

/// Error returned by a [`Processor`](crate::Processor).
///
/// A failed message is never acknowledged; the broker redelivers it once the
/// ack wait expires.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Processing failed
    #[error("processing failed: {message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ProcessingError {
    /// Create a processing failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a processing failure with a source.
    pub fn failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

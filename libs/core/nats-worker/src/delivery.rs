//! Messages handed to the worker.

use crate::error::NatsError;
use async_trait::async_trait;
use std::borrow::Cow;
use tracing::warn;

/// A message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Subject the message was published on.
    pub subject: String,
    /// Raw body.
    pub payload: Vec<u8>,
    /// Stream sequence number.
    pub sequence: u64,
    /// Number of delivery attempts, starting at 1.
    pub delivered: i64,
}

impl Delivery {
    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Check if this is a redelivery.
    pub fn is_redelivery(&self) -> bool {
        self.delivered > 1
    }
}

/// Confirms a message to the broker.
#[async_trait]
pub trait Acknowledge: Send + Sync {
    async fn acknowledge(&self) -> Result<(), NatsError>;
}

#[async_trait]
impl Acknowledge for async_nats::jetstream::Message {
    async fn acknowledge(&self) -> Result<(), NatsError> {
        self.ack()
            .await
            .map_err(|e| NatsError::ack_error(e.to_string()))
    }
}

/// A delivery that has not been acknowledged yet.
pub struct InFlight {
    pub delivery: Delivery,
    acker: Box<dyn Acknowledge>,
}

impl InFlight {
    /// Pair a delivery with its acknowledgment handle.
    pub fn new(delivery: Delivery, acker: impl Acknowledge + 'static) -> Self {
        Self {
            delivery,
            acker: Box::new(acker),
        }
    }

    /// Wrap a JetStream message.
    pub fn from_message(message: async_nats::jetstream::Message) -> Self {
        let (sequence, delivered) = match message.info() {
            Ok(info) => (info.stream_sequence, info.delivered),
            Err(e) => {
                warn!(error = %e, "Failed to get message info, using defaults");
                (0, 1)
            }
        };

        let delivery = Delivery {
            subject: message.subject.to_string(),
            payload: message.payload.to_vec(),
            sequence,
            delivered,
        };

        Self::new(delivery, message)
    }

    /// Acknowledge the message. Consumes it, so it can only happen once.
    pub async fn ack(self) -> Result<(), NatsError> {
        self.acker.acknowledge().await
    }
}

impl std::fmt::Debug for InFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight")
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingAck(Arc<AtomicUsize>);

    #[async_trait]
    impl Acknowledge for CountingAck {
        async fn acknowledge(&self) -> Result<(), NatsError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn delivery(payload: &[u8], delivered: i64) -> Delivery {
        Delivery {
            subject: "demo".to_string(),
            payload: payload.to_vec(),
            sequence: 7,
            delivered,
        }
    }

    #[test]
    fn test_text_is_lossy() {
        assert_eq!(delivery(b"hello", 1).text(), "hello");
        assert_eq!(delivery(&[0x68, 0xff, 0x69], 1).text(), "h\u{fffd}i");
    }

    #[test]
    fn test_is_redelivery() {
        assert!(!delivery(b"x", 1).is_redelivery());
        assert!(delivery(b"x", 2).is_redelivery());
    }

    #[tokio::test]
    async fn test_ack_calls_acknowledger() {
        let count = Arc::new(AtomicUsize::new(0));
        let inflight = InFlight::new(delivery(b"x", 1), CountingAck(count.clone()));
        assert!(format!("{:?}", inflight).contains("demo"));

        inflight.ack().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

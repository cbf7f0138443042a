//! The demo's message handler: log, sleep, succeed.

use async_trait::async_trait;
use nats_worker::{Delivery, ProcessingError, Processor};
use std::time::Duration;
use tracing::info;

/// Stand-in for real work.
pub const PROCESSING_DELAY: Duration = Duration::from_secs(30);

/// Logs each message and then holds the single in-flight slot for a fixed delay.
#[derive(Debug, Clone)]
pub struct SlowProcessor {
    delay: Duration,
}

impl SlowProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SlowProcessor {
    fn default() -> Self {
        Self::new(PROCESSING_DELAY)
    }
}

#[async_trait]
impl Processor for SlowProcessor {
    async fn process(&self, delivery: &Delivery) -> Result<(), ProcessingError> {
        info!(subject = %delivery.subject, "Received subject");
        info!(
            sequence = delivery.sequence,
            redelivered = delivery.is_redelivery(),
            message = %delivery.text(),
            "Received message"
        );

        info!(delay_secs = self.delay.as_secs(), "Starting long processing");
        tokio::time::sleep(self.delay).await;
        info!(sequence = delivery.sequence, "Long processing finished");

        Ok(())
    }

    fn name(&self) -> &'static str {
        "slow_processor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nats_worker::{handle_delivery, Acknowledge, InFlight, NatsError, Outcome};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    struct FlagAck(Arc<AtomicBool>);

    #[async_trait]
    impl Acknowledge for FlagAck {
        async fn acknowledge(&self) -> Result<(), NatsError> {
            self.0.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn delivery() -> Delivery {
        Delivery {
            subject: "demo".to_string(),
            payload: b"hello".to_vec(),
            sequence: 1,
            delivered: 1,
        }
    }

    #[test]
    fn test_default_delay_is_thirty_seconds() {
        assert_eq!(SlowProcessor::default().delay(), Duration::from_secs(30));
        assert_eq!(SlowProcessor::default().name(), "slow_processor");
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_takes_the_full_delay() {
        let start = Instant::now();
        SlowProcessor::default().process(&delivery()).await.unwrap();
        assert!(start.elapsed() >= PROCESSING_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ack_only_after_delay() {
        let acked = Arc::new(AtomicBool::new(false));
        let inflight = InFlight::new(delivery(), FlagAck(acked.clone()));

        let task = tokio::spawn(async move {
            let processor = SlowProcessor::default();
            handle_delivery(&processor, inflight).await
        });

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(!acked.load(Ordering::SeqCst));

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, Outcome::Acknowledged);
        assert!(acked.load(Ordering::SeqCst));
    }
}

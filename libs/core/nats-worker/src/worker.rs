//! Single-slot worker for a durable subscription.
//!
//! A feeder task drains the consumer's message stream into a bounded channel;
//! the worker loop takes one message at a time, runs the processor, and
//! acknowledges only on success.

use crate::config::WorkerConfig;
use crate::consumer::NatsConsumer;
use crate::delivery::InFlight;
use crate::error::NatsError;
use crate::processor::Processor;
use async_nats::jetstream::Context;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// What happened to a message after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Processed and acknowledged.
    Acknowledged,
    /// Processing failed; left for redelivery.
    Unacknowledged,
}

/// NATS JetStream worker bound to one durable consumer.
pub struct NatsWorker<P: Processor> {
    consumer: NatsConsumer,
    processor: Arc<P>,
}

impl<P: Processor + 'static> NatsWorker<P> {
    /// Create the worker, ensuring the stream and the durable consumer exist.
    pub async fn new(jetstream: Context, processor: P, config: WorkerConfig) -> Result<Self, NatsError> {
        let consumer = NatsConsumer::new(jetstream, config);
        consumer.init().await?;

        Ok(Self {
            consumer,
            processor: Arc::new(processor),
        })
    }

    /// Run until shutdown is signalled.
    ///
    /// A message whose processing is interrupted by shutdown is not
    /// acknowledged. Returns an error if the delivery feed ends.
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) -> Result<(), NatsError> {
        let config = self.consumer.config();
        info!(
            stream = %config.stream_name,
            subject = %config.subject,
            durable = %config.durable_name,
            max_inflight = config.max_inflight,
            processor = self.processor.name(),
            "Starting NATS worker"
        );

        let messages = self.consumer.messages().await?;
        let (tx, rx) = mpsc::channel(config.channel_capacity());
        let feeder = tokio::spawn(feed(messages, tx));

        let result = drain(self.processor.as_ref(), rx, shutdown_rx).await;
        feeder.abort();

        info!("NATS worker stopped");
        result
    }
}

/// Forward broker deliveries into the worker channel.
pub(crate) async fn feed<S, M, E>(messages: S, tx: mpsc::Sender<InFlight>)
where
    S: Stream<Item = Result<M, E>>,
    M: Into<InFlight>,
    E: Display,
{
    futures::pin_mut!(messages);

    while let Some(next) = messages.next().await {
        match next {
            Ok(message) => {
                if tx.send(message.into()).await.is_err() {
                    debug!("Worker gone, stopping delivery feed");
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "Error receiving message");
            }
        }
    }

    warn!("Delivery feed ended");
}

/// Consume the channel one message at a time until shutdown.
pub(crate) async fn drain<P: Processor + ?Sized>(
    processor: &P,
    mut rx: mpsc::Receiver<InFlight>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), NatsError> {
    loop {
        let inflight = tokio::select! {
            biased;

            _ = shutdown_requested(&mut shutdown_rx) => {
                info!("Shutdown signal received, stopping worker");
                return Ok(());
            }

            next = rx.recv() => match next {
                Some(inflight) => inflight,
                None => return Err(NatsError::consumer_error("delivery feed closed")),
            },
        };

        let sequence = inflight.delivery.sequence;

        tokio::select! {
            biased;

            _ = shutdown_requested(&mut shutdown_rx) => {
                warn!(sequence, "Shutdown during processing, message left unacknowledged");
                return Ok(());
            }

            result = handle_delivery(processor, inflight) => {
                if let Err(e) = result {
                    error!(sequence, error = %e, "Failed to acknowledge message");
                }
            }
        }
    }
}

/// Process one message; acknowledge it only if processing succeeded.
pub async fn handle_delivery<P: Processor + ?Sized>(
    processor: &P,
    inflight: InFlight,
) -> Result<Outcome, NatsError> {
    let sequence = inflight.delivery.sequence;

    if inflight.delivery.is_redelivery() {
        debug!(
            sequence,
            delivered = inflight.delivery.delivered,
            "Processing redelivered message"
        );
    }

    let start = Instant::now();
    match processor.process(&inflight.delivery).await {
        Ok(()) => {
            inflight.ack().await?;
            info!(
                sequence,
                duration_ms = start.elapsed().as_millis() as u64,
                "Message acknowledged"
            );
            Ok(Outcome::Acknowledged)
        }
        Err(e) => {
            warn!(
                sequence,
                processor = processor.name(),
                error = %e,
                "Processing failed, message left for redelivery"
            );
            Ok(Outcome::Unacknowledged)
        }
    }
}

/// Resolves once the flag is set. Never resolves if the sender is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl From<async_nats::jetstream::Message> for InFlight {
    fn from(message: async_nats::jetstream::Message) -> Self {
        InFlight::from_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{Acknowledge, Delivery};
    use crate::error::ProcessingError;
    use crate::processor::{FailingProcessor, NoOpProcessor};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct AckLog(Arc<std::sync::Mutex<Vec<u64>>>);

    impl AckLog {
        fn acked(&self) -> Vec<u64> {
            self.0.lock().unwrap().clone()
        }
    }

    struct RecordingAck {
        sequence: u64,
        log: AckLog,
    }

    #[async_trait]
    impl Acknowledge for RecordingAck {
        async fn acknowledge(&self) -> Result<(), NatsError> {
            self.log.0.lock().unwrap().push(self.sequence);
            Ok(())
        }
    }

    fn inflight(sequence: u64, log: &AckLog) -> InFlight {
        InFlight::new(
            Delivery {
                subject: "demo".to_string(),
                payload: format!("message-{}", sequence).into_bytes(),
                sequence,
                delivered: 1,
            },
            RecordingAck {
                sequence,
                log: log.clone(),
            },
        )
    }

    /// Sleeps, tracking how many calls overlap.
    #[derive(Default)]
    struct SlowTracking {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl Processor for SlowTracking {
        async fn process(&self, _delivery: &Delivery) -> Result<(), ProcessingError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "slow_tracking"
        }
    }

    #[tokio::test]
    async fn test_success_is_acknowledged() {
        let log = AckLog::default();
        let outcome = handle_delivery(&NoOpProcessor, inflight(1, &log)).await.unwrap();

        assert_eq!(outcome, Outcome::Acknowledged);
        assert_eq!(log.acked(), vec![1]);
    }

    #[tokio::test]
    async fn test_failure_is_not_acknowledged() {
        let log = AckLog::default();
        let processor = FailingProcessor::new("broken");
        let outcome = handle_delivery(&processor, inflight(1, &log)).await.unwrap();

        assert_eq!(outcome, Outcome::Unacknowledged);
        assert!(log.acked().is_empty());
    }

    #[tokio::test]
    async fn test_feed_skips_stream_errors() {
        let log = AckLog::default();
        let items: Vec<Result<InFlight, String>> = vec![
            Ok(inflight(1, &log)),
            Err("boom".to_string()),
            Ok(inflight(2, &log)),
        ];
        let (tx, mut rx) = mpsc::channel(4);

        feed(futures::stream::iter(items), tx).await;

        assert_eq!(rx.recv().await.unwrap().delivery.sequence, 1);
        assert_eq!(rx.recv().await.unwrap().delivery.sequence, 2);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_processes_one_at_a_time_in_order() {
        let log = AckLog::default();
        let processor = SlowTracking::default();
        let (tx, rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let producer = {
            let log = log.clone();
            tokio::spawn(async move {
                for sequence in 1..=3 {
                    tx.send(inflight(sequence, &log)).await.unwrap();
                }
            })
        };

        let result = drain(&processor, rx, shutdown_rx).await;
        producer.await.unwrap();

        assert!(matches!(result, Err(NatsError::Consumer(_))));
        assert_eq!(log.acked(), vec![1, 2, 3]);
        assert_eq!(processor.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_mid_processing_leaves_message_unacknowledged() {
        let log = AckLog::default();
        let processor = SlowTracking::default();
        let (tx, rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(inflight(1, &log)).await.unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            shutdown_tx.send(true).unwrap();
        });

        let result = drain(&processor, rx, shutdown_rx).await;

        assert!(result.is_ok());
        assert!(log.acked().is_empty());
        drop(tx);
    }

    #[tokio::test]
    async fn test_drain_exits_when_already_shut_down() {
        let (_tx, rx) = mpsc::channel::<InFlight>(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        assert!(drain(&NoOpProcessor, rx, shutdown_rx).await.is_ok());
    }
}

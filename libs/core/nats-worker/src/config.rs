//! Configuration for durable NATS JetStream subscriptions.

use std::time::Duration;

/// Subscription configuration trait (type-safe constants).
///
/// Implement this trait to describe a durable subscription.
///
/// # Example
///
/// ```rust,ignore
/// struct OrdersSubscription;
///
/// impl SubscriptionConfig for OrdersSubscription {
///     const SUBJECT: &'static str = "orders";
///     const DURABLE_NAME: &'static str = "order-worker";
/// }
/// ```
pub trait SubscriptionConfig {
    /// Subject to subscribe to (e.g., "orders")
    const SUBJECT: &'static str;

    /// Durable name; the broker remembers the delivery position under it
    const DURABLE_NAME: &'static str;

    /// Maximum unacknowledged messages delivered at once (default: 1)
    const MAX_INFLIGHT: i64 = 1;

    /// Ack wait in seconds before an unacknowledged message is redelivered (default: 30)
    const ACK_WAIT_SECS: u64 = 30;
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// JetStream stream holding the subject
    pub stream_name: String,

    /// Subject to subscribe to
    pub subject: String,

    /// Durable consumer name
    pub durable_name: String,

    /// Maximum unacknowledged messages (`max_ack_pending`)
    pub max_inflight: i64,

    /// Ack wait before redelivery
    pub ack_wait: Duration,
}

impl WorkerConfig {
    /// Create from a SubscriptionConfig, storing messages in `stream_name`.
    pub fn from_subscription<S: SubscriptionConfig>(stream_name: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            subject: S::SUBJECT.to_string(),
            durable_name: S::DURABLE_NAME.to_string(),
            max_inflight: S::MAX_INFLIGHT,
            ack_wait: Duration::from_secs(S::ACK_WAIT_SECS),
        }
    }

    /// Set the ack wait.
    pub fn with_ack_wait(mut self, ack_wait: Duration) -> Self {
        self.ack_wait = ack_wait;
        self
    }

    /// Capacity of the channel between the delivery feed and the worker.
    ///
    /// Never larger than the inflight limit, and at least one.
    pub fn channel_capacity(&self) -> usize {
        usize::try_from(self.max_inflight.max(1)).unwrap_or(1)
    }
}

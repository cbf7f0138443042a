//! Durable NATS JetStream subscriptions with a single-slot worker.
//!
//! This library wires one durable, manually acknowledged JetStream consumer to
//! a [`Processor`], and serves the K8s probe endpoints next to it.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐     ┌─────────────────────┐     ┌────────────────┐
//! │   Producer     │────▶│   NATS JetStream    │────▶│  Feeder task   │
//! │ (NatsProducer) │     │ (durable consumer,  │     │ (message       │
//! └────────────────┘     │  max_ack_pending=1) │     │  stream)       │
//!                        └─────────────────────┘     └───────┬────────┘
//!                                                            │ mpsc(1)
//!                                                            ▼
//!                        ┌─────────────────────┐     ┌────────────────┐
//!                        │    HealthServer     │     │   NatsWorker   │
//!                        │ /healthz /ready     │     │ process → ack  │
//!                        │ /metrics            │     │  (Processor)   │
//!                        └─────────────────────┘     └────────────────┘
//! ```
//!
//! # Key Features
//!
//! - **Durable consumer**: delivery position survives restarts
//! - **Manual ack**: a message is acknowledged only after successful processing
//! - **Inflight limit**: at most one unacknowledged message at a time
//! - **Probe endpoints**: liveness dials the broker with a throwaway connection
//! - **Graceful shutdown**: interrupted messages stay unacknowledged
//!
//! # Example
//!
//! ```rust,ignore
//! use nats_worker::{ConnectionSettings, NatsWorker, SubscriptionConfig, WorkerConfig};
//!
//! struct Orders;
//! impl SubscriptionConfig for Orders {
//!     const SUBJECT: &'static str = "orders";
//!     const DURABLE_NAME: &'static str = "order-worker";
//! }
//!
//! let client = ConnectionSettings::new(None, "order-service").connect().await?;
//! let worker = NatsWorker::new(
//!     async_nats::jetstream::new(client),
//!     OrderProcessor::default(),
//!     WorkerConfig::from_subscription::<Orders>("ORDERS"),
//! )
//! .await?;
//!
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod connection;
mod consumer;
mod delivery;
mod error;
mod health;
mod processor;
mod producer;
mod worker;

pub use config::{SubscriptionConfig, WorkerConfig};
pub use connection::{unique_client_name, ConnectionSettings, DEFAULT_NATS_URL};
pub use consumer::NatsConsumer;
pub use delivery::{Acknowledge, Delivery, InFlight};
pub use error::{NatsError, ProcessingError};
pub use health::{
    BrokerProbe, HealthServer, NatsProbe, HEALTHY_BODY, METRICS_BODY, NOT_LIVE_BODY, READY_BODY,
};
pub use processor::{FailingProcessor, NoOpProcessor, Processor};
pub use producer::NatsProducer;
pub use worker::{handle_delivery, NatsWorker, Outcome};

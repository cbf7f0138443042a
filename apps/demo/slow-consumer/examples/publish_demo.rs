//! Test publisher for the durable demo consumer
//!
//! Run with: cargo run -p demo_slow_consumer --example publish_demo -- "some text"

use demo_slow_consumer::config::DemoSubscription;
use nats_worker::{NatsConsumer, NatsProducer, SubscriptionConfig, WorkerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let nats_url =
        std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());
    let cluster_id =
        std::env::var("STAN_CLUSTERID").unwrap_or_else(|_| "test-cluster".to_string());

    println!("Connecting to NATS at {}...", nats_url);
    let client = async_nats::connect(&nats_url).await?;
    let jetstream = async_nats::jetstream::new(client);

    // Ensure stream exists
    println!("Creating/getting {} stream...", cluster_id);
    let config = WorkerConfig::from_subscription::<DemoSubscription>(cluster_id.clone());
    NatsConsumer::new(jetstream.clone(), config.clone())
        .ensure_stream()
        .await?;

    let text = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Hello from publish_demo".to_string());

    println!("Publishing to {}: {}", DemoSubscription::SUBJECT, text);
    let producer = NatsProducer::for_worker(jetstream, &config);
    let sequence = producer.send(text).await?;

    println!("Published! Stream sequence: {}", sequence);
    println!("\nThe consumer acknowledges it about 30 seconds after delivery");

    Ok(())
}

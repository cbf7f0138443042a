//! Shared test utilities
//!
//! - `TestNats`: NATS container with JetStream and automatic cleanup
//! - `UNREACHABLE_NATS_URL`: a broker address nothing listens on
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::TestNats;
//!
//! #[tokio::test]
//! #[ignore] // Requires Docker
//! async fn my_nats_test() {
//!     let nats = TestNats::new().await;
//!     let jetstream = nats.jetstream();
//! }
//! ```

mod nats;

pub use nats::TestNats;

/// NATS URL on a port that refuses connections.
pub const UNREACHABLE_NATS_URL: &str = "nats://127.0.0.1:1";

/// Poll `check` every 50ms until it returns true or `timeout` elapses.
///
/// Returns the final result of `check`.
pub async fn eventually<F, Fut>(timeout: std::time::Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_eventually_succeeds_after_retries() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let ok = eventually(Duration::from_secs(5), move || async move {
            calls.fetch_add(1, Ordering::SeqCst) >= 2
        })
        .await;
        assert!(ok);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eventually_times_out() {
        assert!(!eventually(Duration::from_millis(200), || async { false }).await);
    }
}

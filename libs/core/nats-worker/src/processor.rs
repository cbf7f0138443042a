//! Processor trait for message handling.

use crate::delivery::Delivery;
use crate::error::ProcessingError;
use async_trait::async_trait;

/// Message processor trait.
///
/// Implement this trait to define what happens to each delivered message.
/// The worker acknowledges the message only when `process` returns `Ok(())`;
/// on error the message is left unacknowledged and the broker redelivers it.
///
/// # Example
///
/// ```rust,ignore
/// use nats_worker::{Delivery, Processor, ProcessingError};
/// use async_trait::async_trait;
///
/// struct AuditProcessor {
///     store: Arc<AuditStore>,
/// }
///
/// #[async_trait]
/// impl Processor for AuditProcessor {
///     async fn process(&self, delivery: &Delivery) -> Result<(), ProcessingError> {
///         self.store
///             .append(&delivery.subject, &delivery.payload)
///             .await
///             .map_err(|e| ProcessingError::failed_with_source("append failed", e))
///     }
///
///     fn name(&self) -> &'static str {
///         "audit_processor"
///     }
/// }
/// ```
#[async_trait]
pub trait Processor: Send + Sync {
    /// Process a message.
    async fn process(&self, delivery: &Delivery) -> Result<(), ProcessingError>;

    /// Get the processor name.
    ///
    /// Used for logging.
    fn name(&self) -> &'static str;
}

/// A processor that accepts everything (for testing).
#[derive(Debug, Clone, Default)]
pub struct NoOpProcessor;

#[async_trait]
impl Processor for NoOpProcessor {
    async fn process(&self, _delivery: &Delivery) -> Result<(), ProcessingError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop_processor"
    }
}

/// A processor that always fails (for testing).
#[derive(Debug, Clone)]
pub struct FailingProcessor {
    error_message: String,
}

impl FailingProcessor {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
        }
    }
}

#[async_trait]
impl Processor for FailingProcessor {
    async fn process(&self, _delivery: &Delivery) -> Result<(), ProcessingError> {
        Err(ProcessingError::failed(&self.error_message))
    }

    fn name(&self) -> &'static str {
        "failing_processor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> Delivery {
        Delivery {
            subject: "demo".to_string(),
            payload: b"payload".to_vec(),
            sequence: 1,
            delivered: 1,
        }
    }

    #[tokio::test]
    async fn test_noop_processor() {
        let processor = NoOpProcessor;
        assert!(processor.process(&delivery()).await.is_ok());
        assert_eq!(processor.name(), "noop_processor");
    }

    #[tokio::test]
    async fn test_failing_processor() {
        let processor = FailingProcessor::new("boom");
        let err = processor.process(&delivery()).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(processor.name(), "failing_processor");
    }
}

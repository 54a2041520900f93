//! Mock Publisher Implementation
//!
//! Captures published messages in memory for test assertions.
//! Thread-safe via `Arc<Mutex<>>`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{BoxError, PublishMessage, Publisher};

/// Message captured by the mock publisher
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub message: PublishMessage,
    pub message_id: String,
    pub published_at: DateTime<Utc>,
}

/// Mock publisher that records messages for test assertions
#[derive(Debug, Clone)]
pub struct MockPublisher {
    topic: String,
    messages: Arc<Mutex<Vec<PublishedMessage>>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MockPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            messages: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            delay: None,
        }
    }

    /// Fail every publish with the given message
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Wait before acknowledging each publish
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Return all published messages
    pub fn published_messages(&self) -> Vec<PublishedMessage> {
        self.messages
            .lock()
            .expect("messages lock poisoned, a prior test panicked")
            .clone()
    }

    /// Clear all published messages
    pub fn reset(&self) {
        self.messages
            .lock()
            .expect("messages lock poisoned, a prior test panicked")
            .clear();
    }
}

#[async_trait::async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, message: PublishMessage) -> Result<String, BoxError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = &self.failure {
            return Err(failure.clone().into());
        }

        let message_id = Uuid::new_v4().to_string();
        tracing::debug!(topic = %self.topic, message_id = %message_id, "Mock publisher: recording message");

        self.messages
            .lock()
            .map_err(|e| format!("messages lock poisoned: {e}"))?
            .push(PublishedMessage {
                message,
                message_id: message_id.clone(),
                published_at: Utc::now(),
            });

        Ok(message_id)
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

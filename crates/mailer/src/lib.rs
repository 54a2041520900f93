//! Email sending via a Pub/Sub topic
//!
//! The [`Mailer`] does not talk to a mail provider itself. It publishes an
//! encoded [`Email`] to a topic which a separate mail sending function
//! subscribes to. Publishing is abstracted by the [`Publisher`] trait:
//! - [`PubSubPublisher`] for a cloud Pub/Sub topic (or its emulator)
//! - [`MockPublisher`] for tests and local development

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use dusted_fault::{ResultExt, SystemFailure};

pub mod email;
pub mod mock;
pub mod pubsub;

pub use email::Email;
pub use mock::MockPublisher;
pub use pubsub::{PubSubConfig, PubSubPublisher};

/// Boxed error returned by publishers
pub type BoxError = Box<dyn StdError + Send + Sync>;

const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 30;

/// Message as handed to a topic
#[derive(Debug, Clone, PartialEq)]
pub struct PublishMessage {
    pub data: Vec<u8>,
    pub attributes: HashMap<String, String>,
}

/// A topic that email messages can be published to
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a message and wait for the server assigned message ID
    async fn publish(&self, message: PublishMessage) -> Result<String, BoxError>;

    /// Topic name, used in diagnostics
    fn topic(&self) -> &str;
}

/// Factory for creating Publisher implementations
pub struct PublisherFactory;

impl PublisherFactory {
    /// Create a publisher from the `MAILER_PROVIDER` environment variable
    /// (`pubsub` or `mock`, default `mock`)
    pub fn from_env() -> Result<Arc<dyn Publisher>, SystemFailure> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("MAILER_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        match provider.as_str() {
            "pubsub" => {
                let config = PubSubConfig::from_env()?;
                tracing::info!(topic = %config.topic, "Creating Pub/Sub publisher");
                Ok(Arc::new(PubSubPublisher::new(config)))
            }
            "mock" => {
                tracing::info!("Creating mock publisher");
                let topic = std::env::var("MAILER_TOPIC").unwrap_or_else(|_| "emails".to_string());
                Ok(Arc::new(MockPublisher::new(topic)))
            }
            other => Err(SystemFailure::new(
                "mailer",
                "from_env",
                format!("unknown mailer provider '{other}', supported providers: pubsub, mock"),
            )),
        }
    }
}

/// Mailer configuration
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Domain the emails are sent from
    pub domain: String,
    /// Default sender address
    pub sender: String,
    /// Environment name attached to every message (e.g. production)
    pub environment: String,
    /// Maximum wait for the publish result
    pub publish_timeout: Duration,
}

impl MailerConfig {
    pub fn new(
        domain: impl Into<String>,
        sender: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            sender: sender.into(),
            environment: environment.into(),
            publish_timeout: Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS),
        }
    }

    pub fn with_publish_timeout(mut self, publish_timeout: Duration) -> Self {
        self.publish_timeout = publish_timeout;
        self
    }

    /// Create mailer config from environment variables
    pub fn from_env() -> Result<Self, SystemFailure> {
        dotenvy::dotenv().ok();

        let domain = std::env::var("MAILER_DOMAIN")
            .wrap_system("mailer", "from_env", "MAILER_DOMAIN is required")?;
        let sender = std::env::var("MAILER_SENDER")
            .wrap_system("mailer", "from_env", "MAILER_SENDER is required")?;
        let environment =
            std::env::var("ENVIRONMENT_NAME").unwrap_or_else(|_| "development".to_string());

        let publish_timeout = match std::env::var("MAILER_PUBLISH_TIMEOUT_SECS") {
            Ok(value) => value.parse::<u64>().wrap_system(
                "mailer",
                "from_env",
                "MAILER_PUBLISH_TIMEOUT_SECS must be a number of seconds",
            )?,
            Err(_) => DEFAULT_PUBLISH_TIMEOUT_SECS,
        };

        Ok(Self {
            domain,
            sender,
            environment,
            publish_timeout: Duration::from_secs(publish_timeout),
        })
    }
}

/// Sends emails by publishing them to a topic
#[derive(Clone)]
pub struct Mailer {
    publisher: Arc<dyn Publisher>,
    config: MailerConfig,
}

impl Mailer {
    pub fn new(publisher: Arc<dyn Publisher>, config: MailerConfig) -> Self {
        Self { publisher, config }
    }

    /// Start a new email from this mailer's domain and sender
    pub fn new_email<I, S>(&self, subject: impl Into<String>, recipients: I) -> Email
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Email::new(
            &self.config.domain,
            &self.config.sender,
            subject.into(),
            recipients.into_iter().map(Into::into).collect(),
        )
    }

    /// Publish an email and return the message ID assigned by the topic
    pub async fn send(&self, email: &Email) -> Result<String, SystemFailure> {
        if self.config.domain.is_empty() || self.config.sender.is_empty() {
            return Err(SystemFailure::new(
                "mailer",
                "send_message",
                "cannot send email because the domain or sender were not set",
            ));
        }

        let data = email.to_bytes().wrap_system(
            "mailer",
            "send_message",
            "failed to serialize message to byte array",
        )?;

        let mut attributes = HashMap::new();
        attributes.insert("environment".to_string(), self.config.environment.clone());
        if let Some(trace_id) = email.trace_id.as_ref().filter(|id| !id.is_empty()) {
            attributes.insert("traceID".to_string(), trace_id.clone());
        }

        let published = tokio::time::timeout(
            self.config.publish_timeout,
            self.publisher.publish(PublishMessage { data, attributes }),
        )
        .await
        .map_err(|_| {
            SystemFailure::new(
                "mailer",
                "send_message",
                "publish timed out before email status could get verified",
            )
        })?;

        let message_id = published.wrap_system_with("mailer", "send_message", || {
            format!(
                "failed to publish message to topic '{}'",
                self.publisher.topic()
            )
        })?;

        tracing::info!(message_id = %message_id, email = %email, "Email published");
        Ok(message_id)
    }
}

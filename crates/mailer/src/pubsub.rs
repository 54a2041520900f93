//! Pub/Sub REST Publisher Implementation
//!
//! POSTs messages to `{endpoint}/v1/projects/{project}/topics/{topic}:publish`.
//! Works against Google Cloud Pub/Sub and the local emulator (no token).

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use dusted_fault::{ResultExt, SystemFailure};
use serde::{Deserialize, Serialize};

use crate::{BoxError, PublishMessage, Publisher};

pub const DEFAULT_ENDPOINT: &str = "https://pubsub.googleapis.com";

/// Pub/Sub topic configuration
#[derive(Clone)]
pub struct PubSubConfig {
    /// Base URL of the Pub/Sub API or emulator
    pub endpoint: String,
    pub project_id: String,
    pub topic: String,
    /// OAuth2 bearer token, not needed for the emulator
    pub access_token: Option<String>,
}

impl std::fmt::Debug for PubSubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubSubConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("topic", &self.topic)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl PubSubConfig {
    pub fn new(project_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: project_id.into(),
            topic: topic.into(),
            access_token: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Create Pub/Sub config from environment variables
    pub fn from_env() -> Result<Self, SystemFailure> {
        dotenvy::dotenv().ok();

        let project_id = std::env::var("PUBSUB_PROJECT_ID")
            .wrap_system("mailer", "from_env", "PUBSUB_PROJECT_ID is required")?;
        let topic = std::env::var("MAILER_TOPIC").unwrap_or_else(|_| "emails".to_string());
        let endpoint =
            std::env::var("PUBSUB_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let access_token = std::env::var("PUBSUB_ACCESS_TOKEN").ok();

        Ok(Self {
            endpoint,
            project_id,
            topic,
            access_token,
        })
    }
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    messages: [WireMessage<'a>; 1],
}

#[derive(Serialize)]
struct WireMessage<'a> {
    data: String,
    attributes: &'a HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// Real Pub/Sub publisher
pub struct PubSubPublisher {
    http: reqwest::Client,
    publish_url: String,
    config: PubSubConfig,
}

impl PubSubPublisher {
    pub fn new(config: PubSubConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing HTTP client (connection pool, timeouts)
    pub fn with_http_client(http: reqwest::Client, config: PubSubConfig) -> Self {
        let publish_url = format!(
            "{}/v1/projects/{}/topics/{}:publish",
            config.endpoint.trim_end_matches('/'),
            config.project_id,
            config.topic
        );
        Self {
            http,
            publish_url,
            config,
        }
    }

    async fn publish_message(&self, message: &PublishMessage) -> Result<String, SystemFailure> {
        let body = PublishRequest {
            messages: [WireMessage {
                data: STANDARD.encode(&message.data),
                attributes: &message.attributes,
            }],
        };

        let mut request = self.http.post(&self.publish_url).json(&body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .wrap_system("mailer", "publish", "sending HTTP request to Pub/Sub failed")?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .wrap_system("mailer", "publish", "reading HTTP response body failed")?;

        if !status.is_success() {
            return Err(SystemFailure::new(
                "mailer",
                "publish",
                format!(
                    "Pub/Sub returned {}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                ),
            ));
        }

        let result: PublishResponse = serde_json::from_slice(&body).wrap_system(
            "mailer",
            "publish",
            "deserializing response body from JSON failed",
        )?;

        let message_id = result.message_ids.into_iter().next().ok_or_else(|| {
            SystemFailure::new("mailer", "publish", "Pub/Sub returned no message ID")
        })?;

        tracing::debug!(topic = %self.config.topic, message_id = %message_id, "Pub/Sub message published");
        Ok(message_id)
    }
}

#[async_trait::async_trait]
impl Publisher for PubSubPublisher {
    async fn publish(&self, message: PublishMessage) -> Result<String, BoxError> {
        Ok(self.publish_message(&message).await?)
    }

    fn topic(&self) -> &str {
        &self.config.topic
    }
}

//! hCaptcha verification
//!
//! Checks a user's captcha response against the hCaptcha `siteverify`
//! endpoint. A badly solved captcha is not an error (`Ok(false)`); a
//! misconfigured site key or secret, or a failed call, is a
//! [`SystemFailure`].

use dusted_fault::SystemFailure;

pub mod client;
pub mod mock;

pub use client::HcaptchaClient;
pub use mock::MockCaptchaVerifier;

pub const DEFAULT_VERIFY_URL: &str = "https://hcaptcha.com/siteverify";

/// hCaptcha configuration
#[derive(Debug, Clone)]
pub struct HcaptchaConfig {
    pub site_key: String,
    pub secret: String,
    /// Override for tests and proxies
    pub verify_url: String,
}

impl HcaptchaConfig {
    pub fn new(site_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            site_key: site_key.into(),
            secret: secret.into(),
            verify_url: DEFAULT_VERIFY_URL.to_string(),
        }
    }

    pub fn with_verify_url(mut self, verify_url: impl Into<String>) -> Self {
        self.verify_url = verify_url.into();
        self
    }

    /// Create hCaptcha config from environment variables
    pub fn from_env() -> Result<Self, SystemFailure> {
        dotenvy::dotenv().ok();

        let required = |name: &str| {
            std::env::var(name).map_err(|e| {
                SystemFailure::wrap(e, "hcaptcha", "from_env", format!("{name} is required"))
            })
        };

        let site_key = required("HCAPTCHA_SITE_KEY")?;
        let secret = required("HCAPTCHA_SECRET")?;
        let verify_url = std::env::var("HCAPTCHA_VERIFY_URL")
            .unwrap_or_else(|_| DEFAULT_VERIFY_URL.to_string());

        Ok(Self {
            site_key,
            secret,
            verify_url,
        })
    }
}

/// Captcha verification trait for different implementations
#[async_trait::async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Whether the user solved the captcha correctly
    async fn verify(&self, captcha_response: &str) -> Result<bool, SystemFailure>;
}

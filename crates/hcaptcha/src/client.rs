//! hCaptcha HTTP Client Implementation
//!
//! POSTs the captcha response as a form to the `siteverify` endpoint.
//! Error codes: <https://docs.hcaptcha.com/#siteverify-error-codes-table>

use dusted_fault::{ResultExt, SystemFailure};
use serde::Deserialize;

use crate::{CaptchaVerifier, HcaptchaConfig};

/// Error codes caused by the server's configuration rather than the user
const MISCONFIGURATION_CODES: &[&str] = &[
    // Secret key is missing
    "missing-input-secret",
    // Secret key is invalid or malformed
    "invalid-input-secret",
    // Testing site key used without its matching secret
    "not-using-dummy-passcode",
    // Site key is not registered with the provided secret
    "sitekey-secret-mismatch",
];

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Real hCaptcha client
pub struct HcaptchaClient {
    http: reqwest::Client,
    config: HcaptchaConfig,
}

impl HcaptchaClient {
    pub fn new(config: HcaptchaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Reuse an existing HTTP client (connection pool, timeouts)
    pub fn with_http_client(http: reqwest::Client, config: HcaptchaConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait::async_trait]
impl CaptchaVerifier for HcaptchaClient {
    async fn verify(&self, captcha_response: &str) -> Result<bool, SystemFailure> {
        let form = [
            ("response", captcha_response),
            ("secret", self.config.secret.as_str()),
            ("sitekey", self.config.site_key.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.verify_url)
            .form(&form)
            .send()
            .await
            .wrap_system("hcaptcha", "verify", "sending HTTP request to hCaptcha failed")?;

        let body = response
            .bytes()
            .await
            .wrap_system("hcaptcha", "verify", "reading HTTP response body failed")?;

        let result: SiteVerifyResponse = serde_json::from_slice(&body).wrap_system(
            "hcaptcha",
            "verify",
            "deserializing response body from JSON failed",
        )?;

        if result.success {
            return Ok(true);
        }

        if let Some(code) = result
            .error_codes
            .iter()
            .find(|code| MISCONFIGURATION_CODES.contains(&code.as_str()))
        {
            return Err(SystemFailure::new(
                "hcaptcha",
                "verify",
                format!("hCaptcha is misconfigured on the server ({code})"),
            ));
        }

        // No error, just a badly solved captcha
        tracing::debug!(error_codes = ?result.error_codes, "Captcha verification rejected");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HcaptchaClient {
        let config = HcaptchaConfig::new("site-key", "secret")
            .with_verify_url(format!("{}/siteverify", server.uri()));
        HcaptchaClient::new(config)
    }

    #[tokio::test]
    async fn test_verify_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/siteverify"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("response=solved-token"))
            .and(body_string_contains("secret=secret"))
            .and(body_string_contains("sitekey=site-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);

        assert!(client.verify("solved-token").await.unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_verify_badly_solved_captcha() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error-codes": ["invalid-input-response"]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);

        assert!(!client.verify("wrong").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_misconfigured_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error-codes": ["invalid-input-response", "sitekey-secret-mismatch"]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let failure = client.verify("token").await.unwrap_err();

        assert_eq!(
            failure.to_string(),
            "hcaptcha.verify: hCaptcha is misconfigured on the server (sitekey-secret-mismatch)"
        );
    }

    #[tokio::test]
    async fn test_verify_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let failure = client.verify("token").await.unwrap_err();

        assert!(failure
            .to_string()
            .starts_with("hcaptcha.verify: deserializing response body from JSON failed\n   "));
        assert!(failure.cause().is_some());
    }

    #[tokio::test]
    async fn test_verify_unreachable_server() {
        let config = HcaptchaConfig::new("site-key", "secret")
            .with_verify_url("http://127.0.0.1:9/siteverify");
        let client = HcaptchaClient::new(config);

        let failure = client.verify("token").await.unwrap_err();

        assert_eq!(
            failure.summary(),
            "hcaptcha.verify: sending HTTP request to hCaptcha failed"
        );
    }
}

//! Mock Captcha Verifier Implementation
//!
//! Returns a fixed outcome and records every submitted response.
//! Thread-safe via `Arc<Mutex<>>`.

use std::sync::{Arc, Mutex};

use dusted_fault::SystemFailure;

use crate::CaptchaVerifier;

/// Outcome returned by [`MockCaptchaVerifier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    Solved,
    Rejected,
    Misconfigured,
}

/// Mock verifier for tests and local development
#[derive(Debug, Clone)]
pub struct MockCaptchaVerifier {
    outcome: MockOutcome,
    responses: Arc<Mutex<Vec<String>>>,
}

impl MockCaptchaVerifier {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            responses: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Return all submitted captcha responses
    pub fn recorded_responses(&self) -> Vec<String> {
        self.responses
            .lock()
            .expect("responses lock poisoned, a prior test panicked")
            .clone()
    }
}

impl Default for MockCaptchaVerifier {
    fn default() -> Self {
        Self::new(MockOutcome::Solved)
    }
}

#[async_trait::async_trait]
impl CaptchaVerifier for MockCaptchaVerifier {
    async fn verify(&self, captcha_response: &str) -> Result<bool, SystemFailure> {
        tracing::debug!(outcome = ?self.outcome, "Mock hCaptcha: recording response");
        self.responses
            .lock()
            .map_err(|e| {
                SystemFailure::new("hcaptcha", "verify", format!("responses lock poisoned: {e}"))
            })?
            .push(captcha_response.to_string());

        match self.outcome {
            MockOutcome::Solved => Ok(true),
            MockOutcome::Rejected => Ok(false),
            MockOutcome::Misconfigured => Err(SystemFailure::new(
                "hcaptcha",
                "verify",
                "hCaptcha is misconfigured on the server",
            )),
        }
    }
}

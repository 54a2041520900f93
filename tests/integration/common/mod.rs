//! Shared fixtures: a small signup service wired from every crate
//!
//! Validation problems are collected into one `UserFailure`; failures of
//! collaborators are wrapped with one `SystemFailure` layer per call site.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use dusted_fault::{Failure, ResultExt, SystemFailure, UserFailure};
use dusted_hcaptcha::CaptchaVerifier;
use dusted_mailer::{Mailer, MailerConfig, MockPublisher};
use dusted_types::{Address, Url};
use serde::Deserialize;
use serde_json::{json, Value};

pub const MISSING_NAME: &str = "missing_name";
const NAME_REQUIRED: &str = "Please enter your name.";

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub website: String,
    pub captcha: String,
}

pub struct SignupService {
    verifier: Arc<dyn CaptchaVerifier>,
    mailer: Mailer,
}

impl SignupService {
    pub fn new(verifier: Arc<dyn CaptchaVerifier>, publisher: MockPublisher) -> Self {
        let mailer = Mailer::new(
            Arc::new(publisher),
            MailerConfig::new("example.org", "welcome@example.org", "test"),
        );
        Self { verifier, mailer }
    }

    fn validate(form: &SignupForm) -> Result<(Address, Url), UserFailure> {
        let name_missing = form.name.trim().is_empty();

        match (name_missing, Address::parse(&form.email)) {
            (false, Ok(address)) => Ok((address, Url::new(form.website.trim()))),
            (false, Err(email)) => Err(email),
            (true, Ok(_)) => Err(UserFailure::new(MISSING_NAME, NAME_REQUIRED)),
            (true, Err(email)) => {
                let mut failure = UserFailure::new(MISSING_NAME, NAME_REQUIRED);
                for code in email.codes() {
                    if let Some(message) = email.message(code) {
                        failure.add(code, message);
                    }
                }
                Err(failure)
            }
        }
    }

    pub async fn sign_up(&self, form: SignupForm) -> dusted_fault::Result<String> {
        let (address, website) = Self::validate(&form)?;

        let solved = self
            .verifier
            .verify(&form.captcha)
            .await
            .wrap_system("signup", "sign_up", "verifying captcha failed")?;
        if !solved {
            return Err(UserFailure::new("invalid_captcha", "Please solve the captcha again.").into());
        }

        let mut email = self
            .mailer
            .new_email("Welcome", [address.normalised()])
            .with_text(format!("Hi {}", form.name.trim()));
        if !website.is_empty() {
            email = email.with_html(format!(
                "<p>Hi {}, we saw {}</p>",
                form.name.trim(),
                website.pretty()
            ));
        }

        let message_id = self
            .mailer
            .send(&email)
            .await
            .map_err(|e| SystemFailure::wrap(e, "signup", "sign_up", "sending welcome email failed"))?;

        Ok(message_id)
    }
}

async fn signup(
    State(service): State<Arc<SignupService>>,
    Json(form): Json<SignupForm>,
) -> Result<Json<Value>, Failure> {
    let message_id = service.sign_up(form).await?;
    Ok(Json(json!({ "messageId": message_id })))
}

pub fn router(service: Arc<SignupService>) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .with_state(service)
}

//! End-to-end signup flow across the fault, types, hcaptcha and mailer crates

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
};
use dusted_common::mapsort;
use dusted_fault::SystemFailure;
use dusted_hcaptcha::{mock::MockOutcome, MockCaptchaVerifier};
use dusted_mailer::MockPublisher;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{router, SignupForm, SignupService, MISSING_NAME};

fn service(outcome: MockOutcome, publisher: MockPublisher) -> SignupService {
    SignupService::new(Arc::new(MockCaptchaVerifier::new(outcome)), publisher)
}

fn form(name: &str, email: &str) -> SignupForm {
    SignupForm {
        name: name.to_string(),
        email: email.to_string(),
        website: "example.org".to_string(),
        captcha: "token".to_string(),
    }
}

async fn post_signup(service: SignupService, body: Value) -> Response {
    router(Arc::new(service))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signup")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test_log::test(tokio::test)]
async fn test_successful_signup_publishes_welcome_email() {
    let publisher = MockPublisher::new("emails");
    let service = service(MockOutcome::Solved, publisher.clone());

    let message_id = service
        .sign_up(form("Jane", " Jane@Example.org "))
        .await
        .unwrap();

    let published = publisher.published_messages();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].message_id, message_id);

    let email: Value = serde_json::from_slice(&published[0].message.data).unwrap();
    assert_eq!(email["recipients"], json!(["jane@example.org"]));
    assert_eq!(email["html"], "<p>Hi Jane, we saw example.org</p>");
}

#[tokio::test]
async fn test_validation_problems_are_aggregated() {
    let service = service(MockOutcome::Solved, MockPublisher::new("emails"));

    let failure = service.sign_up(form("  ", "not-an-email")).await.unwrap_err();
    let user = failure.as_user().expect("validation problems are user failures");

    assert_eq!(
        user.to_string(),
        "- Please enter your name. (missing_name)\n- Email address is invalid. (invalid_email_address)"
    );
    assert_eq!(
        user.friendly_error(),
        "- Please enter your name.\n- Email address is invalid."
    );
    assert_eq!(
        mapsort::keys(&user.errors()),
        vec!["invalid_email_address", MISSING_NAME]
    );
}

#[tokio::test]
async fn test_rejected_captcha_is_a_user_failure() {
    let service = service(MockOutcome::Rejected, MockPublisher::new("emails"));

    let failure = service.sign_up(form("Jane", "jane@example.org")).await.unwrap_err();

    assert!(failure.is_user());
    assert_eq!(failure.to_string(), "Please solve the captcha again. (invalid_captcha)");
}

#[tokio::test]
async fn test_misconfigured_captcha_wraps_system_failure() {
    let service = service(MockOutcome::Misconfigured, MockPublisher::new("emails"));

    let failure = service.sign_up(form("Jane", "jane@example.org")).await.unwrap_err();
    let system = failure.as_system().expect("misconfiguration is a system failure");

    assert_eq!(
        system.to_string(),
        "signup.sign_up: verifying captcha failed\n   hcaptcha.verify: hCaptcha is misconfigured on the server"
    );
    assert_eq!(system.messages().len(), 2);
}

#[tokio::test]
async fn test_publish_failure_nests_three_layers() {
    let publisher = MockPublisher::new("emails").failing("quota exceeded");
    let service = service(MockOutcome::Solved, publisher);

    let failure = service.sign_up(form("Jane", "jane@example.org")).await.unwrap_err();
    let system = failure.as_system().expect("publish errors are system failures");

    assert_eq!(
        system.to_string(),
        "signup.sign_up: sending welcome email failed\n   mailer.send_message: failed to publish message to topic 'emails'\n      quota exceeded"
    );
    assert_eq!(system.summary(), "signup.sign_up: sending welcome email failed");
    assert_eq!(
        system.cause().map(|cause| cause.to_string()),
        Some("quota exceeded".to_string())
    );

    let stack_trace = system.stack_trace();
    assert!(stack_trace.starts_with(system.error()));
    assert_ne!(stack_trace, system.to_string());
}

#[tokio::test]
async fn test_http_user_failure_response() {
    let service = service(MockOutcome::Solved, MockPublisher::new("emails"));

    let response = post_signup(
        service,
        json!({ "name": "", "email": "jane@example.org", "captcha": "token" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "USER_ERROR");
    assert_eq!(body["error"]["message"], "Please enter your name.");
    assert_eq!(body["error"]["errors"][MISSING_NAME], "Please enter your name.");
}

#[test_log::test(tokio::test)]
async fn test_http_system_failure_response_hides_chain() {
    let publisher = MockPublisher::new("emails").failing("quota exceeded");
    let service = service(MockOutcome::Solved, publisher);

    let response = post_signup(
        service,
        json!({ "name": "Jane", "email": "jane@example.org", "captcha": "token" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert!(!body.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn test_http_success_response() {
    let publisher = MockPublisher::new("emails");
    let service = service(MockOutcome::Solved, publisher.clone());

    let response = post_signup(
        service,
        json!({ "name": "Jane", "email": "jane@example.org", "captcha": "token" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["messageId"],
        publisher.published_messages()[0].message_id.as_str()
    );
}

#[test]
fn test_wrapping_a_wrapped_chain_from_another_crate() {
    let failure = dusted_common::hash(&mut BrokenUpload, b"")
        .map_err(|e| SystemFailure::wrap(e, "uploads", "store", "hashing upload failed"))
        .unwrap_err();

    assert_eq!(
        failure.to_string(),
        "uploads.store: hashing upload failed\n   webfile.hash: reading file failed\n      disk unplugged"
    );
}

struct BrokenUpload;

impl std::io::Read for BrokenUpload {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("disk unplugged"))
    }
}

impl std::io::Seek for BrokenUpload {
    fn seek(&mut self, _pos: std::io::SeekFrom) -> std::io::Result<u64> {
        Ok(0)
    }
}

//! HTTP rendering of failures
//!
//! User failures are safe to show and render their friendly message, codes
//! and messages. System failures are logged with their stack trace and
//! render a generic message only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{Failure, SystemFailure, UserFailure};

const INTERNAL_MESSAGE: &str = "An internal error occurred.";

impl Failure {
    /// Get the appropriate HTTP status code for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            Failure::User(_) => StatusCode::BAD_REQUEST,
            Failure::System(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Failure::User(_) => "USER_ERROR",
            Failure::System(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        let body = match &self {
            Failure::User(user) => json!({
                "error": {
                    "code": error_code,
                    "message": user.friendly_error(),
                    "messages": user.error_messages(),
                    "errors": user.errors(),
                }
            }),
            Failure::System(system) => {
                tracing::error!(
                    error = %system.summary(),
                    stack_trace = %system.stack_trace(),
                    "Internal server error"
                );
                json!({
                    "error": {
                        "code": error_code,
                        "message": INTERNAL_MESSAGE,
                    }
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for UserFailure {
    fn into_response(self) -> Response {
        Failure::from(self).into_response()
    }
}

impl IntoResponse for SystemFailure {
    fn into_response(self) -> Response {
        Failure::from(self).into_response()
    }
}

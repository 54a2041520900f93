//! User failures
//!
//! A user failure is an error caused by the end user, typically a validation
//! problem with user provided input that would result in a 4xx status code.
//! Every message is tagged with a code so that programs acting on behalf of
//! the user can parse the failure, e.g.
//!
//! - `MISSING_FIRST_NAME`: "Please provide your first name"
//! - `INVALID_EMAIL_ADDR`: "Please provide a valid email address"

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// One or more user-facing validation problems, each tagged with a code
///
/// Never empty: the only constructor takes a code and message and nothing
/// removes entries afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFailure {
    // Insertion ordered; re-adding a code keeps its first position
    errors: IndexMap<String, String>,
}

impl UserFailure {
    /// Create a failure holding a single code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = IndexMap::with_capacity(1);
        errors.insert(code.into(), message.into());
        Self { errors }
    }

    /// Add another reason. An existing code has its message replaced
    /// but keeps its position.
    pub fn add(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(code.into(), message.into());
    }

    /// Builder form of [`UserFailure::add`]
    pub fn with(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(code, message);
        self
    }

    /// Same as the `Display` output but without error codes.
    ///
    /// ```text
    /// - First name is required
    /// - Last name is required
    /// ```
    pub fn friendly_error(&self) -> String {
        self.render(false)
    }

    /// Map of error codes to messages
    pub fn errors(&self) -> HashMap<&str, &str> {
        self.errors
            .iter()
            .map(|(code, message)| (code.as_str(), message.as_str()))
            .collect()
    }

    /// Messages only, in the order they were added
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.values().map(String::as_str).collect()
    }

    /// Codes in the order they were added
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// Message recorded for a code
    pub fn message(&self, code: &str) -> Option<&str> {
        self.errors.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.errors.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn render(&self, include_code: bool) -> String {
        let prefix = if self.errors.len() == 1 { "" } else { "- " };

        self.errors
            .iter()
            .map(|(code, message)| {
                if include_code {
                    format!("{prefix}{message} ({code})")
                } else {
                    format!("{prefix}{message}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single failure renders as `Email address is required (MISSING_EMAIL)`.
/// Several render as a list:
///
/// ```text
/// - First name is required (MISSING_FIRST_NAME)
/// - Last name is required (MISSING_LAST_NAME)
/// ```
impl fmt::Display for UserFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

impl std::error::Error for UserFailure {}

#[derive(Serialize)]
struct UserFailureBody<'a> {
    errors: &'a IndexMap<String, String>,
    messages: Vec<&'a str>,
}

impl Serialize for UserFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        UserFailureBody {
            errors: &self.errors,
            messages: self.error_messages(),
        }
        .serialize(serializer)
    }
}

//! Web addresses with a guaranteed scheme

use std::fmt;

use serde::{Deserialize, Serialize};

const HTTP: &str = "http://";
const HTTPS: &str = "https://";

/// A URL which always starts with `http://` or `https://` unless empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Url(String);

impl Url {
    /// Create a new URL, defaulting to `https://` when no scheme is given
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() || value.starts_with(HTTP) || value.starts_with(HTTPS) {
            return Url(value);
        }
        Url(format!("{HTTPS}{value}"))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the raw URL string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URL without its http/https prefix, for display
    pub fn pretty(&self) -> &str {
        let value = self.0.strip_prefix(HTTPS).unwrap_or(&self.0);
        value.strip_prefix(HTTP).unwrap_or(value)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Url {
    fn from(value: String) -> Self {
        Url::new(value)
    }
}

impl From<&str> for Url {
    fn from(value: &str) -> Self {
        Url::new(value)
    }
}

impl From<Url> for String {
    fn from(url: Url) -> Self {
        url.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_without_http_or_https() {
        let url = Url::new("www.example.org");
        assert_eq!(url.as_str(), "https://www.example.org");
    }

    #[test]
    fn test_new_with_http() {
        let url = Url::new("http://www.example.org");
        assert_eq!(url.as_str(), "http://www.example.org");
    }

    #[test]
    fn test_new_with_https() {
        let url = Url::new("https://www.example.org/path");
        assert_eq!(url.to_string(), "https://www.example.org/path");
    }

    #[test]
    fn test_empty() {
        assert!(Url::new("").is_empty());
        assert!(Url::default().is_empty());
        assert!(!Url::new("example.org").is_empty());
    }

    #[test]
    fn test_pretty_strips_scheme() {
        assert_eq!(Url::new("https://example.org").pretty(), "example.org");
        assert_eq!(Url::new("http://example.org/a").pretty(), "example.org/a");
        assert_eq!(Url::new("").pretty(), "");
    }

    #[test]
    fn test_serde_adds_scheme() {
        let url: Url = serde_json::from_str("\"example.org\"").unwrap();
        assert_eq!(url.as_str(), "https://example.org");
        assert_eq!(serde_json::to_string(&url).unwrap(), "\"https://example.org\"");
    }
}

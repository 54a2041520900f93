//! Email address parsing and normalisation

use std::fmt;
use std::str::FromStr;

use dusted_fault::UserFailure;
use serde::{Deserialize, Serialize};

pub const MISSING_EMAIL_ADDRESS: &str = "missing_email_address";
pub const INVALID_EMAIL_ADDRESS: &str = "invalid_email_address";

// Shortest plausible address: x@x.xx
const MIN_LENGTH: usize = 6;

/// A trimmed, lowercase email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    value: String,
    domain_start: usize,
}

impl Address {
    /// Validate, normalise and create a new address
    pub fn parse(value: &str) -> Result<Self, UserFailure> {
        let value = value.to_lowercase().trim().to_string();

        if value.is_empty() {
            return Err(UserFailure::new(
                MISSING_EMAIL_ADDRESS,
                "Email address is required.",
            ));
        }

        let invalid = || UserFailure::new(INVALID_EMAIL_ADDRESS, "Email address is invalid.");

        if value.len() < MIN_LENGTH {
            return Err(invalid());
        }

        let (last_at, last_dot) = match (value.rfind('@'), value.rfind('.')) {
            (Some(at), Some(dot)) => (at, dot),
            _ => return Err(invalid()),
        };
        if last_dot < last_at {
            return Err(invalid());
        }

        let domain_start = value.find('@').map(|at| at + 1).ok_or_else(invalid)?;

        Ok(Self {
            value,
            domain_start,
        })
    }

    /// Lowercase and trimmed representation
    pub fn normalised(&self) -> &str {
        &self.value
    }

    /// Everything after the first '@'
    pub fn domain(&self) -> &str {
        &self.value[self.domain_start..]
    }

    /// Case-insensitive comparison against a raw address
    pub fn equals(&self, other: &str) -> bool {
        self.value == other.to_lowercase()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Address {
    type Err = UserFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = UserFailure;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.value
    }
}

//! Validated value types shared across applications
//!
//! - [`Address`]: a normalised email address, parse failures are
//!   [`UserFailure`](dusted_fault::UserFailure)s ready to show to end users
//! - [`Url`]: a web address that always carries an http(s) scheme

pub mod email;
pub mod url;

pub use email::Address;
pub use url::Url;

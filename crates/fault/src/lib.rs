//! Structured failures shared by the dusted crates
//!
//! Two disjoint kinds of failure:
//! - [`UserFailure`]: expected, caller-actionable problems (validation) that
//!   carry a stable code and are safe to show to end users
//! - [`SystemFailure`]: unexpected internal faults that carry a nested
//!   message chain and a stack trace for diagnostics
//!
//! Any other error is treated as an opaque cause and wrapped into a
//! [`SystemFailure`] where it is first observed:
//!
//! ```
//! use dusted_fault::SystemFailure;
//!
//! let root = SystemFailure::new("db", "get", "entity not found");
//! let wrapped = SystemFailure::wrap(root, "users", "load", "loading user failed");
//!
//! assert_eq!(
//!     wrapped.to_string(),
//!     "users.load: loading user failed\n   db.get: entity not found"
//! );
//! ```

pub mod ext;
#[cfg(feature = "axum")]
pub mod http;
pub mod stack;
pub mod system;
pub mod user;

pub use ext::ResultExt;
pub use stack::Trace;
pub use system::SystemFailure;
pub use user::UserFailure;

/// Common result type
pub type Result<T> = std::result::Result<T, Failure>;

/// Either kind of failure
///
/// User failures are terminal by convention: they propagate unchanged to
/// the boundary that renders them and are not wrapped as system failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Failure {
    #[error(transparent)]
    User(#[from] UserFailure),

    #[error(transparent)]
    System(#[from] SystemFailure),
}

impl Failure {
    /// Shorthand for a single-reason [`UserFailure`]
    pub fn user(code: impl Into<String>, message: impl Into<String>) -> Self {
        Failure::User(UserFailure::new(code, message))
    }

    /// Shorthand for [`SystemFailure::new`]
    pub fn system(component: &str, operation: &str, message: impl Into<String>) -> Self {
        Failure::System(SystemFailure::new(component, operation, message))
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Failure::User(_))
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Failure::System(_))
    }

    pub fn as_user(&self) -> Option<&UserFailure> {
        match self {
            Failure::User(user) => Some(user),
            Failure::System(_) => None,
        }
    }

    pub fn as_system(&self) -> Option<&SystemFailure> {
        match self {
            Failure::System(system) => Some(system),
            Failure::User(_) => None,
        }
    }
}

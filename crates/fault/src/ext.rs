//! Result extensions for wrapping errors at call boundaries

use std::error::Error as StdError;

use crate::SystemFailure;

/// Wrap the error of a `Result` into a [`SystemFailure`]
///
/// ```
/// use dusted_fault::{ResultExt, SystemFailure};
///
/// fn read_config() -> Result<String, SystemFailure> {
///     std::fs::read_to_string("/does/not/exist.toml")
///         .wrap_system("config", "read", "reading config file failed")
/// }
///
/// let failure = read_config().unwrap_err();
/// assert!(failure.to_string().starts_with("config.read: reading config file failed\n   "));
/// ```
pub trait ResultExt<T> {
    fn wrap_system(
        self,
        component: &str,
        operation: &str,
        message: impl Into<String>,
    ) -> Result<T, SystemFailure>;

    /// Like [`ResultExt::wrap_system`], building the message only on error
    fn wrap_system_with<M, F>(
        self,
        component: &str,
        operation: &str,
        message: F,
    ) -> Result<T, SystemFailure>
    where
        M: Into<String>,
        F: FnOnce() -> M;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    fn wrap_system(
        self,
        component: &str,
        operation: &str,
        message: impl Into<String>,
    ) -> Result<T, SystemFailure> {
        self.map_err(|err| SystemFailure::wrap(err, component, operation, message))
    }

    fn wrap_system_with<M, F>(
        self,
        component: &str,
        operation: &str,
        message: F,
    ) -> Result<T, SystemFailure>
    where
        M: Into<String>,
        F: FnOnce() -> M,
    {
        self.map_err(|err| SystemFailure::wrap(err, component, operation, message()))
    }
}

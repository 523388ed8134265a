//! Plugin error types.

use thiserror::Error;

/// Cancellation signal raised by the reporter in fail-fast mode.
///
/// Returned by every append-style `Reporter` call once the finding has been
/// recorded. Validators propagate it with `?`; it is not a failure of the
/// plugin itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("validation aborted on first error")]
pub struct Aborted;

/// Errors that can occur while a plugin is configured, installed or run.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A system tool the plugin needs is not available.
    #[error("Your system does not have {command} installed which is needed to run {needed_for}")]
    MissingDependency { command: String, needed_for: String },

    /// An external command could not be executed.
    #[error("Command failed: {0}")]
    Command(String),

    /// Bad plugin options.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled by the reporter.
    #[error(transparent)]
    Aborted(#[from] Aborted),

    /// Bug or unexpected state inside a plugin.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PluginError {
    /// Creates a missing dependency error.
    pub fn missing_dependency(command: impl Into<String>, needed_for: impl Into<String>) -> Self {
        Self::MissingDependency {
            command: command.into(),
            needed_for: needed_for.into(),
        }
    }

    /// Creates a command error.
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command(message.into())
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this is the fail-fast cancellation signal.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_converts_into_plugin_error() {
        fn report() -> Result<(), Aborted> {
            Err(Aborted)
        }
        fn validate() -> Result<(), PluginError> {
            report()?;
            Ok(())
        }

        let err = validate().unwrap_err();
        assert!(err.is_abort());
    }

    #[test]
    fn test_missing_dependency_message() {
        let err = PluginError::missing_dependency("java", "jslint");
        assert_eq!(
            err.to_string(),
            "Your system does not have java installed which is needed to run jslint"
        );
        assert!(!err.is_abort());
    }
}

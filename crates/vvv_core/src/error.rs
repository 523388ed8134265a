//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a run before any file is validated.
#[derive(Debug, Error)]
pub enum VvvError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed glob or regular expression.
    #[error("Bad pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    /// Unparseable YAML file.
    #[error("Could not parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Plugin failed while being configured.
    #[error("Plugin {id} could not be set up: {source}")]
    Plugin {
        id: String,
        #[source]
        source: vvv_plugin::PluginError,
    },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VvvError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a pattern error.
    pub fn pattern(pattern: impl Into<String>, message: impl ToString) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }
}

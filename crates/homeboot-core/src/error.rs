//! Error types for the bootstrap orchestrator
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the bootstrap orchestrator
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed operator input. Raised before any side effect.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Elevation is required but unavailable. Raised before any side effect.
    #[error("Privilege error: {0}")]
    Privilege(String),

    /// A package installation step failed
    #[error("Install error ({tool}): {message}")]
    Install {
        /// Tool being installed
        tool: String,
        /// Error message
        message: String,
    },

    /// The container orchestration tool failed to start the stack
    #[error("Launch error (exit status {}): {message}", fmt_status(.status))]
    Launch {
        /// Exit status of the underlying tool, if it exited normally
        status: Option<i32>,
        /// Error message (usually the tool's stderr)
        message: String,
    },

    /// The DDNS provider could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The caller may not manage the requested schedule
    #[error("Permission error: {0}")]
    Permission(String),

    /// An external command could not be spawned or returned garbage
    #[error("Command error: {0}")]
    Command(String),

    /// Configuration errors (unknown provider, bad settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML rendering errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn fmt_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a privilege error
    pub fn privilege(msg: impl Into<String>) -> Self {
        Self::Privilege(msg.into())
    }

    /// Create an install error
    pub fn install(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Install {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a launch error
    pub fn launch(status: Option<i32>, message: impl Into<String>) -> Self {
        Self::Launch {
            status,
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// Create a command error
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error must abort the run before anything is mutated
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Privilege(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

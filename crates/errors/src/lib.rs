#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the mtspack packaging pipeline
//!
//! This crate provides fine-grained error types organized by pipeline step.
//! All error types implement Clone for easier handling.

use std::borrow::Cow;

use thiserror::Error;

pub mod archive;
pub mod artifact;
pub mod build;
pub mod config;
pub mod deps;
pub mod environment;

// Re-export all error types at the root
pub use archive::ArchiveError;
pub use artifact::ArtifactError;
pub use build::BuildError;
pub use config::ConfigError;
pub use deps::DepsError;
pub use environment::EnvironmentError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("environment error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("dependency error: {0}")]
    Deps(#[from] DepsError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

/// Result type alias for mtspack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Stable error code for analytics / structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Environment(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::Deps(err) => err.user_hint(),
            Error::Build(err) => err.user_hint(),
            Error::Artifact(err) => err.user_hint(),
            Error::Archive(err) => err.user_hint(),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Environment(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Deps(err) => err.user_code(),
            Error::Build(err) => err.user_code(),
            Error::Artifact(err) => err.user_code(),
            Error::Archive(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}

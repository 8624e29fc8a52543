//! Dependency provisioning error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DepsError {
    #[error("requirements manifest not found: {path}")]
    ManifestMissing { path: String },

    #[error("interpreter not found: {name}")]
    InterpreterNotFound { name: String },

    #[error("dependency installation failed: {message}")]
    InstallFailed { message: String },
}

impl UserFacingError for DepsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestMissing { .. } => {
                Some("Ensure the requirements manifest exists at the project root.")
            }
            Self::InterpreterNotFound { .. } => {
                Some("Install the interpreter or point the configuration at an existing one.")
            }
            Self::InstallFailed { .. } => {
                Some("Check network access and the package entries in the manifest.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ManifestMissing { .. } => "deps.manifest_missing",
            Self::InterpreterNotFound { .. } => "deps.interpreter_not_found",
            Self::InstallFailed { .. } => "deps.install_failed",
        };
        Some(code)
    }
}

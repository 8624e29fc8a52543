//! Environment isolation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum EnvironmentError {
    #[error("current working directory unavailable: {message}")]
    CurrentDirUnavailable { message: String },

    #[error("cannot change directory to {path}: {message}")]
    ChangeDirFailed { path: String, message: String },
}

impl UserFacingError for EnvironmentError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CurrentDirUnavailable { .. } => {
                Some("Run the packager from a directory that still exists and is readable.")
            }
            Self::ChangeDirFailed { .. } => {
                Some("Check that the project root exists and is accessible.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::CurrentDirUnavailable { .. } => "environment.current_dir_unavailable",
            Self::ChangeDirFailed { .. } => "environment.change_dir_failed",
        };
        Some(code)
    }
}

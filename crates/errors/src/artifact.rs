//! Artifact assembly error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ArtifactError {
    #[error("missing artifact: no file matching {prefix}* in {dir}")]
    Missing { prefix: String, dir: String },

    #[error("ambiguous artifact: {count} files matching {prefix}* in {dir}")]
    Ambiguous {
        prefix: String,
        dir: String,
        count: usize,
    },

    #[error("failed to move {file}: {message}")]
    MoveFailed { file: String, message: String },

    #[error("failed to copy {file}: {message}")]
    CopyFailed { file: String, message: String },

    #[error("invalid artifact name: {path}")]
    InvalidName { path: String },
}

impl UserFacingError for ArtifactError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Missing { .. } | Self::Ambiguous { .. } => {
                Some("Rerun the build after cleaning the build output directory.")
            }
            Self::MoveFailed { .. } | Self::CopyFailed { .. } => {
                Some("Check permissions and free space on the output location.")
            }
            Self::InvalidName { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Missing { .. } => "artifact.missing",
            Self::Ambiguous { .. } => "artifact.ambiguous",
            Self::MoveFailed { .. } => "artifact.move_failed",
            Self::CopyFailed { .. } => "artifact.copy_failed",
            Self::InvalidName { .. } => "artifact.invalid_name",
        };
        Some(code)
    }
}

//! Archive creation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("tar creation failed: {message}")]
    TarFailed { message: String },

    #[error("compression failed: {message}")]
    CompressionFailed { message: String },

    #[error("failed to finalize archive {path}: {message}")]
    FinalizeFailed { path: String, message: String },
}

impl UserFacingError for ArchiveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        Some("Check permissions and free space on the output location, then rerun.")
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::TarFailed { .. } => "archive.tar_failed",
            Self::CompressionFailed { .. } => "archive.compression_failed",
            Self::FinalizeFailed { .. } => "archive.finalize_failed",
        };
        Some(code)
    }
}

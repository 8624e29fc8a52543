//! Build invocation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("build failed: {message}")]
    Failed { message: String },

    #[error("build produced no output directory: {path}")]
    OutputMissing { path: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Failed { .. } => Some("Inspect the build tool output above for the root cause."),
            Self::OutputMissing { .. } => {
                Some("Confirm the build descriptor targets the expected output directory.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Failed { .. } => "build.failed",
            Self::OutputMissing { .. } => "build.output_missing",
        };
        Some(code)
    }
}

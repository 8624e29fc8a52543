//! CLI error handling

use std::fmt;

use mtspack_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Pipeline error from any packaging step
    Pipeline(mtspack_errors::Error),
    /// System setup error
    Setup(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Pipeline(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::Setup(msg) => write!(f, "System setup error: {msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Pipeline(e) => Some(e),
            CliError::Setup(_) => None,
        }
    }
}

impl From<mtspack_errors::Error> for CliError {
    fn from(e: mtspack_errors::Error) -> Self {
        CliError::Pipeline(e)
    }
}

//! Environment and working-directory isolation around the build step
//!
//! Both guards follow scoped acquisition/release discipline: state is
//! captured on construction and reinstated on drop, so restoration covers
//! early returns and panic unwinds alike.

use mtspack_errors::{EnvironmentError, Error};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Masks a module-search environment variable for the duration of a scope
///
/// The previous value is captured on construction and the variable is set
/// to the empty string, so tools spawned inside the scope resolve modules
/// only from their own installed environment. The original state (set or
/// unset) is reinstated on drop.
#[derive(Debug)]
pub struct EnvironmentSandbox {
    name: OsString,
    saved: Option<OsString>,
}

impl EnvironmentSandbox {
    /// Capture the variable's current value and clear it
    #[must_use]
    pub fn engage(name: &str) -> Self {
        let saved = env::var_os(name);
        env::set_var(name, "");
        tracing::debug!(
            variable = name,
            previously_set = saved.is_some(),
            "masked module search path"
        );
        Self {
            name: name.into(),
            saved,
        }
    }

    /// Value the variable held before the sandbox engaged, if any
    #[must_use]
    pub fn saved_value(&self) -> Option<&OsString> {
        self.saved.as_ref()
    }
}

impl Drop for EnvironmentSandbox {
    fn drop(&mut self) {
        match self.saved.take() {
            Some(value) => env::set_var(&self.name, value),
            None => env::remove_var(&self.name),
        }
    }
}

/// Relocates the process to the project root for the duration of a scope
///
/// The caller's working directory is captured on entry and restored on
/// drop; a failed build must not leave the caller's shell in the wrong
/// directory.
#[derive(Debug)]
pub struct WorkdirContext {
    original: PathBuf,
}

impl WorkdirContext {
    /// Capture the current directory and switch to `project_root`
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined or
    /// the switch to `project_root` fails. No filesystem mutation has
    /// happened at that point.
    pub fn enter(project_root: &Path) -> Result<Self, Error> {
        let original =
            env::current_dir().map_err(|e| EnvironmentError::CurrentDirUnavailable {
                message: e.to_string(),
            })?;

        env::set_current_dir(project_root).map_err(|e| EnvironmentError::ChangeDirFailed {
            path: project_root.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            from = %original.display(),
            to = %project_root.display(),
            "entered project root"
        );

        Ok(Self { original })
    }

    /// Directory the process was in before the switch
    #[must_use]
    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for WorkdirContext {
    fn drop(&mut self) {
        if let Err(error) = env::set_current_dir(&self.original) {
            tracing::warn!(
                path = %self.original.display(),
                %error,
                "failed to restore working directory"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_restores_set_variable() {
        let var = "MTSPACK_TEST_SANDBOX_SET";
        env::set_var(var, "/caller/site-packages");

        {
            let sandbox = EnvironmentSandbox::engage(var);
            assert_eq!(env::var(var).unwrap(), "");
            assert_eq!(
                sandbox.saved_value().map(|v| v.to_string_lossy().into_owned()),
                Some("/caller/site-packages".to_string())
            );
        }

        assert_eq!(env::var(var).unwrap(), "/caller/site-packages");
        env::remove_var(var);
    }

    #[test]
    fn sandbox_restores_unset_variable() {
        let var = "MTSPACK_TEST_SANDBOX_UNSET";
        env::remove_var(var);

        {
            let _sandbox = EnvironmentSandbox::engage(var);
            assert_eq!(env::var(var).unwrap(), "");
        }

        assert!(env::var_os(var).is_none());
    }

    #[test]
    fn sandbox_restores_on_panic() {
        let var = "MTSPACK_TEST_SANDBOX_PANIC";
        env::set_var(var, "original");

        let result = std::panic::catch_unwind(|| {
            let _sandbox = EnvironmentSandbox::engage(var);
            panic!("build blew up");
        });

        assert!(result.is_err());
        assert_eq!(env::var(var).unwrap(), "original");
        env::remove_var(var);
    }
}

//! Freeze-build invocation
//!
//! The build tool is an external collaborator: given the project root it
//! emits a build output directory containing one `exe_`-prefixed
//! executable and zero or more `lib_`-prefixed shared libraries. A
//! non-zero exit or a missing output directory aborts the pipeline before
//! artifact assembly.

use crate::PackageContext;
use mtspack_errors::{BuildError, Error};
use std::process::Stdio;
use tokio::process::Command;

pub(crate) async fn run_build(context: &PackageContext) -> Result<(), Error> {
    tracing::info!(
        project_root = %context.project_root.display(),
        "running freeze build"
    );

    let output = Command::new(&context.python)
        .args(["setup.py", "build"])
        .current_dir(&context.project_root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| BuildError::Failed {
            message: format!("{} setup.py build: {e}", context.python),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BuildError::Failed {
            message: format!(
                "build tool exited with {}: {}",
                output.status,
                stderr.trim()
            ),
        }
        .into());
    }

    let build_dir = context.build_output_dir();
    if !build_dir.is_dir() {
        return Err(BuildError::OutputMissing {
            path: build_dir.display().to_string(),
        }
        .into());
    }

    tracing::debug!(build_dir = %build_dir.display(), "freeze build completed");
    Ok(())
}

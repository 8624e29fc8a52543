//! Dependency provisioning via pip
//!
//! The provisioner is an external collaborator: it is handed the manifest
//! path and its side effect is making the listed packages importable in
//! the interpreter's environment. Any failure here aborts the pipeline
//! before the build is invoked.

use crate::PackageContext;
use mtspack_errors::{DepsError, Error};
use std::process::Stdio;
use tokio::process::Command;

pub(crate) async fn install_requirements(context: &PackageContext) -> Result<(), Error> {
    let manifest = context.manifest_path();
    if !manifest.is_file() {
        return Err(DepsError::ManifestMissing {
            path: manifest.display().to_string(),
        }
        .into());
    }

    let python = which::which(&context.python).map_err(|_| DepsError::InterpreterNotFound {
        name: context.python.clone(),
    })?;

    tracing::info!(
        manifest = %manifest.display(),
        interpreter = %python.display(),
        "installing build requirements"
    );

    let output = Command::new(&python)
        .args(["-m", "pip", "install", "--requirement"])
        .arg(&manifest)
        .current_dir(&context.project_root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| DepsError::InstallFailed {
            message: format!("{}: {e}", python.display()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DepsError::InstallFailed {
            message: format!("pip exited with {}: {}", output.status, stderr.trim()),
        }
        .into());
    }

    tracing::debug!("build requirements installed");
    Ok(())
}

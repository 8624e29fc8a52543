//! mtspack - macOS distribution packager for the MySQL Tools Service
//!
//! This is the CLI application that drives the packaging pipeline in the
//! builder crate: dependency provisioning, the freeze build, artifact
//! assembly, and archive creation.

mod cli;
mod error;

use crate::cli::Cli;
use crate::error::CliError;
use clap::Parser;
use mtspack_builder::{package, PackageContext};
use mtspack_config::Config;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        error!("packaging failed: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting mtspack v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env();

    // 3. Apply CLI flags (highest precedence)
    let project_root = resolve_project_root(&cli, &config)?;
    let output_root = resolve_output_root(&cli, &config)?;

    let context = PackageContext::from_config(&config, project_root, output_root);
    let report = package(&context).await?;

    println!(
        "Packaged {} ({} shared libraries)",
        report.dist_dir.display(),
        report.libraries
    );
    println!(
        "Archive: {} ({} bytes)",
        report.archive_path.display(),
        report.archive_size
    );

    info!("Packaging completed successfully");
    Ok(())
}

/// Resolve the project root: CLI flag, then config, then the parent of
/// the directory holding this binary
fn resolve_project_root(cli: &Cli, config: &Config) -> Result<PathBuf, CliError> {
    if let Some(root) = &cli.project_root {
        return Ok(root.clone());
    }
    if let Some(root) = &config.paths.project_root {
        return Ok(root.clone());
    }

    let exe = std::env::current_exe()
        .map_err(|e| CliError::Setup(format!("cannot locate own executable: {e}")))?;
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            CliError::Setup("cannot derive a project root from the executable location".to_string())
        })
}

/// Resolve the output root: CLI flag, then config, then the caller's
/// current directory
fn resolve_output_root(cli: &Cli, config: &Config) -> Result<PathBuf, CliError> {
    if let Some(root) = &cli.output_dir {
        return Ok(root.clone());
    }
    if let Some(root) = &config.paths.output_root {
        return Ok(root.clone());
    }

    std::env::current_dir()
        .map_err(|e| CliError::Setup(format!("cannot determine current directory: {e}")))
}

/// Initialize tracing to stderr; `--debug` raises the default level
fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

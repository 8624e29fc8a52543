//! Command line interface definition

use clap::Parser;
use std::path::PathBuf;

/// mtspack - macOS distribution packager for the MySQL Tools Service
#[derive(Parser)]
#[command(name = "mtspack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Package the MySQL Tools Service distribution for macOS")]
#[command(long_about = None)]
pub struct Cli {
    /// Project root containing the service sources (default: the parent
    /// of the directory holding this binary)
    #[arg(long, value_name = "PATH")]
    pub project_root: Option<PathBuf>,

    /// Directory receiving the distribution directory and archive
    /// (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

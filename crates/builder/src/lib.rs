#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Packaging pipeline for the macOS tools-service distribution
//!
//! The pipeline is a fixed, non-branching sequence: mask the module-search
//! variable, relocate to the project root, provision dependencies, run the
//! freeze build, restore the caller's environment, assemble the
//! distribution directory, and compress it into the release archive.
//! Every step failure is fatal; environment and working-directory
//! restoration are guaranteed on all exit paths.

mod archive;
mod assemble;
mod environment;
mod invoke;
mod provision;

pub use archive::{create_archive, ArchiveOutput};
pub use assemble::{assemble_distribution, ArtifactRule, AssembledDistribution, Cardinality};
pub use environment::{EnvironmentSandbox, WorkdirContext};

use mtspack_config::Config;
use mtspack_errors::Error;
use std::path::PathBuf;

/// File-name prefix identifying the executable in build output
pub const EXECUTABLE_PREFIX: &str = "exe_";

/// File-name prefix identifying shared libraries in build output
pub const LIBRARY_PREFIX: &str = "lib_";

/// Subdirectory of the distribution holding shared libraries
pub const LIB_SUBDIR: &str = "lib";

/// Resolved inputs for one packaging run
///
/// All paths are absolute and fixed up front; the pipeline steps receive
/// this context instead of consulting global process state.
#[derive(Clone, Debug)]
pub struct PackageContext {
    /// Product name; names the distribution directory, the executable
    /// inside it, and the archive
    pub product: String,
    /// Platform tag appended to the archive file name
    pub platform_tag: String,
    /// Interpreter driving pip and the freeze build
    pub python: String,
    /// Module-search variable masked around the build step
    pub module_search_var: String,
    /// Directory the build runs in
    pub project_root: PathBuf,
    /// Directory receiving the distribution directory and archive
    pub output_root: PathBuf,
    /// Build output directory name, relative to the project root
    pub build_dir: String,
    /// Requirements manifest name, relative to the project root
    pub manifest: String,
}

impl PackageContext {
    /// Build a context from configuration plus the resolved roots
    #[must_use]
    pub fn from_config(config: &Config, project_root: PathBuf, output_root: PathBuf) -> Self {
        Self {
            product: config.product.name.clone(),
            platform_tag: config.product.platform_tag.clone(),
            python: config.tool.python.clone(),
            module_search_var: config.tool.module_search_var.clone(),
            project_root,
            output_root,
            build_dir: config.paths.build_dir.clone(),
            manifest: config.paths.manifest.clone(),
        }
    }

    /// Directory where the build tool deposits raw artifacts
    #[must_use]
    pub fn build_output_dir(&self) -> PathBuf {
        self.project_root.join(&self.build_dir)
    }

    /// Path of the requirements manifest
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.project_root.join(&self.manifest)
    }

    /// Canonical distribution directory
    #[must_use]
    pub fn dist_dir(&self) -> PathBuf {
        self.output_root.join(&self.product)
    }

    /// Path of the final archive
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.output_root
            .join(format!("{}-{}.tar.gz", self.product, self.platform_tag))
    }
}

/// Summary of a completed packaging run
#[derive(Clone, Debug)]
pub struct PackageReport {
    /// Assembled distribution directory
    pub dist_dir: PathBuf,
    /// Final archive file
    pub archive_path: PathBuf,
    /// Number of shared libraries co-located with the executable
    pub libraries: usize,
    /// Archive size in bytes
    pub archive_size: u64,
}

/// Run the full packaging pipeline
///
/// The module-search variable and the caller's working directory are
/// restored before assembly begins, on success and failure alike.
///
/// # Errors
///
/// Returns the first fatal step error: dependency provisioning, build
/// invocation, artifact assembly, or archive creation.
pub async fn package(context: &PackageContext) -> Result<PackageReport, Error> {
    tracing::info!(
        product = %context.product,
        project_root = %context.project_root.display(),
        "packaging distribution"
    );

    let build_result = {
        let _sandbox = EnvironmentSandbox::engage(&context.module_search_var);
        let _workdir = WorkdirContext::enter(&context.project_root)?;
        run_build_steps(context).await
        // guards drop here: working directory first, then the variable
    };
    build_result?;

    let assembled = assemble_distribution(context).await?;
    let archive = create_archive(context).await?;

    tracing::info!(
        archive = %archive.path.display(),
        size = archive.size,
        "distribution packaged"
    );

    Ok(PackageReport {
        dist_dir: assembled.dist_dir,
        archive_path: archive.path,
        libraries: assembled.libraries.len(),
        archive_size: archive.size,
    })
}

async fn run_build_steps(context: &PackageContext) -> Result<(), Error> {
    provision::install_requirements(context).await?;
    invoke::run_build(context).await
}

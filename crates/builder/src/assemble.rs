//! Artifact discovery and distribution assembly
//!
//! Artifacts are selected by declarative rules (name prefix plus expected
//! cardinality) validated explicitly, so an absent or ambiguous build
//! result surfaces a clear error instead of an arbitrary pick. After
//! assembly the distribution directory is self-contained: the executable
//! resolves its shared libraries via the relative `lib/` path.

use crate::{PackageContext, EXECUTABLE_PREFIX, LIBRARY_PREFIX, LIB_SUBDIR};
use mtspack_errors::{ArtifactError, Error};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Expected number of matches for an artifact selection rule
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    /// Exactly one match; zero is a missing artifact, more is ambiguous
    ExactlyOne,
    /// Any number of matches, including none
    ZeroOrMore,
}

/// Declarative selection rule for build artifacts
#[derive(Clone, Copy, Debug)]
pub struct ArtifactRule {
    /// File-name prefix the artifact must carry
    pub prefix: &'static str,
    /// How many matches the rule expects
    pub cardinality: Cardinality,
}

impl ArtifactRule {
    /// Select the files matching this rule in `dir`, sorted by name
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, or if the match
    /// count violates the rule's cardinality.
    pub async fn select(&self, dir: &Path) -> Result<Vec<PathBuf>, Error> {
        let mut matches = Vec::new();

        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let is_match = name
                .to_str()
                .is_some_and(|name| name.starts_with(self.prefix));
            if is_match && entry.metadata().await?.is_file() {
                matches.push(entry.path());
            }
        }
        matches.sort();

        if self.cardinality == Cardinality::ExactlyOne {
            if matches.is_empty() {
                return Err(ArtifactError::Missing {
                    prefix: self.prefix.to_string(),
                    dir: dir.display().to_string(),
                }
                .into());
            }
            if matches.len() > 1 {
                return Err(ArtifactError::Ambiguous {
                    prefix: self.prefix.to_string(),
                    dir: dir.display().to_string(),
                    count: matches.len(),
                }
                .into());
            }
        }

        Ok(matches)
    }
}

/// Result of a successful assembly
#[derive(Clone, Debug)]
pub struct AssembledDistribution {
    /// The canonical distribution directory
    pub dist_dir: PathBuf,
    /// The relocated executable, renamed after the product
    pub executable: PathBuf,
    /// Shared libraries copied under the `lib/` subdirectory
    pub libraries: Vec<PathBuf>,
}

/// Assemble the canonical distribution directory from the build output
///
/// Selects the single executable artifact, moves it into the distribution
/// directory under the product name, and copies every library artifact
/// into the `lib/` subdirectory. A stale distribution directory from a
/// previous run is removed first. The build output is validated before
/// anything is mutated.
///
/// # Errors
///
/// Returns an error if the executable is missing or ambiguous, or if any
/// move/copy fails.
pub async fn assemble_distribution(
    context: &PackageContext,
) -> Result<AssembledDistribution, Error> {
    let build_dir = context.build_output_dir();
    let dist_dir = context.dist_dir();

    let executable_rule = ArtifactRule {
        prefix: EXECUTABLE_PREFIX,
        cardinality: Cardinality::ExactlyOne,
    };
    let library_rule = ArtifactRule {
        prefix: LIBRARY_PREFIX,
        cardinality: Cardinality::ZeroOrMore,
    };

    let mut executables = executable_rule.select(&build_dir).await?;
    let libraries = library_rule.select(&build_dir).await?;
    let Some(executable) = executables.pop() else {
        return Err(Error::internal("executable selection returned no match"));
    };

    ensure_empty_dir(&dist_dir).await?;

    let target = dist_dir.join(&context.product);
    move_file(&executable, &target).await?;

    let lib_dir = dist_dir.join(LIB_SUBDIR);
    fs::create_dir_all(&lib_dir).await?;
    for library in &libraries {
        let file_name = library
            .file_name()
            .ok_or_else(|| ArtifactError::InvalidName {
                path: library.display().to_string(),
            })?;
        fs::copy(library, lib_dir.join(file_name))
            .await
            .map_err(|e| ArtifactError::CopyFailed {
                file: library.display().to_string(),
                message: e.to_string(),
            })?;
    }

    tracing::info!(
        dist_dir = %dist_dir.display(),
        libraries = libraries.len(),
        "distribution assembled"
    );

    Ok(AssembledDistribution {
        executable: target,
        dist_dir,
        libraries,
    })
}

/// Ensure a directory exists and is empty
async fn ensure_empty_dir(path: &Path) -> Result<(), Error> {
    if path.exists() {
        fs::remove_dir_all(path).await?;
    }
    fs::create_dir_all(path).await?;
    Ok(())
}

/// Move a file, falling back to copy-and-delete for cross-device renames
async fn move_file(src: &Path, dst: &Path) -> Result<(), Error> {
    if let Err(rename_err) = fs::rename(src, dst).await {
        fs::copy(src, dst).await.map_err(|e| ArtifactError::MoveFailed {
            file: src.display().to_string(),
            message: format!("{rename_err}; copy fallback: {e}"),
        })?;
        fs::remove_file(src)
            .await
            .map_err(|e| ArtifactError::MoveFailed {
                file: src.display().to_string(),
                message: e.to_string(),
            })?;
    }
    Ok(())
}

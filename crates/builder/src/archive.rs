//! Distribution archive creation
//!
//! Produces a gzip-compressed tar of the distribution directory with the
//! directory itself as the sole top-level entry, so extraction reproduces
//! it at the extraction root. The tar stream is deterministic: entries
//! sorted lexicographically, ownership and permissions normalized, and
//! mtimes pinned to `SOURCE_DATE_EPOCH` (or the epoch when unset). The
//! archive is staged next to its final location and renamed into place on
//! success, so no partial archive survives a failure.

use crate::PackageContext;
use mtspack_errors::{ArchiveError, Error};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::File;

/// Fallback timestamp (Unix epoch) when `SOURCE_DATE_EPOCH` is unset
const DETERMINISTIC_TIMESTAMP: u64 = 0;

/// Standard variable for reproducible-build timestamps
const SOURCE_DATE_EPOCH_VAR: &str = "SOURCE_DATE_EPOCH";

/// Location and size of a finished archive
#[derive(Clone, Debug)]
pub struct ArchiveOutput {
    /// Final archive path
    pub path: PathBuf,
    /// Archive size in bytes
    pub size: u64,
}

/// Compress the distribution directory into the release archive
///
/// A stale archive from a previous run is removed before packaging.
///
/// # Errors
///
/// Returns an error if tar construction, compression, or the final rename
/// fails; the staging area is cleaned up in every case.
pub async fn create_archive(context: &PackageContext) -> Result<ArchiveOutput, Error> {
    let dist_dir = context.dist_dir();
    let archive_path = context.archive_path();

    if archive_path.exists() {
        fs::remove_file(&archive_path).await?;
    }

    // Staged in the output root so the final rename stays on one filesystem
    let staging =
        tempfile::tempdir_in(&context.output_root).map_err(|e| ArchiveError::TarFailed {
            message: format!("cannot create staging directory: {e}"),
        })?;

    let tar_path = staging.path().join("dist.tar");
    create_deterministic_tar(
        &dist_dir,
        &tar_path,
        &context.product,
        deterministic_timestamp(),
    )
    .await?;

    let compressed_path = staging.path().join("dist.tar.gz");
    compress_with_gzip(&tar_path, &compressed_path).await?;

    fs::rename(&compressed_path, &archive_path)
        .await
        .map_err(|e| ArchiveError::FinalizeFailed {
            path: archive_path.display().to_string(),
            message: e.to_string(),
        })?;

    let size = fs::metadata(&archive_path).await?.len();
    tracing::info!(archive = %archive_path.display(), size, "archive created");

    Ok(ArchiveOutput {
        path: archive_path,
        size,
    })
}

/// Create a deterministic tar of `source_dir`, rooted at `top_level`
async fn create_deterministic_tar(
    source_dir: &Path,
    tar_path: &Path,
    top_level: &str,
    timestamp: u64,
) -> Result<(), Error> {
    let file = File::create(tar_path).await?;
    let file = file.into_std().await;
    let source_dir = source_dir.to_path_buf();
    let top_level = PathBuf::from(top_level);

    tokio::task::spawn_blocking(move || -> Result<(), Error> {
        let mut builder = tar::Builder::new(file);
        builder.follow_symlinks(false);

        // Root entry first, so extraction reproduces the distribution
        // directory at the extraction root
        let metadata = std::fs::metadata(&source_dir)?;
        append_dir_entry(&mut builder, &top_level, &metadata, timestamp)?;
        append_tree(&mut builder, &source_dir, &top_level, timestamp)?;

        builder.finish()?;
        Ok(())
    })
    .await
    .map_err(|e| ArchiveError::TarFailed {
        message: format!("tar task failed: {e}"),
    })??;

    Ok(())
}

/// Recursively add directory contents with deterministic ordering
fn append_tree(
    builder: &mut tar::Builder<std::fs::File>,
    dir_path: &Path,
    tar_path: &Path,
    timestamp: u64,
) -> Result<(), Error> {
    let mut entries = std::fs::read_dir(dir_path)?.collect::<Result<Vec<_>, _>>()?;

    // Lexicographic, locale-independent ordering keeps the stream stable
    // across filesystems
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for entry in entries {
        let file_path = entry.path();
        let entry_path = tar_path.join(entry.file_name());
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            append_dir_entry(builder, &entry_path, &metadata, timestamp)?;
            append_tree(builder, &file_path, &entry_path, timestamp)?;
        } else if metadata.is_file() {
            let mut header = normalized_header(tar::EntryType::Regular, timestamp)?;
            header.set_size(metadata.len());
            header.set_mode(normalized_mode(&metadata));
            header.set_cksum();

            let mut file = std::fs::File::open(&file_path)?;
            builder.append_data(&mut header, entry_path.display().to_string(), &mut file)?;
        } else if metadata.is_symlink() {
            let target = std::fs::read_link(&file_path)?;
            let mut header = normalized_header(tar::EntryType::Symlink, timestamp)?;
            header.set_size(0);
            header.set_mode(0o777);
            header.set_link_name(&target)?;
            header.set_cksum();

            builder.append_data(
                &mut header,
                entry_path.display().to_string(),
                std::io::empty(),
            )?;
        }
        // Special files (device nodes, fifos) are skipped
    }

    Ok(())
}

fn append_dir_entry(
    builder: &mut tar::Builder<std::fs::File>,
    entry_path: &Path,
    metadata: &std::fs::Metadata,
    timestamp: u64,
) -> Result<(), Error> {
    let mut header = normalized_header(tar::EntryType::Directory, timestamp)?;
    header.set_size(0);
    header.set_mode(normalized_mode(metadata));
    header.set_cksum();

    let dir_path = format!("{}/", entry_path.display());
    builder.append_data(&mut header, &dir_path, std::io::empty())?;
    Ok(())
}

/// GNU header with normalized ownership and the pinned timestamp
fn normalized_header(entry_type: tar::EntryType, timestamp: u64) -> Result<tar::Header, Error> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_mtime(timestamp);
    header.set_uid(0);
    header.set_gid(0);
    header.set_username("root")?;
    header.set_groupname("root")?;
    header.set_device_major(0)?;
    header.set_device_minor(0)?;
    Ok(header)
}

/// Normalize permissions across filesystems and umask settings
fn normalized_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    if metadata.is_dir() {
        0o755
    } else if metadata.permissions().mode() & 0o111 != 0 {
        0o755
    } else {
        0o644
    }
}

/// Timestamp for reproducible archives: `SOURCE_DATE_EPOCH` or the epoch
#[must_use]
pub(crate) fn deterministic_timestamp() -> u64 {
    std::env::var(SOURCE_DATE_EPOCH_VAR)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(DETERMINISTIC_TIMESTAMP)
}

/// Compress a tar file with gzip via async-compression
async fn compress_with_gzip(tar_path: &Path, output_path: &Path) -> Result<(), Error> {
    use async_compression::tokio::write::GzipEncoder;
    use tokio::io::{AsyncWriteExt, BufReader};

    let input = File::open(tar_path).await?;
    let output = File::create(output_path).await?;

    let mut encoder = GzipEncoder::new(output);
    let mut reader = BufReader::new(input);
    tokio::io::copy(&mut reader, &mut encoder)
        .await
        .map_err(|e| ArchiveError::CompressionFailed {
            message: e.to_string(),
        })?;

    encoder
        .shutdown()
        .await
        .map_err(|e| ArchiveError::CompressionFailed {
            message: e.to_string(),
        })?;

    Ok(())
}

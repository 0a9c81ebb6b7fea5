//! Archive installation
//!
//! Extracts the downloaded ZIP archive into the destination directory,
//! keeping each entry's relative path. Entries that would land outside the
//! destination (absolute names, `..` components) are refused.

use crate::error::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info};

/// Build an [`Error::Extract`] for `archive_path` -> `dest_path`
fn extract_error(archive_path: &Path, dest_path: &Path, reason: impl Into<String>) -> Error {
    let archive = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_path.display().to_string());
    Error::Extract {
        archive,
        destination: dest_path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Extract a single ZIP entry to disk, creating directories as needed
///
/// Returns the written file path, or `None` for directory entries.
fn extract_zip_entry(
    mut entry: zip::read::ZipFile,
    dest_path: &Path,
    archive_path: &Path,
) -> Result<Option<PathBuf>> {
    let relative = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
        extract_error(
            archive_path,
            dest_path,
            format!("entry '{}' escapes the destination directory", entry.name()),
        )
    })?;
    let out_path = dest_path.join(&relative);

    if entry.is_dir() {
        std::fs::create_dir_all(&out_path)?;
        return Ok(None);
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut outfile = File::create(&out_path)?;
    std::io::copy(&mut entry, &mut outfile).map_err(|e| {
        extract_error(
            archive_path,
            dest_path,
            format!("failed to extract '{}': {}", relative.display(), e),
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = entry.unix_mode() {
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode & 0o7777))?;
        }
    }

    debug!(path = ?relative, size = entry.size(), "entry extracted");
    Ok(Some(out_path))
}

/// Extract every entry of the ZIP archive at `archive_path` into `dest_path`
///
/// Blocking; see [`install_archive`] for the async entry point. The archive
/// handle is released before this returns, whatever the outcome.
pub fn extract_zip(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path)
        .map_err(|e| extract_error(archive_path, dest_path, format!("can't open archive: {}", e)))?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        extract_error(
            archive_path,
            dest_path,
            format!("not a valid ZIP archive: {}", e),
        )
    })?;

    let mut extracted_files = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| {
            extract_error(
                archive_path,
                dest_path,
                format!("failed to read entry #{}: {}", i, e),
            )
        })?;

        if let Some(path) = extract_zip_entry(entry, dest_path, archive_path)? {
            extracted_files.push(path);
        }
    }

    Ok(extracted_files)
}

/// Install the archive at `archive_path` into `dest_path`
///
/// Runs the extraction on tokio's blocking pool.
pub async fn install_archive(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
    debug!(?archive_path, ?dest_path, "installing artifact");

    let archive_owned = archive_path.to_path_buf();
    let dest_owned = dest_path.to_path_buf();

    let files = spawn_blocking(move || extract_zip(&archive_owned, &dest_owned))
        .await
        .map_err(|e| {
            extract_error(
                archive_path,
                dest_path,
                format!("extraction task panicked: {}", e),
            )
        })??;

    info!(
        destination = %dest_path.display(),
        extracted_count = files.len(),
        "artifact extracted in {}",
        dest_path.display()
    );
    Ok(files)
}

//! Artifact download
//!
//! Streams the artifact archive of the selected job into
//! `<storage_dir>/artifact-<id>.zip`. The body is written chunk by chunk and
//! never held in memory as a whole. A failed download never leaves a partial
//! archive behind for the installer.

use crate::client::ApiClient;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::types::BuildRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Temporary archive on disk, removed when dropped
///
/// The orchestrator owns exactly one of these per run. Call
/// [`DownloadedArtifact::remove`] to delete it and observe errors; dropping it
/// deletes it silently.
#[derive(Debug)]
pub struct DownloadedArtifact {
    path: PathBuf,
    size: u64,
    removed: bool,
}

impl DownloadedArtifact {
    /// Take ownership of an archive already written at `path`
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            removed: false,
        }
    }

    /// Location of the archive
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes downloaded
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the archive now
    ///
    /// A file that is already gone counts as removed.
    pub async fn remove(mut self) -> Result<()> {
        self.removed = true;
        remove_if_exists(&self.path).await
    }
}

impl Drop for DownloadedArtifact {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, "temporary archive removed on drop"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "failed to remove temporary archive"),
        }
    }
}

/// Deterministic temporary archive path for `build`
pub fn artifact_path(storage_dir: &Path, build: &BuildRecord) -> PathBuf {
    storage_dir.join(format!("artifact-{}.zip", sanitize_id(&build.id.to_string())))
}

/// Keep ids usable as a file name component
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Download the artifact archive of `build` into the storage directory
pub async fn download_artifact(
    client: &ApiClient,
    config: &PipelineConfig,
    build: &BuildRecord,
) -> Result<DownloadedArtifact> {
    let storage_dir = config.storage_dir();
    tokio::fs::create_dir_all(&storage_dir).await?;

    let path = artifact_path(&storage_dir, build);
    let url = client.artifacts_url(&config.project, &build.id);

    debug!(build_id = %build.id, ?path, "downloading artifact");

    // From here on the guard owns the path, so every failure below removes it
    let mut artifact = DownloadedArtifact::new(path, 0);

    let mut file = tokio::fs::File::create(artifact.path()).await.map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!(
                "can't create temporary archive '{}': {}",
                artifact.path().display(),
                e
            ),
        )
    })?;

    let streamed = client.get_to_writer(&url, &mut file).await;
    let synced = file.sync_all().await;
    drop(file);

    if let Err(e) = &streamed {
        warn!(build_id = %build.id, path = ?artifact.path(), error = %e, "can't download artifact");
    }
    let size = streamed?;
    synced?;

    artifact.size = size;
    info!(build_id = %build.id, path = ?artifact.path(), bytes = size, "artifact downloaded");
    Ok(artifact)
}

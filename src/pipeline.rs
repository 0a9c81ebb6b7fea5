//! Pipeline orchestration
//!
//! [`run`] is the single entry point of the library: validate the destination,
//! select the build, download its archive, install it, and always remove the
//! temporary archive before returning.

use crate::client::ApiClient;
use crate::config::PipelineConfig;
use crate::download::download_artifact;
use crate::error::{Error, Result};
use crate::extraction::install_archive;
use crate::selector::select_latest_successful_build;
use crate::types::InstallReport;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Check that the destination exists, is a writable directory and lives
/// inside the project root
///
/// Relative destinations are resolved against the project root. Returns the
/// canonical destination path.
pub fn validate_destination(config: &PipelineConfig) -> Result<PathBuf> {
    let root = config.project_root.canonicalize().map_err(|e| {
        Error::invalid_input(
            "project_root",
            format!("'{}' can't be resolved: {}", config.project_root.display(), e),
        )
    })?;

    let requested = if config.destination_dir.is_absolute() {
        config.destination_dir.clone()
    } else {
        root.join(&config.destination_dir)
    };

    let destination = requested.canonicalize().map_err(|e| {
        Error::invalid_input(
            "destination_dir",
            format!("'{}' must be a valid path: {}", requested.display(), e),
        )
    })?;

    if !destination.is_dir() {
        return Err(Error::invalid_input(
            "destination_dir",
            format!("'{}' is not a directory", destination.display()),
        ));
    }

    if !destination.starts_with(&root) {
        return Err(Error::invalid_input(
            "destination_dir",
            format!(
                "'{}' must be a folder inside the project root '{}'",
                destination.display(),
                root.display()
            ),
        ));
    }

    probe_writable(&destination)?;

    debug!(?destination, "destination validated");
    Ok(destination)
}

/// Create and remove a marker file to prove the directory accepts writes
fn probe_writable(dir: &Path) -> Result<()> {
    let probe = dir.join(format!(".build-artifacts-probe-{}", std::process::id()));
    let created = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe);

    match created {
        Ok(file) => {
            drop(file);
            if let Err(e) = std::fs::remove_file(&probe) {
                warn!(?probe, error = %e, "failed to remove write probe");
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(Error::invalid_input(
            "destination_dir",
            format!("'{}' is not writable: {}", dir.display(), e),
        )),
    }
}

/// Run `stage` under the configured deadline and cancellation token
async fn guarded<T>(config: &PipelineConfig, stage: impl Future<Output = Result<T>>) -> Result<T> {
    let cancel = config.cancel.clone();
    let cancellable = async {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = stage => result,
        }
    };

    match config.deadline {
        Some(deadline) => tokio::time::timeout(deadline, cancellable)
            .await
            .map_err(|_| Error::Timeout(deadline))?,
        None => cancellable.await,
    }
}

/// Fetch the latest successful artifact and install it into the destination
///
/// The temporary archive never outlives this call: it is removed after the
/// install attempt, and dropped (hence removed) on every early return,
/// including deadline expiry and cancellation. Selection and download are
/// subject to the deadline and cancellation token; once extraction has
/// started it runs to completion.
pub async fn run(config: &PipelineConfig) -> Result<InstallReport> {
    let destination = validate_destination(config)?;
    let client = ApiClient::new(&config.api_base_url, &config.token, config.connect_timeout)?;

    info!(
        project = %config.project,
        stage = %config.filter.stage,
        destination = %destination.display(),
        "fetching latest successful artifact"
    );

    let (build, artifact) = guarded(config, async {
        let build = select_latest_successful_build(&client, config).await?;
        let artifact = download_artifact(&client, config, &build).await?;
        Ok((build, artifact))
    })
    .await?;

    let archive_bytes = artifact.size();
    let installed = install_archive(artifact.path(), &destination).await;
    let removed = artifact.remove().await;

    let files = match (installed, removed) {
        (Ok(files), Ok(())) => files,
        (Ok(_), Err(e)) => return Err(e),
        (Err(e), removed) => {
            if let Err(cleanup) = removed {
                warn!(error = %cleanup, "failed to remove temporary archive");
            }
            return Err(e);
        }
    };

    Ok(InstallReport {
        build,
        destination,
        files,
        archive_bytes,
    })
}

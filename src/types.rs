//! Core types for build-artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier of a CI job
///
/// GitLab reports numeric ids, but the field is treated as opaque so string
/// ids from other deployments still decode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildId {
    /// Numeric job id
    Number(u64),
    /// Opaque string job id
    Text(String),
}

impl From<u64> for BuildId {
    fn from(id: u64) -> Self {
        BuildId::Number(id)
    }
}

impl From<&str> for BuildId {
    fn from(id: &str) -> Self {
        BuildId::Text(id.to_string())
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildId::Number(id) => write!(f, "{}", id),
            BuildId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// Job status as reported by the provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    /// Job finished successfully
    Success,
    /// Job failed
    Failed,
    /// Job is executing
    Running,
    /// Job is waiting for a runner
    Pending,
    /// Job has been created but not queued
    Created,
    /// Job was cancelled
    Canceled,
    /// Job was skipped
    Skipped,
    /// Job waits for a manual action
    Manual,
    /// Job is scheduled for later
    Scheduled,
    /// Any status this crate does not know about
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BuildStatus::Success => "success",
            BuildStatus::Failed => "failed",
            BuildStatus::Running => "running",
            BuildStatus::Pending => "pending",
            BuildStatus::Created => "created",
            BuildStatus::Canceled => "canceled",
            BuildStatus::Skipped => "skipped",
            BuildStatus::Manual => "manual",
            BuildStatus::Scheduled => "scheduled",
            BuildStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The `tag` field of a job
///
/// GitLab v4 sends a boolean telling whether `ref` is a tag. Older or
/// compatible APIs send the tag name itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobTag {
    /// `ref` is (or is not) a tag
    Flag(bool),
    /// Explicit tag name
    Name(String),
}

/// Runner that executed a job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    /// Runner id
    pub id: u64,
    /// Runner description
    #[serde(default)]
    pub description: Option<String>,
}

/// User that triggered a job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name
    pub username: String,
}

/// Artifact archive metadata attached to a job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactsFile {
    /// Archive file name on the provider side
    pub filename: String,
    /// Archive size in bytes
    #[serde(default)]
    pub size: Option<u64>,
}

/// One CI job as returned by the jobs listing endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Job id
    pub id: BuildId,
    /// Job status
    pub status: BuildStatus,
    /// Pipeline stage label (e.g. "prepare")
    pub stage: String,
    /// Job name
    #[serde(default)]
    pub name: Option<String>,
    /// Branch or commit reference
    #[serde(default, rename = "ref")]
    pub ref_name: Option<String>,
    /// Tag information
    #[serde(default)]
    pub tag: Option<JobTag>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Runner that executed the job
    #[serde(default)]
    pub runner: Option<Runner>,
    /// User that triggered the job
    #[serde(default)]
    pub user: Option<User>,
    /// Artifact archive metadata
    #[serde(default)]
    pub artifacts_file: Option<ArtifactsFile>,
}

impl BuildRecord {
    /// Tag name this job was run for, if any
    ///
    /// An explicit tag name wins; with a boolean flag the job's ref is the tag.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.tag {
            Some(JobTag::Name(name)) => Some(name.as_str()),
            Some(JobTag::Flag(true)) => self.ref_name.as_deref(),
            Some(JobTag::Flag(false)) | None => None,
        }
    }

    /// Multi-line, human-readable description for operators
    pub fn summary(&self) -> String {
        let runner = match &self.runner {
            Some(r) => format!("{} -> {}", r.id, r.description.as_deref().unwrap_or("-")),
            None => "-".to_string(),
        };
        format!(
            "Latest build [{}]\n- ref: {}\n- stage: {}\n- at: {}\n- runner: {}\n- triggered by: {}",
            self.id,
            self.ref_name.as_deref().unwrap_or("-"),
            self.stage,
            self.created_at.to_rfc3339(),
            runner,
            self.user.as_ref().map(|u| u.username.as_str()).unwrap_or("-"),
        )
    }
}

/// Outcome of a successful pipeline run
#[derive(Clone, Debug)]
pub struct InstallReport {
    /// The job whose artifact was installed
    pub build: BuildRecord,
    /// Canonical destination directory
    pub destination: PathBuf,
    /// Files written under the destination
    pub files: Vec<PathBuf>,
    /// Size of the downloaded archive in bytes
    pub archive_bytes: u64,
}

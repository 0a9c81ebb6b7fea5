//! Configuration types for build-artifacts
//!
//! [`PipelineConfig`] is resolved once by the caller (the binary, or any
//! embedding program) and handed to [`crate::pipeline::run`] as an immutable
//! value. Nothing in the library reads environment variables.

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tokio_util::sync::CancellationToken;

/// Largest page size the GitLab jobs endpoint accepts
pub const MAX_PER_PAGE: u32 = 100;

/// Criteria a job must meet to be selected
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFilter {
    /// Stage the job must belong to (default: "prepare")
    #[serde(default = "default_stage")]
    pub stage: String,

    /// Exact ref the job must have run on (None = any)
    #[serde(default, rename = "ref")]
    pub ref_name: Option<String>,

    /// Tag the job must have run for (None = any)
    #[serde(default)]
    pub tag: Option<String>,
}

impl Default for BuildFilter {
    fn default() -> Self {
        Self {
            stage: default_stage(),
            ref_name: None,
            tag: None,
        }
    }
}

/// Resolved input for one fetch-and-install run
#[derive(Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// GitLab root URL (default: "https://gitlab.com")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// API token sent as `PRIVATE-TOKEN`
    pub token: String,

    /// Project id or `namespace/name` path
    pub project: String,

    /// Root of the project checkout; the destination must live inside it
    pub project_root: PathBuf,

    /// Directory the artifact is extracted into (default: ".")
    #[serde(default = "default_destination_dir")]
    pub destination_dir: PathBuf,

    /// Job selection criteria
    #[serde(default)]
    pub filter: BuildFilter,

    /// Number of jobs requested from the API (default: 50)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Where the temporary archive is written (default: `<project_root>/storage`)
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// Deadline for selection and download (None = no deadline)
    #[serde(default, with = "optional_duration_serde")]
    pub deadline: Option<Duration>,

    /// TCP connect timeout for API requests (default: 30 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Cancels the run when triggered
    #[serde(skip)]
    pub cancel: CancellationToken,
}

impl PipelineConfig {
    /// Create a config with defaults for everything but the required values
    pub fn new(
        token: impl Into<String>,
        project: impl Into<String>,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        let project_root = project_root.into();
        Self {
            api_base_url: default_api_base_url(),
            token: token.into(),
            project: project.into(),
            destination_dir: project_root.clone(),
            project_root,
            filter: BuildFilter::default(),
            per_page: default_per_page(),
            storage_dir: None,
            deadline: None,
            connect_timeout: default_connect_timeout(),
            cancel: CancellationToken::new(),
        }
    }

    /// Directory holding the temporary archive
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| self.project_root.join("storage"))
    }

    /// Page size actually requested, clamped to what the API accepts
    pub fn effective_per_page(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("api_base_url", &self.api_base_url)
            .field("token", &"<redacted>")
            .field("project", &self.project)
            .field("project_root", &self.project_root)
            .field("destination_dir", &self.destination_dir)
            .field("filter", &self.filter)
            .field("per_page", &self.per_page)
            .field("storage_dir", &self.storage_dir)
            .field("deadline", &self.deadline)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

fn default_api_base_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_destination_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_stage() -> String {
    "prepare".to_string()
}

fn default_per_page() -> u32 {
    50
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

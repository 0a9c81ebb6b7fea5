//! # build-artifacts
//!
//! Fetch the artifact archive of the most recent successful GitLab CI job and
//! install it into a directory of the project checkout.
//!
//! ## Pipeline
//!
//! - **Select** - list one page of the project's jobs and keep the first
//!   successful one in the requested stage (and ref/tag, when given)
//! - **Download** - stream the job's artifact archive into a temporary file
//! - **Install** - extract the archive into the destination directory
//! - **Clean up** - remove the temporary archive, whatever happened before
//!
//! The library never reads environment variables: callers resolve a
//! [`PipelineConfig`] once and pass it to [`run`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use build_artifacts::{run, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = PipelineConfig::new("glpat-xxxx", "group/app", "/srv/app");
//!     config.destination_dir = "public".into();
//!     config.filter.ref_name = Some("main".to_string());
//!
//!     let report = run(&config).await?;
//!     println!("{}", report.build.summary());
//!     println!("installed {} file(s)", report.files.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Authenticated GitLab API client
pub mod client;
/// Configuration types
pub mod config;
/// Artifact download into a temporary archive
pub mod download;
/// Error types
pub mod error;
/// Archive installation
pub mod extraction;
/// Pipeline orchestration
pub mod pipeline;
/// Build selection
pub mod selector;
/// Core types
pub mod types;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::{BuildFilter, PipelineConfig};
pub use error::{Error, Result};
pub use pipeline::run;
pub use types::{BuildId, BuildRecord, BuildStatus, InstallReport};

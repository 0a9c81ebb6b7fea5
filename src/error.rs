//! Error types for build-artifacts
//!
//! Every stage of the pipeline reports failures through [`Error`]. Each variant
//! carries enough context to render an actionable message (HTTP status and body
//! excerpt, the filters that matched nothing, the archive that failed to open)
//! and maps to a distinct process exit code for the binary.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for build-artifacts operations
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of response body characters rendered in error messages
const BODY_EXCERPT_LEN: usize = 512;

/// Main error type for build-artifacts
///
/// None of these are retried internally: every variant is fatal to the
/// invocation that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value failed validation (bad destination path, etc.)
    #[error("invalid {field}: {message}")]
    InvalidInput {
        /// The configuration field that was rejected (e.g. "destination_dir")
        field: &'static str,
        /// Human-readable description of the problem
        message: String,
    },

    /// The CI API answered with a status outside the accepted range
    #[error("error during API call\n[{status}] -> {}", excerpt(.body))]
    Api {
        /// HTTP status code returned by the provider
        status: u16,
        /// Raw response body, kept for diagnostics
        body: String,
    },

    /// The request never produced a usable response (DNS, connect, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API response body could not be decoded into the expected structure
    #[error("can't decode API response from {url}: {source}")]
    Decode {
        /// URL whose response failed to decode
        url: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// No build in the fetched page matched the filters
    #[error(
        "can't find a successful build in the project (stage: {stage}, ref: {}, tag: {}, scanned {scanned} job(s))",
        .ref_name.as_deref().unwrap_or("any"),
        .tag.as_deref().unwrap_or("any")
    )]
    BuildNotFound {
        /// Stage filter that was applied
        stage: String,
        /// Ref filter that was applied, if any
        ref_name: Option<String>,
        /// Tag filter that was applied, if any
        tag: Option<String>,
        /// Number of job records inspected
        scanned: usize,
    },

    /// Temporary file or filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The downloaded archive could not be opened or extracted
    #[error("can't extract ZIP file \"{archive}\" in \"{}\": {reason}", .destination.display())]
    Extract {
        /// File name of the archive
        archive: String,
        /// Directory the archive was being extracted into
        destination: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// The overall deadline elapsed before the pipeline finished
    #[error("deadline of {}s exceeded", .0.as_secs())]
    Timeout(Duration),

    /// The run was cancelled from outside (Ctrl+C, embedding program)
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Build an [`Error::InvalidInput`] for the given field
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidInput { .. } => "invalid_input",
            Error::Api { .. } => "api_error",
            Error::Network(_) => "network_error",
            Error::Decode { .. } => "decode_error",
            Error::BuildNotFound { .. } => "build_not_found",
            Error::Io(_) => "io_error",
            Error::Extract { .. } => "extract_error",
            Error::Timeout(_) => "timeout",
            Error::Cancelled => "cancelled",
        }
    }

    /// Process exit status used by the binary for this error
    ///
    /// Zero is reserved for success; transport and API failures share a code
    /// because both mean "the provider could not be reached properly".
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidInput { .. } => 2,
            Error::Api { .. } | Error::Network(_) => 3,
            Error::Decode { .. } => 4,
            Error::BuildNotFound { .. } => 5,
            Error::Io(_) => 6,
            Error::Extract { .. } => 7,
            Error::Timeout(_) | Error::Cancelled => 8,
        }
    }
}

/// Truncate a response body for display, respecting char boundaries
fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(BODY_EXCERPT_LEN).collect();
    format!("{cut}... ({} bytes total)", body.len())
}

//! Authenticated GitLab API client
//!
//! Wraps a `reqwest::Client` that sends the `PRIVATE-TOKEN` header with every
//! request and applies the success boundary: any status in `200..=300` is
//! accepted, everything else becomes [`Error::Api`] carrying the status and
//! the raw body.

use crate::error::{Error, Result};
use crate::types::BuildId;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Header GitLab reads personal/project access tokens from (`PRIVATE-TOKEN`)
const TOKEN_HEADER: &str = "private-token";

/// Returns true if `status` is treated as a successful response
///
/// The upper bound is inclusive: 300 counts as success.
pub fn is_success_status(status: u16) -> bool {
    (200..=300).contains(&status)
}

/// HTTP client bound to one GitLab instance and one token
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `base_url` authenticating with `token`
    ///
    /// Redirects are not followed so that 3xx responses reach the status check.
    pub fn new(base_url: &str, token: &str, connect_timeout: Duration) -> Result<Self> {
        let parsed = url::Url::parse(base_url).map_err(|e| {
            Error::invalid_input("api_base_url", format!("'{}' is not a valid URL: {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::invalid_input(
                "api_base_url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let mut token_value = HeaderValue::from_str(token).map_err(|_| {
            Error::invalid_input("token", "contains characters not allowed in an HTTP header")
        })?;
        token_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(TOKEN_HEADER), token_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("build-artifacts/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL listing the latest successful jobs of `project`
    pub fn jobs_url(&self, project: &str, per_page: u32) -> String {
        format!(
            "{}/api/v4/projects/{}/jobs?scope[]=success&per_page={}",
            self.base_url,
            urlencoding::encode(project),
            per_page
        )
    }

    /// URL serving the artifact archive of job `build_id`
    pub fn artifacts_url(&self, project: &str, build_id: &BuildId) -> String {
        format!(
            "{}/api/v4/projects/{}/jobs/{}/artifacts",
            self.base_url,
            urlencoding::encode(project),
            urlencoding::encode(&build_id.to_string())
        )
    }

    /// Send a GET and fail unless the status is inside the success boundary
    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        info!(%url, "requesting");

        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();

        if !is_success_status(status) {
            // Best effort: the status alone is still reported if the body is unreadable
            let body = response.text().await.unwrap_or_default();
            debug!(%url, status, body_len = body.len(), "API call rejected");
            return Err(Error::Api { status, body });
        }

        debug!(%url, status, "API call accepted");
        Ok(response)
    }

    /// Fetch `url` and return the whole body
    pub async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch `url` and decode the body as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let raw = self.get(url).await?;
        serde_json::from_slice(&raw).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch `url` and stream the body into `sink` chunk by chunk
    ///
    /// Returns the number of bytes written. The sink is flushed but not closed.
    pub async fn get_to_writer<W>(&self, url: &str, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut response = self.send(url).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;

        debug!(%url, bytes = written, "response body streamed");
        Ok(written)
    }
}

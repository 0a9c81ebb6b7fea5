//! Build selection
//!
//! Fetches one page of the project's jobs and picks the most recent one that
//! succeeded in the requested stage (and ref/tag, when given). The page is
//! walked in provider order, which GitLab returns newest first; it is never
//! re-sorted. Jobs beyond the first page are not considered.

use crate::client::ApiClient;
use crate::config::{BuildFilter, PipelineConfig};
use crate::error::{Error, Result};
use crate::types::{BuildRecord, BuildStatus};
use tracing::{debug, info};

impl BuildFilter {
    /// Returns true if `record` satisfies every criterion of this filter
    pub fn matches(&self, record: &BuildRecord) -> bool {
        record.status == BuildStatus::Success
            && record.stage == self.stage
            && self
                .ref_name
                .as_deref()
                .is_none_or(|wanted| record.ref_name.as_deref() == Some(wanted))
            && self
                .tag
                .as_deref()
                .is_none_or(|wanted| record.tag_name() == Some(wanted))
    }
}

/// First record in `records` accepted by `filter`
pub fn find_latest_successful<'a>(
    records: &'a [BuildRecord],
    filter: &BuildFilter,
) -> Option<&'a BuildRecord> {
    records.iter().find(|record| filter.matches(record))
}

/// Fetch the jobs page for `config.project` and select the build to install
pub async fn select_latest_successful_build(
    client: &ApiClient,
    config: &PipelineConfig,
) -> Result<BuildRecord> {
    let url = client.jobs_url(&config.project, config.effective_per_page());
    let records: Vec<BuildRecord> = client.get_json(&url).await?;

    debug!(
        project = %config.project,
        scanned = records.len(),
        stage = %config.filter.stage,
        ref_name = ?config.filter.ref_name,
        tag = ?config.filter.tag,
        "filtering jobs"
    );

    let build = find_latest_successful(&records, &config.filter)
        .cloned()
        .ok_or_else(|| Error::BuildNotFound {
            stage: config.filter.stage.clone(),
            ref_name: config.filter.ref_name.clone(),
            tag: config.filter.tag.clone(),
            scanned: records.len(),
        })?;

    info!(
        build_id = %build.id,
        ref_name = build.ref_name.as_deref().unwrap_or("-"),
        stage = %build.stage,
        created_at = %build.created_at,
        runner_id = build.runner.as_ref().map(|r| r.id),
        runner = build.runner.as_ref().and_then(|r| r.description.as_deref()),
        triggered_by = build.user.as_ref().map(|u| u.username.as_str()),
        "selected latest successful build"
    );

    Ok(build)
}

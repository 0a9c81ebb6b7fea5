//! Job listings, archives and workspace fixtures

use build_artifacts::PipelineConfig;
use serde_json::{Value, json};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token used by every fixture config
pub const TEST_TOKEN: &str = "glpat-integration";

/// Numeric project id used by every fixture config
pub const TEST_PROJECT: &str = "17";

/// A GitLab v4 job record as returned by `/projects/:id/jobs`
pub fn job_json(id: u64, status: &str, stage: &str, ref_name: &str) -> Value {
    json!({
        "id": id,
        "status": status,
        "stage": stage,
        "name": format!("{stage}:job"),
        "ref": ref_name,
        "tag": false,
        "created_at": "2024-03-01T10:15:30.000Z",
        "runner": {"id": 3, "description": "docker-runner", "active": true},
        "user": {"id": 1, "username": "deployer"},
        "artifacts_file": {"filename": "artifacts.zip", "size": 1024}
    })
}

/// The two-job page used by the documented selection scenarios
pub fn scenario_page() -> Value {
    json!([
        job_json(5, "success", "prepare", "main"),
        job_json(4, "failed", "prepare", "main"),
    ])
}

/// Build an in-memory ZIP archive; names ending in '/' become directories
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Project checkout with a `public/` destination directory
pub struct Workspace {
    /// Keeps the directory alive for the duration of the test
    pub dir: TempDir,
}

impl Workspace {
    /// Create an empty project root containing `public/`
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("public")).unwrap();
        Self { dir }
    }

    /// Project root
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Destination directory
    pub fn public(&self) -> PathBuf {
        self.root().join("public")
    }

    /// Default storage directory for the temporary archive
    pub fn storage(&self) -> PathBuf {
        self.root().join("storage")
    }

    /// Config pointing at `server` and installing into `public/`
    pub fn config(&self, server: &MockServer) -> PipelineConfig {
        let mut config = PipelineConfig::new(TEST_TOKEN, TEST_PROJECT, self.root());
        config.api_base_url = server.uri();
        config.destination_dir = PathBuf::from("public");
        config.connect_timeout = Duration::from_secs(5);
        config
    }
}

/// Serve `page` on the jobs endpoint of the test project
pub async fn mount_jobs(server: &MockServer, page: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v4/projects/{TEST_PROJECT}/jobs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page))
        .mount(server)
        .await;
}

/// Serve `response` on the artifacts endpoint of job `id`
pub async fn mount_artifact(server: &MockServer, id: u64, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/v4/projects/{TEST_PROJECT}/jobs/{id}/artifacts"
        )))
        .respond_with(response)
        .mount(server)
        .await;
}

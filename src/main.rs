//! `build-artifacts` command line entry point
//!
//! Resolves flags and environment variables into a [`PipelineConfig`], runs
//! the pipeline, and maps the outcome to the process exit status.

use build_artifacts::{Error, PipelineConfig, run};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Retrieve a GitLab artifact and install it in the project
#[derive(Debug, Parser)]
#[command(name = "build-artifacts", version, about)]
struct Cli {
    /// GitLab authentication token
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    token: String,

    /// Project identifier on which the artifact was built
    #[arg(long, env = "GITLAB_PROJECT")]
    project: String,

    /// GitLab root URL
    #[arg(long, env = "GITLAB_API", default_value = "https://gitlab.com")]
    api_url: String,

    /// Path where the artifact must be extracted
    #[arg(long = "in", value_name = "DIR", default_value = ".")]
    destination: PathBuf,

    /// Repository ref the build was run on
    #[arg(long = "ref", value_name = "REF")]
    ref_name: Option<String>,

    /// Repository tag the build was run on
    #[arg(long)]
    tag: Option<String>,

    /// Build stage from which the artifact is downloaded
    #[arg(long, default_value = "prepare")]
    stage: String,

    /// Number of jobs to retrieve from the API
    #[arg(long, default_value_t = 50)]
    per_page: u32,

    /// Project root the destination must live in (default: current directory)
    #[arg(long, value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// Directory for the temporary archive (default: <project root>/storage)
    #[arg(long, value_name = "DIR")]
    storage_dir: Option<PathBuf>,

    /// Abort if selection and download take longer than this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<PipelineConfig, Error> {
        let project_root = match self.project_root {
            Some(root) => root,
            None => std::env::current_dir()?,
        };

        let mut config = PipelineConfig::new(self.token, self.project, project_root);
        config.api_base_url = self.api_url;
        config.destination_dir = self.destination;
        config.filter.stage = self.stage;
        config.filter.ref_name = self.ref_name;
        config.filter.tag = self.tag;
        config.per_page = self.per_page;
        config.storage_dir = self.storage_dir;
        config.deadline = self.timeout.map(Duration::from_secs);
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("build_artifacts={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };

    let cancel = config.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C signal, cancelling");
            cancel.cancel();
        }
    });

    match run(&config).await {
        Ok(report) => {
            println!("{}", report.build.summary());
            println!(
                "Artifact extracted in : {} ({} file(s))",
                report.destination.display(),
                report.files.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn fail(error: &Error) -> ExitCode {
    tracing::error!(code = error.error_code(), "{}", error);
    eprintln!("error: {}", error);
    // exit codes are small positive integers
    ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(1))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from([
            "build-artifacts",
            "--token",
            "t",
            "--project",
            "group/app",
            "--api-url",
            "https://gitlab.example.com",
            "--project-root",
            "/srv/app",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.api_base_url, "https://gitlab.example.com");
        assert_eq!(config.destination_dir, PathBuf::from("."));
        assert_eq!(config.filter.stage, "prepare");
        assert_eq!(config.per_page, 50);
        assert_eq!(config.project_root, PathBuf::from("/srv/app"));
        assert!(config.deadline.is_none());
    }

    #[test]
    fn test_cli_filters_and_timeout() {
        let cli = Cli::try_parse_from([
            "build-artifacts",
            "--token",
            "t",
            "--project",
            "42",
            "--api-url",
            "https://gitlab.example.com",
            "--in",
            "public",
            "--ref",
            "main",
            "--tag",
            "v1.0.0",
            "--stage",
            "build",
            "--per-page",
            "20",
            "--timeout",
            "90",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.destination_dir, PathBuf::from("public"));
        assert_eq!(config.filter.ref_name.as_deref(), Some("main"));
        assert_eq!(config.filter.tag.as_deref(), Some("v1.0.0"));
        assert_eq!(config.filter.stage, "build");
        assert_eq!(config.per_page, 20);
        assert_eq!(config.deadline, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

//! Runner configuration
//!
//! Everything the runner needs is supplied on the command line (or the
//! matching environment variables): the change under test, the job to run,
//! where the mounted job configuration, labels and secrets live, and the
//! operating mode toggles.

mod jobs;
mod labels;

pub use jobs::JobConfig;
pub use labels::read_job_name;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use line_core::domain::run::RunDescriptor;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per record
    Json,
}

/// Runner configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "line")]
#[command(about = "Runs one presubmit job for one pull request and reports the result", long_about = None)]
pub struct Config {
    /// Which job to run
    #[arg(long = "job-name", env = "JOB_NAME")]
    pub job_name: String,

    /// Owner of the repo
    #[arg(long = "repo-owner", env = "REPO_OWNER")]
    pub repo_owner: String,

    /// Name of the repo to test
    #[arg(long = "repo-name", env = "REPO_NAME")]
    pub repo_name: String,

    /// Pull request to test; 0 for a batch run
    #[arg(long, env = "PULL_NUMBER", default_value_t = 0)]
    pub pr: u64,

    /// Target branch
    #[arg(long = "base-ref", env = "PULL_BASE_REF", default_value = "")]
    pub base_ref: String,

    /// Base SHA of the PR
    #[arg(long = "base-sha", env = "PULL_BASE_SHA", default_value = "")]
    pub base_sha: String,

    /// Head SHA of the PR
    #[arg(long = "pull-sha", env = "PULL_PULL_SHA", default_value = "")]
    pub pull_sha: String,

    /// Refs to merge together, as expected by the test bootstrap
    #[arg(long, env = "PULL_REFS", default_value = "")]
    pub refs: String,

    /// Namespace that we live in
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Whether to suppress mutating GitHub and Jenkins calls
    #[arg(long = "dry-run", env = "DRY_RUN", default_value_t = true, action = clap::ArgAction::Set)]
    pub dry_run: bool,

    /// Whether to report status and failure comments on GitHub
    #[arg(long, env = "REPORT", default_value_t = true, action = clap::ArgAction::Set)]
    pub report: bool,

    /// Where the job configuration is mounted
    #[arg(long = "job-config", default_value = "/etc/jobs/jobs")]
    pub job_config: PathBuf,

    /// Where our pod's metadata.labels are mounted
    #[arg(long = "labels-path", default_value = "/etc/labels/labels")]
    pub labels_path: PathBuf,

    /// Path to the file containing the GitHub OAuth token
    #[arg(long = "github-token-file", default_value = "/etc/github/oauth")]
    pub github_token_file: PathBuf,

    /// GitHub API endpoint
    #[arg(long = "github-endpoint", default_value = "https://api.github.com")]
    pub github_endpoint: String,

    /// Jenkins URL
    #[arg(long = "jenkins-url", default_value = "http://pull-jenkins-master:8080")]
    pub jenkins_url: String,

    /// Jenkins username
    #[arg(long = "jenkins-user", default_value = "jenkins-trigger")]
    pub jenkins_user: String,

    /// Path to the file containing the Jenkins API token
    #[arg(long = "jenkins-token-file", default_value = "/etc/jenkins/jenkins")]
    pub jenkins_token_file: PathBuf,

    /// GitHub login the runner comments as
    #[arg(long = "bot-login", default_value = "k8s-ci-robot")]
    pub bot_login: String,

    /// Give up on the run after this many seconds (unbounded when unset)
    #[arg(long = "timeout", env = "RUN_TIMEOUT")]
    pub timeout_secs: Option<u64>,

    /// Log output format
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.job_name.trim().is_empty() {
            anyhow::bail!("job-name cannot be empty");
        }

        if self.repo_owner.trim().is_empty() || self.repo_name.trim().is_empty() {
            anyhow::bail!("repo-owner and repo-name cannot be empty");
        }

        for (flag, url) in [
            ("github-endpoint", &self.github_endpoint),
            ("jenkins-url", &self.jenkins_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", flag);
            }
        }

        if self.timeout_secs == Some(0) {
            anyhow::bail!("timeout must be greater than 0");
        }

        Ok(())
    }

    /// The change under test
    pub fn run_descriptor(&self) -> RunDescriptor {
        RunDescriptor {
            owner: self.repo_owner.clone(),
            repo: self.repo_name.clone(),
            pr_number: self.pr,
            base_ref: self.base_ref.clone(),
            base_sha: self.base_sha.clone(),
            pull_sha: self.pull_sha.clone(),
            refs: self.refs.clone(),
        }
    }

    /// Overall run deadline, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Reads a secret from a file, trimming surrounding whitespace
///
/// An empty secret is only accepted when `allow_empty` is set (dry-run),
/// since live clients would fail later with far less helpful errors.
pub fn read_token(path: &Path, allow_empty: bool) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read token file {}", path.display()))?;
    let token = raw.trim().to_string();

    if token.is_empty() && !allow_empty {
        anyhow::bail!("Token file {} is empty", path.display());
    }

    Ok(token)
}

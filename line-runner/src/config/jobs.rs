//! Job configuration
//!
//! The job configuration is a YAML document mapping "owner/repo" to the
//! list of presubmit jobs for that repository. Fields the runner does not
//! use (triggers, branches, run_after_success, ...) are ignored.

use anyhow::{Context, Result};
use line_core::domain::job::JobSpec;
use std::collections::HashMap;
use std::path::Path;

/// Presubmit jobs keyed by repository
#[derive(Debug, Clone, Default)]
pub struct JobConfig {
    jobs: HashMap<String, Vec<JobSpec>>,
}

impl JobConfig {
    /// Loads the job configuration once from a file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Failed to parse job config {}", path.display()))
    }

    /// Parses a job configuration document
    pub fn parse(raw: &str) -> Result<Self> {
        let jobs: HashMap<String, Vec<JobSpec>> = serde_yaml::from_str(raw)?;
        Ok(Self { jobs })
    }

    /// Finds a job by repository slug and name
    pub fn get_job(&self, repo: &str, name: &str) -> Option<&JobSpec> {
        self.jobs.get(repo)?.iter().find(|job| job.name == name)
    }

    /// Number of jobs across all repositories
    pub fn len(&self) -> usize {
        self.jobs.values().map(Vec::len).sum()
    }
}

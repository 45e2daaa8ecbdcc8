//! Pod labels file
//!
//! The runner's own pod labels are mounted through the Downward API, one
//! `key="value"` pair per line. The `job-name` label names the batch Job
//! whose annotations mirror the run status.

use anyhow::{Context, Result};
use std::path::Path;

const JOB_NAME_LABEL: &str = "job-name";

/// Reads the hosting Job's name from a labels file
pub fn read_job_name(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read labels file {}", path.display()))?;

    parse_job_name(&raw)
        .ok_or_else(|| anyhow::anyhow!("Could not find {} in {}", JOB_NAME_LABEL, path.display()))
}

fn parse_job_name(raw: &str) -> Option<String> {
    raw.lines().find_map(|line| {
        let value = line.strip_prefix(JOB_NAME_LABEL)?.strip_prefix("=\"")?;
        let value = value.strip_suffix('"')?;
        (!value.is_empty() && !value.contains('"')).then(|| value.to_string())
    })
}

//! Jenkins build types

use serde::{Deserialize, Serialize};

/// Parameters for triggering a presubmit build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub job_name: String,
    pub pr_number: u64,
    pub refs: String,
    pub base_ref: String,
    pub base_sha: String,
    pub pull_sha: String,
}

/// Handle for a triggered build
///
/// Jenkins does not hand back a build number when a build is queued, so the
/// build is tagged with a unique `build_id` parameter and found again by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedBuild {
    pub job_name: String,
    pub build_id: String,
}

/// Snapshot of a build's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    pub building: bool,
    pub success: bool,
    /// Build number assigned by Jenkins
    pub number: u64,
}

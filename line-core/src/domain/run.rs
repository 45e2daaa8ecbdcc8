//! Run descriptor

use serde::{Deserialize, Serialize};

/// Immutable description of the change under test
///
/// Built once from the command line and never mutated during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDescriptor {
    /// Organization owning the repository
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Pull request number; 0 marks a batch run over several merged refs
    pub pr_number: u64,

    /// Target branch
    pub base_ref: String,

    /// Commit SHA of the target branch
    pub base_sha: String,

    /// Head commit SHA of the pull request
    pub pull_sha: String,

    /// Refs to merge together, passed through to the backend untouched
    pub refs: String,
}

impl RunDescriptor {
    /// Returns the "owner/repo" slug used to key job configuration
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

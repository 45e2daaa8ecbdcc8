//! Job definition types

use serde::{Deserialize, Serialize};

use crate::domain::pod::PodSpec;

/// A presubmit job as declared in the job configuration
///
/// Owned by configuration; the runner only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Job name, also the Jenkins job to trigger for legacy jobs
    pub name: String,

    /// Commit status context; also prefixes every failure comment
    pub context: String,

    /// The exact comment a human types to retrigger this job
    #[serde(default)]
    pub rerun_command: String,

    /// Pod template; present for jobs that run on Kubernetes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<PodSpec>,
}

impl JobSpec {
    /// Returns true when this job runs as a pod rather than on Jenkins
    pub fn runs_on_kubernetes(&self) -> bool {
        self.spec.is_some()
    }
}

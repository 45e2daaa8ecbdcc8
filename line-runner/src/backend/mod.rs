//! Execution backends
//!
//! A backend starts one unit of work and reports its progress one poll at a
//! time. The lifecycle drives both variants through the same
//! start / poll / classify loop:
//! - [`KubernetesBackend`] runs the job's pod template as a pod
//! - [`JenkinsBackend`] triggers a parameterized Jenkins build
//!
//! Which one a job uses is fixed by its definition, see [`BackendKind::for_job`].

mod jenkins;
mod kubernetes;

pub use jenkins::JenkinsBackend;
pub use kubernetes::KubernetesBackend;

use async_trait::async_trait;
use line_core::domain::job::JobSpec;
use line_core::domain::run::RunDescriptor;
use std::sync::Arc;
use std::time::Duration;

use crate::error::RunError;
use crate::repository::{BuildRepository, PodRepository};
use crate::scheduler::Pacer;
use crate::service::{BuildIdGenerator, StatusReporter};

/// Which system executes a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Kubernetes,
    Jenkins,
}

impl BackendKind {
    /// Jobs with a pod template run on Kubernetes, all others on Jenkins
    pub fn for_job(job: &JobSpec) -> Self {
        if job.runs_on_kubernetes() {
            BackendKind::Kubernetes
        } else {
            BackendKind::Jenkins
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Kubernetes => write!(f, "Kubernetes"),
            BackendKind::Jenkins => write!(f, "Jenkins"),
        }
    }
}

/// Progress of a started unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Still queued, scheduling or executing
    Running,
    Succeeded,
    Failed,
    /// The backend lost track of the unit
    Unknown,
}

/// How a unit of work ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Succeeded,
    Failed,
    Unknown,
}

impl Phase {
    /// The terminal verdict, or `None` while polling should continue
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Phase::Running => None,
            Phase::Succeeded => Some(Verdict::Succeeded),
            Phase::Failed => Some(Verdict::Failed),
            Phase::Unknown => Some(Verdict::Unknown),
        }
    }
}

/// Result of starting a unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The unit was submitted; `build` names it in result URLs
    Started { build: String },
    /// The backend refused the run; `reason` becomes the status description
    Declined { reason: String },
}

/// Sleep between polls, per backend stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub pod: Duration,
    pub queue: Duration,
    pub build: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            pod: Duration::from_secs(20),
            queue: Duration::from_secs(10),
            build: Duration::from_secs(30),
        }
    }
}

impl PollIntervals {
    #[cfg(test)]
    pub fn zero() -> Self {
        Self {
            pod: Duration::ZERO,
            queue: Duration::ZERO,
            build: Duration::ZERO,
        }
    }
}

/// One execution backend
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Submits the unit of work
    ///
    /// Intermediate statuses (e.g. while waiting in a queue) are reported
    /// through `reporter`; waits go through `pacer`.
    async fn start(&mut self, reporter: &StatusReporter, pacer: &Pacer)
        -> Result<Admission, RunError>;

    /// Fetches the unit's progress once
    async fn poll_once(&mut self) -> Result<Phase, RunError>;

    /// How long to wait between polls while the unit is running
    fn poll_interval(&self) -> Duration;
}

/// Collaborators needed to construct either backend
#[derive(Clone)]
pub struct Backends {
    pub pods: Arc<dyn PodRepository>,
    pub builds: Arc<dyn BuildRepository>,
    pub ids: Arc<dyn BuildIdGenerator>,
    pub intervals: PollIntervals,
}

/// Builds the backend a job is defined for
pub fn select_backend(
    job: &JobSpec,
    run: Arc<RunDescriptor>,
    backends: &Backends,
) -> Box<dyn Backend> {
    match (&job.spec, BackendKind::for_job(job)) {
        (Some(template), BackendKind::Kubernetes) => Box::new(KubernetesBackend::new(
            Arc::clone(&backends.pods),
            Arc::clone(&backends.ids),
            run,
            template.clone(),
            backends.intervals.pod,
        )),
        _ => Box::new(JenkinsBackend::new(
            Arc::clone(&backends.builds),
            run,
            job.name.clone(),
            backends.intervals,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::SequentialBuildIds;
    use crate::testing::{Recorder, fixture_job, fixture_run};
    use line_core::domain::pod::PodSpec;

    fn backends() -> Backends {
        let recorder = Recorder::default();
        Backends {
            pods: Arc::new(recorder.clone()),
            builds: Arc::new(recorder),
            ids: Arc::new(SequentialBuildIds::starting_at(1)),
            intervals: PollIntervals::default(),
        }
    }

    #[test]
    fn test_pod_template_selects_kubernetes() {
        let job = fixture_job(Some(PodSpec::default()));
        assert_eq!(BackendKind::for_job(&job), BackendKind::Kubernetes);

        let backend = select_backend(&job, Arc::new(fixture_run(1)), &backends());
        assert_eq!(backend.kind(), BackendKind::Kubernetes);
        assert_eq!(backend.poll_interval(), Duration::from_secs(20));
    }

    #[test]
    fn test_no_template_selects_jenkins() {
        let job = fixture_job(None);
        assert_eq!(BackendKind::for_job(&job), BackendKind::Jenkins);

        let backend = select_backend(&job, Arc::new(fixture_run(1)), &backends());
        assert_eq!(backend.kind(), BackendKind::Jenkins);
        assert_eq!(backend.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_phase_verdicts() {
        assert_eq!(Phase::Running.verdict(), None);
        assert_eq!(Phase::Succeeded.verdict(), Some(Verdict::Succeeded));
        assert_eq!(Phase::Failed.verdict(), Some(Verdict::Failed));
        assert_eq!(Phase::Unknown.verdict(), Some(Verdict::Unknown));
    }
}

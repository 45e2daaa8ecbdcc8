//! In-memory fakes of every repository, recording calls in order

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use line_core::domain::comment::{IssueComment, User};
use line_core::domain::jenkins::{BuildRequest, BuildResult, QueuedBuild};
use line_core::domain::job::JobSpec;
use line_core::domain::pod::{Pod, PodPhase, PodSpec};
use line_core::domain::run::RunDescriptor;
use line_core::domain::status::{CommitStatus, StatusEvent};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::repository::{
    BuildRepository, CommentRepository, CommitStatusRepository, JobStatusRepository,
    PodRepository,
};
use crate::service::Sinks;

pub const BOT_LOGIN: &str = "k8s-ci-robot";

#[derive(Debug, Clone)]
pub enum Call {
    CommitStatus { sha: String, status: CommitStatus },
    JobStatus { job: String, event: StatusEvent },
    ListComments,
    CreateComment { body: String },
    DeleteComment { id: u64 },
    CreatePod { pod: Pod },
    GetPod { name: String },
    QueueSize,
    Build { request: BuildRequest },
    IsEnqueued,
    BuildStatus,
}

impl Call {
    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            Call::ListComments | Call::CreateComment { .. } | Call::DeleteComment { .. }
        )
    }
}

struct State {
    calls: Vec<Call>,
    comments: Vec<IssueComment>,
    next_comment_id: u64,
    fail_commit_statuses: bool,
    fail_job_statuses: bool,
    fail_comment_listing: bool,
    fail_comment_deletion: bool,
    fail_comment_creation: bool,
    create_pod_error: bool,
    pod_phases: VecDeque<Option<PodPhase>>,
    queue_size: Option<usize>,
    build_error: bool,
    enqueued: VecDeque<Option<bool>>,
    build_results: VecDeque<Option<BuildResult>>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            comments: Vec::new(),
            next_comment_id: 1,
            fail_commit_statuses: false,
            fail_job_statuses: false,
            fail_comment_listing: false,
            fail_comment_deletion: false,
            fail_comment_creation: false,
            create_pod_error: false,
            pod_phases: VecDeque::new(),
            queue_size: Some(0),
            build_error: false,
            enqueued: VecDeque::new(),
            build_results: VecDeque::new(),
        }
    }
}

/// Scriptable fake for all collaborators
///
/// Scripted responses are consumed in order; `None` entries produce errors.
/// Once a script runs dry, pods keep running, builds stay building and the
/// queue reports the build as dequeued.
#[derive(Clone, Default)]
pub struct Recorder {
    state: Arc<Mutex<State>>,
}

impl Recorder {
    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    fn record(&self, call: Call) {
        self.with(|s| s.calls.push(call));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn job_statuses(&self) -> Vec<StatusEvent> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::JobStatus { event, .. } => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn commit_statuses(&self) -> Vec<CommitStatus> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CommitStatus { status, .. } => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn live_comments(&self) -> Vec<IssueComment> {
        self.with(|s| s.comments.clone())
    }

    pub fn seed_comment(&self, login: &str, body: &str) {
        self.with(|s| {
            let id = s.next_comment_id;
            s.next_comment_id += 1;
            s.comments.push(IssueComment {
                id,
                user: User {
                    login: login.to_string(),
                },
                body: body.to_string(),
            });
        });
    }

    pub fn fail_commit_statuses(&self) {
        self.with(|s| s.fail_commit_statuses = true);
    }

    pub fn fail_job_statuses(&self) {
        self.with(|s| s.fail_job_statuses = true);
    }

    pub fn fail_comment_listing(&self) {
        self.with(|s| s.fail_comment_listing = true);
    }

    pub fn fail_comment_deletion(&self) {
        self.with(|s| s.fail_comment_deletion = true);
    }

    pub fn fail_comment_creation(&self) {
        self.with(|s| s.fail_comment_creation = true);
    }

    pub fn fail_pod_creation(&self) {
        self.with(|s| s.create_pod_error = true);
    }

    pub fn script_pod_phases(&self, phases: impl IntoIterator<Item = Option<PodPhase>>) {
        self.with(|s| s.pod_phases.extend(phases));
    }

    pub fn set_queue_size(&self, size: Option<usize>) {
        self.with(|s| s.queue_size = size);
    }

    pub fn fail_builds(&self) {
        self.with(|s| s.build_error = true);
    }

    pub fn script_enqueued(&self, answers: impl IntoIterator<Item = Option<bool>>) {
        self.with(|s| s.enqueued.extend(answers));
    }

    pub fn script_build_results(&self, results: impl IntoIterator<Item = Option<BuildResult>>) {
        self.with(|s| s.build_results.extend(results));
    }
}

pub fn sinks(recorder: &Recorder) -> Sinks {
    Sinks {
        statuses: Arc::new(recorder.clone()),
        job_statuses: Arc::new(recorder.clone()),
        comments: Arc::new(recorder.clone()),
    }
}

pub fn fixture_run(pr_number: u64) -> RunDescriptor {
    RunDescriptor {
        owner: "kubernetes".to_string(),
        repo: "test-infra".to_string(),
        pr_number,
        base_ref: "master".to_string(),
        base_sha: "basesha".to_string(),
        pull_sha: "pullsha".to_string(),
        refs: format!("master:basesha,{}:pullsha", pr_number),
    }
}

pub fn fixture_job(spec: Option<PodSpec>) -> JobSpec {
    JobSpec {
        name: "pull-test-infra-bazel".to_string(),
        context: "Bazel test".to_string(),
        rerun_command: "@k8s-bot bazel test this".to_string(),
        spec,
    }
}

#[async_trait]
impl CommitStatusRepository for Recorder {
    async fn create_status(
        &self,
        _owner: &str,
        _repo: &str,
        sha: &str,
        status: &CommitStatus,
    ) -> Result<()> {
        self.record(Call::CommitStatus {
            sha: sha.to_string(),
            status: status.clone(),
        });
        if self.with(|s| s.fail_commit_statuses) {
            return Err(anyhow!("github is down"));
        }
        Ok(())
    }
}

#[async_trait]
impl JobStatusRepository for Recorder {
    async fn set_job_status(&self, job_name: &str, event: &StatusEvent) -> Result<()> {
        self.record(Call::JobStatus {
            job: job_name.to_string(),
            event: event.clone(),
        });
        if self.with(|s| s.fail_job_statuses) {
            return Err(anyhow!("jobs.batch is forbidden"));
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for Recorder {
    async fn list_comments(
        &self,
        _owner: &str,
        _repo: &str,
        _number: u64,
    ) -> Result<Vec<IssueComment>> {
        self.record(Call::ListComments);
        if self.with(|s| s.fail_comment_listing) {
            return Err(anyhow!("rate limited"));
        }
        Ok(self.live_comments())
    }

    async fn create_comment(&self, _owner: &str, _repo: &str, _number: u64, body: &str) -> Result<()> {
        self.record(Call::CreateComment {
            body: body.to_string(),
        });
        if self.with(|s| s.fail_comment_creation) {
            return Err(anyhow!("secondary rate limit"));
        }
        self.seed_comment(BOT_LOGIN, body);
        Ok(())
    }

    async fn delete_comment(&self, _owner: &str, _repo: &str, id: u64) -> Result<()> {
        self.record(Call::DeleteComment { id });
        if self.with(|s| s.fail_comment_deletion) {
            return Err(anyhow!("comment {} is locked", id));
        }
        self.with(|s| s.comments.retain(|c| c.id != id));
        Ok(())
    }
}

#[async_trait]
impl PodRepository for Recorder {
    async fn create_pod(&self, pod: &Pod) -> Result<Pod> {
        self.record(Call::CreatePod { pod: pod.clone() });
        if self.with(|s| s.create_pod_error) {
            return Err(anyhow!("pods is forbidden"));
        }
        Ok(pod.clone())
    }

    async fn get_pod(&self, name: &str) -> Result<Pod> {
        self.record(Call::GetPod {
            name: name.to_string(),
        });
        let phase = self
            .with(|s| s.pod_phases.pop_front())
            .unwrap_or(Some(PodPhase::Running))
            .ok_or_else(|| anyhow!("connection refused"))?;

        let mut pod = Pod::default();
        pod.metadata.name = name.to_string();
        pod.status.phase = phase;
        Ok(pod)
    }
}

#[async_trait]
impl BuildRepository for Recorder {
    async fn queue_size(&self) -> Result<usize> {
        self.record(Call::QueueSize);
        self.with(|s| s.queue_size)
            .ok_or_else(|| anyhow!("jenkins unreachable"))
    }

    async fn build(&self, request: &BuildRequest) -> Result<QueuedBuild> {
        self.record(Call::Build {
            request: request.clone(),
        });
        if self.with(|s| s.build_error) {
            return Err(anyhow!("403 crumb required"));
        }
        Ok(QueuedBuild {
            job_name: request.job_name.clone(),
            build_id: "tag".to_string(),
        })
    }

    async fn is_enqueued(&self, _build: &QueuedBuild) -> Result<bool> {
        self.record(Call::IsEnqueued);
        self.with(|s| s.enqueued.pop_front())
            .unwrap_or(Some(false))
            .ok_or_else(|| anyhow!("queue api failed"))
    }

    async fn status(&self, _build: &QueuedBuild) -> Result<BuildResult> {
        self.record(Call::BuildStatus);
        self.with(|s| s.build_results.pop_front())
            .unwrap_or(Some(BuildResult {
                building: true,
                success: false,
                number: 0,
            }))
            .ok_or_else(|| anyhow!("build api failed"))
    }
}

//! Repository layer
//!
//! Repositories are the narrow contracts the run lifecycle needs from its
//! collaborators: the two execution backends, the commit status and job
//! status sinks, and the discussion thread. They carry no business logic.
//!
//! All repositories are trait-based so the lifecycle can be driven against
//! in-memory fakes; the HTTP implementations delegate to `line-client`.

mod github;
mod jenkins;
mod kube;

use anyhow::Result;
use async_trait::async_trait;
use line_core::domain::comment::IssueComment;
use line_core::domain::jenkins::{BuildRequest, BuildResult, QueuedBuild};
use line_core::domain::pod::Pod;
use line_core::domain::status::{CommitStatus, StatusEvent};

/// Container orchestration backend
#[async_trait]
pub trait PodRepository: Send + Sync {
    /// Submits a pod, returning the stored object
    async fn create_pod(&self, pod: &Pod) -> Result<Pod>;

    /// Fetches the current state of a pod
    async fn get_pod(&self, name: &str) -> Result<Pod>;
}

/// Legacy CI backend
#[async_trait]
pub trait BuildRepository: Send + Sync {
    /// Number of builds waiting in the backend queue
    async fn queue_size(&self) -> Result<usize>;

    /// Triggers a build, returning a ticket to follow it with
    async fn build(&self, request: &BuildRequest) -> Result<QueuedBuild>;

    /// Whether the build is still queued
    async fn is_enqueued(&self, build: &QueuedBuild) -> Result<bool>;

    /// Progress of a build that has left the queue
    async fn status(&self, build: &QueuedBuild) -> Result<BuildResult>;
}

/// Commit status sink
#[async_trait]
pub trait CommitStatusRepository: Send + Sync {
    /// Sets a status on a commit
    async fn create_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &CommitStatus,
    ) -> Result<()>;
}

/// Scheduler job status sink
#[async_trait]
pub trait JobStatusRepository: Send + Sync {
    /// Mirrors a status event onto the scheduler job hosting this run
    async fn set_job_status(&self, job_name: &str, event: &StatusEvent) -> Result<()>;
}

/// Discussion thread of a pull request
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Lists every comment on the thread
    async fn list_comments(&self, owner: &str, repo: &str, number: u64)
        -> Result<Vec<IssueComment>>;

    /// Posts a new comment
    async fn create_comment(&self, owner: &str, repo: &str, number: u64, body: &str)
        -> Result<()>;

    /// Deletes a comment by ID
    async fn delete_comment(&self, owner: &str, repo: &str, id: u64) -> Result<()>;
}

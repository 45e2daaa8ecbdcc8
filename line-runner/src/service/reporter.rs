//! Status reporter
//!
//! Keeps the three observers of a run consistent with its outcome:
//! - the commit status on the PR head (only when reporting is enabled)
//! - the annotations of the scheduler Job hosting the runner (always)
//! - the failure comment on the PR thread (reporting enabled, failures only)
//!
//! Every sink write is best effort. Failures are logged and never change the
//! run's outcome, which is decided by the backend alone.

use line_core::domain::job::JobSpec;
use line_core::domain::run::RunDescriptor;
use line_core::domain::status::{CommitStatus, StatusEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use crate::repository::{CommentRepository, CommitStatusRepository, JobStatusRepository};
use crate::service::urls::{FLAKE_ISSUES_URL, ResultUrls};

/// The sinks a reporter writes to
#[derive(Clone)]
pub struct Sinks {
    pub statuses: Arc<dyn CommitStatusRepository>,
    pub job_statuses: Arc<dyn JobStatusRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

/// Reporting toggles
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Write commit statuses and failure comments to GitHub
    pub report: bool,

    /// Login the runner comments as; only its comments are ever deleted
    pub bot_login: String,

    /// Scheduler Job whose annotations mirror the run status
    pub job_status_name: String,
}

/// Reports status transitions of a single run
pub struct StatusReporter {
    run: Arc<RunDescriptor>,
    job: Arc<JobSpec>,
    sinks: Sinks,
    options: ReportOptions,
    urls: ResultUrls,
    finished: AtomicBool,
}

impl StatusReporter {
    pub fn new(
        run: Arc<RunDescriptor>,
        job: Arc<JobSpec>,
        sinks: Sinks,
        options: ReportOptions,
        urls: ResultUrls,
    ) -> Self {
        Self {
            run,
            job,
            sinks,
            options,
            urls,
            finished: AtomicBool::new(false),
        }
    }

    /// Whether a terminal status has been reported
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Pushes a status transition to both status sinks
    ///
    /// Once a terminal state has been reported the run is settled and later
    /// events are dropped.
    pub async fn report(&self, event: StatusEvent) {
        if self.is_finished() {
            warn!(
                "Dropping {} status {:?}: run already reported a terminal status",
                event.state, event.description
            );
            return;
        }
        if event.state.is_terminal() {
            self.finished.store(true, Ordering::SeqCst);
        }

        info!(
            state = %event.state,
            description = %event.description,
            url = %event.target_url,
            "Setting GitHub and Kubernetes status"
        );

        if self.options.report {
            let status = CommitStatus::from_event(&event, &self.job.context);
            if let Err(e) = self
                .sinks
                .statuses
                .create_status(&self.run.owner, &self.run.repo, &self.run.pull_sha, &status)
                .await
            {
                error!("Error setting GitHub status: {:#}", e);
            }
        }

        if let Err(e) = self
            .sinks
            .job_statuses
            .set_job_status(&self.options.job_status_name, &event)
            .await
        {
            error!("Error setting Kube Job status: {:#}", e);
        }
    }

    /// Replaces this job's failure comment on the PR thread
    ///
    /// Deletes every earlier comment by the bot that starts with the job's
    /// context, then posts a fresh one, so at most one failure comment per
    /// job stays on the thread.
    pub async fn reconcile_failure_comment(&self, result_url: &str) {
        if !self.options.report {
            return;
        }

        let (owner, repo, number) = (&self.run.owner, &self.run.repo, self.run.pr_number);

        match self.sinks.comments.list_comments(owner, repo, number).await {
            Ok(comments) => {
                for comment in comments
                    .iter()
                    .filter(|c| c.is_authored_with_prefix(&self.options.bot_login, &self.job.context))
                {
                    if let Err(e) = self.sinks.comments.delete_comment(owner, repo, comment.id).await {
                        warn!("Error deleting comment {}: {:#}", comment.id, e);
                    }
                }
            }
            Err(e) => warn!("Error listing issue comments: {:#}", e),
        }

        let body = self.failure_comment_body(result_url);
        if let Err(e) = self.sinks.comments.create_comment(owner, repo, number, &body).await {
            error!("Error creating comment: {:#}", e);
        }
    }

    /// Body of the failure comment
    ///
    /// Must start with the job context: that prefix is how the next
    /// reconciliation finds it.
    pub fn failure_comment_body(&self, result_url: &str) -> String {
        format!(
            "{} [**failed**]({}) for commit {}. [Full PR test history]({}).\n\n\
             The magic incantation to run this job again is `{}`. \
             Please help us cut down flakes by linking to an [open flake issue]({}) \
             when you hit one in your PR.",
            self.job.context,
            result_url,
            self.run.pull_sha,
            self.urls.pr_history_url(self.run.pr_number),
            self.job.rerun_command,
            FLAKE_ISSUES_URL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, Recorder, fixture_job, fixture_run, sinks};
    use line_core::domain::status::StatusState;

    fn reporter(recorder: &Recorder, report: bool) -> StatusReporter {
        StatusReporter::new(
            Arc::new(fixture_run(7)),
            Arc::new(fixture_job(None)),
            sinks(recorder),
            ReportOptions {
                report,
                bot_login: "k8s-ci-robot".to_string(),
                job_status_name: "line-job-abc".to_string(),
            },
            ResultUrls::default(),
        )
    }

    #[tokio::test]
    async fn test_report_pushes_both_sinks() {
        let recorder = Recorder::default();
        let reporter = reporter(&recorder, true);

        reporter.report(StatusEvent::pending("Build started.", "https://r/1/")).await;

        let calls = recorder.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(
            &calls[0],
            Call::CommitStatus { sha, status } if sha == "pullsha" && status.context == "Bazel test"
        ));
        assert!(matches!(
            &calls[1],
            Call::JobStatus { job, event } if job == "line-job-abc" && event.state == StatusState::Pending
        ));
    }

    #[tokio::test]
    async fn test_report_disabled_still_updates_job_status() {
        let recorder = Recorder::default();
        let reporter = reporter(&recorder, false);

        reporter.report(StatusEvent::failure("Build failed.", "https://r/1/")).await;
        reporter.reconcile_failure_comment("https://r/1/").await;

        let calls = recorder.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::JobStatus { .. }));
    }

    #[tokio::test]
    async fn test_commit_status_failure_does_not_block_job_status() {
        let recorder = Recorder::default();
        recorder.fail_commit_statuses();
        let reporter = reporter(&recorder, true);

        reporter.report(StatusEvent::success("Build succeeded.", "u")).await;

        assert_eq!(recorder.job_statuses().len(), 1);
        assert!(reporter.is_finished());
    }

    #[tokio::test]
    async fn test_no_transition_after_terminal() {
        let recorder = Recorder::default();
        let reporter = reporter(&recorder, true);

        reporter.report(StatusEvent::error("Error in queue.", "d")).await;
        reporter.report(StatusEvent::success("Build succeeded.", "u")).await;
        reporter.report(StatusEvent::pending("Build started.", "u")).await;

        let states: Vec<_> = recorder.job_statuses().iter().map(|e| e.state).collect();
        assert_eq!(states, vec![StatusState::Error]);
    }

    #[tokio::test]
    async fn test_reconcile_replaces_only_own_comments_for_this_context() {
        let recorder = Recorder::default();
        recorder.seed_comment("k8s-ci-robot", "Bazel test [**failed**](old) for commit x.");
        recorder.seed_comment("k8s-ci-robot", "Jenkins GCE e2e [**failed**](other job)");
        recorder.seed_comment("someone", "Bazel test is flaky again");
        let reporter = reporter(&recorder, true);

        reporter.reconcile_failure_comment("https://r/9/").await;

        let live = recorder.live_comments();
        assert_eq!(live.len(), 3);
        assert!(live.iter().any(|c| c.user.login == "someone"));
        assert!(live.iter().any(|c| c.body.starts_with("Jenkins GCE e2e")));
        let ours: Vec<_> = live
            .iter()
            .filter(|c| c.is_authored_with_prefix("k8s-ci-robot", "Bazel test"))
            .collect();
        assert_eq!(ours.len(), 1);
        assert!(ours[0].body.contains("https://r/9/"));
    }

    #[tokio::test]
    async fn test_reconcile_twice_leaves_one_comment() {
        let recorder = Recorder::default();
        let reporter = reporter(&recorder, true);

        reporter.reconcile_failure_comment("https://r/1/").await;
        reporter.reconcile_failure_comment("https://r/1/").await;

        let ours = recorder
            .live_comments()
            .into_iter()
            .filter(|c| c.body.starts_with("Bazel test"))
            .count();
        assert_eq!(ours, 1);
    }

    #[tokio::test]
    async fn test_reconcile_posts_even_when_listing_fails() {
        let recorder = Recorder::default();
        recorder.seed_comment("k8s-ci-robot", "Bazel test [**failed**](old)");
        recorder.fail_comment_listing();
        let reporter = reporter(&recorder, true);

        reporter.reconcile_failure_comment("https://r/2/").await;

        let calls = recorder.calls();
        assert!(matches!(calls.last(), Some(Call::CreateComment { .. })));
        assert!(!calls.iter().any(|c| matches!(c, Call::DeleteComment { .. })));
    }

    #[tokio::test]
    async fn test_reconcile_posts_even_when_deletion_fails() {
        let recorder = Recorder::default();
        recorder.seed_comment("k8s-ci-robot", "Bazel test [**failed**](old)");
        recorder.seed_comment("k8s-ci-robot", "Bazel test [**failed**](older)");
        recorder.fail_comment_deletion();
        let reporter = reporter(&recorder, true);

        reporter.reconcile_failure_comment("https://r/4/").await;

        let calls = recorder.calls();
        let deletes = calls
            .iter()
            .filter(|c| matches!(c, Call::DeleteComment { .. }))
            .count();
        assert_eq!(deletes, 2);
        assert!(matches!(
            calls.last(),
            Some(Call::CreateComment { body }) if body.contains("https://r/4/")
        ));
    }

    #[tokio::test]
    async fn test_post_failure_is_contained() {
        let recorder = Recorder::default();
        recorder.fail_comment_creation();
        let reporter = reporter(&recorder, true);

        reporter.reconcile_failure_comment("https://r/5/").await;

        assert!(recorder.live_comments().is_empty());
        assert!(matches!(recorder.calls().last(), Some(Call::CreateComment { .. })));
    }

    #[tokio::test]
    async fn test_job_status_failure_still_settles_run() {
        let recorder = Recorder::default();
        recorder.fail_job_statuses();
        let reporter = reporter(&recorder, true);

        reporter.report(StatusEvent::failure("Build failed.", "u")).await;

        assert_eq!(recorder.commit_statuses().len(), 1);
        assert_eq!(recorder.job_statuses().len(), 1);
        assert!(reporter.is_finished());
    }

    #[test]
    fn test_failure_comment_body() {
        let recorder = Recorder::default();
        let body = reporter(&recorder, true).failure_comment_body("https://r/3/");

        assert!(body.starts_with("Bazel test [**failed**](https://r/3/) for commit pullsha."));
        assert!(body.contains("[Full PR test history](http://pr-test.k8s.io/7)"));
        assert!(body.contains("`@k8s-bot bazel test this`"));
        assert!(body.contains("label:kind/flake"));
    }
}

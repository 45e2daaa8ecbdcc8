//! Build lifecycle
//!
//! Drives one run through its states:
//!
//! ```text
//! start ──declined──> error (overloaded), Ok(Declined)
//!   │
//!   └─started──> pending ──poll/sleep──> success | failure (+ comment) | error
//! ```
//!
//! Any [`RunError`] is reported once as an `error` status with the generic
//! diagnostic link and returned to the caller. The backend call that failed
//! is never retried here.

use chrono::{DateTime, Utc};
use line_core::domain::job::JobSpec;
use line_core::domain::run::RunDescriptor;
use line_core::domain::status::StatusEvent;
use std::sync::Arc;
use tracing::{error, info};

use crate::backend::{Admission, Backend, BackendKind, Phase, Verdict};
use crate::error::RunError;
use crate::scheduler::Pacer;
use crate::service::{ResultUrls, StatusReporter};

/// How a run ended, when it ended without a system error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    /// The tests ran and failed
    Failed,
    /// The backend refused to take the run
    Declined { reason: String },
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Succeeded => write!(f, "succeeded"),
            RunOutcome::Failed => write!(f, "failed"),
            RunOutcome::Declined { reason } => write!(f, "declined ({})", reason),
        }
    }
}

/// Working state of the run; discarded when the run ends
#[derive(Debug)]
struct RunState {
    backend: BackendKind,
    started_at: DateTime<Utc>,
    build_id: Option<String>,
    result_url: Option<String>,
    last_phase: Option<Phase>,
    polls: u32,
}

impl RunState {
    fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            started_at: Utc::now(),
            build_id: None,
            result_url: None,
            last_phase: None,
            polls: 0,
        }
    }
}

/// Runs one job for one change and keeps its observers up to date
pub struct BuildLifecycle {
    run: Arc<RunDescriptor>,
    job: Arc<JobSpec>,
    reporter: StatusReporter,
    urls: ResultUrls,
    pacer: Pacer,
}

impl BuildLifecycle {
    pub fn new(
        run: Arc<RunDescriptor>,
        job: Arc<JobSpec>,
        reporter: StatusReporter,
        urls: ResultUrls,
        pacer: Pacer,
    ) -> Self {
        Self {
            run,
            job,
            reporter,
            urls,
            pacer,
        }
    }

    /// Executes the run on `backend` until it reaches a terminal status
    pub async fn execute(&self, backend: &mut dyn Backend) -> Result<RunOutcome, RunError> {
        let mut state = RunState::new(backend.kind());
        info!("Running {} on {}", self.job.name, state.backend);

        let result = self.drive(backend, &mut state).await;

        let elapsed = Utc::now() - state.started_at;
        match &result {
            Ok(outcome) => info!(
                "Run {} after {}s and {} poll(s), build {:?}, results {:?}",
                outcome,
                elapsed.num_seconds(),
                state.polls,
                state.build_id,
                state.result_url
            ),
            Err(e) => {
                error!(
                    "Run errored after {}s on {} (last phase {:?}): {:#}",
                    elapsed.num_seconds(),
                    state.backend,
                    state.last_phase,
                    e
                );
                self.reporter
                    .report(StatusEvent::error(e.description(), self.urls.diagnostic_url()))
                    .await;
            }
        }

        result
    }

    async fn drive(
        &self,
        backend: &mut dyn Backend,
        state: &mut RunState,
    ) -> Result<RunOutcome, RunError> {
        let build = match self.pacer.guard(backend.start(&self.reporter, &self.pacer)).await?? {
            Admission::Started { build } => build,
            Admission::Declined { reason } => {
                self.reporter
                    .report(StatusEvent::error(reason.clone(), self.urls.diagnostic_url()))
                    .await;
                return Ok(RunOutcome::Declined { reason });
            }
        };

        let result_url = self.urls.result_url(
            &self.run.owner,
            &self.run.repo,
            self.run.pr_number,
            &self.job.name,
            &build,
        );
        state.build_id = Some(build);
        state.result_url = Some(result_url.clone());

        self.reporter
            .report(StatusEvent::pending("Build started.", result_url.clone()))
            .await;

        loop {
            let phase = self.pacer.guard(backend.poll_once()).await??;
            state.polls += 1;
            state.last_phase = Some(phase);

            let verdict = match phase.verdict() {
                Some(verdict) => verdict,
                None => {
                    self.pacer.sleep(backend.poll_interval()).await?;
                    continue;
                }
            };

            return match verdict {
                Verdict::Succeeded => {
                    self.reporter
                        .report(StatusEvent::success("Build succeeded.", result_url))
                        .await;
                    Ok(RunOutcome::Succeeded)
                }
                Verdict::Failed => {
                    self.reporter
                        .report(StatusEvent::failure("Build failed.", result_url.clone()))
                        .await;
                    self.reporter.reconcile_failure_comment(&result_url).await;
                    Ok(RunOutcome::Failed)
                }
                Verdict::Unknown => Err(RunError::UnknownPhase),
            };
        }
    }
}

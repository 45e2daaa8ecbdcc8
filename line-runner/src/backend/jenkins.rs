//! Jenkins backend
//!
//! Checks the queue depth before triggering, waits for the build to leave
//! the queue, then follows the build until Jenkins stops building it.

use async_trait::async_trait;
use line_core::domain::jenkins::{BuildRequest, BuildResult, QueuedBuild};
use line_core::domain::run::RunDescriptor;
use line_core::domain::status::StatusEvent;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{Admission, Backend, BackendKind, Phase, PollIntervals};
use crate::error::RunError;
use crate::repository::BuildRepository;
use crate::scheduler::Pacer;
use crate::service::StatusReporter;

/// Queue depth above which new builds are declined
pub const MAX_QUEUE_SIZE: usize = 200;

const OVERLOADED: &str = "Jenkins overloaded. Please try again later.";
const WAITING_FOR_BUILD: &str = "Error waiting for build.";

pub struct JenkinsBackend {
    builds: Arc<dyn BuildRepository>,
    run: Arc<RunDescriptor>,
    job_name: String,
    intervals: PollIntervals,
    ticket: Option<QueuedBuild>,
    /// Status fetched when the build left the queue, consumed by the first poll
    first_result: Option<BuildResult>,
}

impl JenkinsBackend {
    pub fn new(
        builds: Arc<dyn BuildRepository>,
        run: Arc<RunDescriptor>,
        job_name: String,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            builds,
            run,
            job_name,
            intervals,
            ticket: None,
            first_result: None,
        }
    }

    fn request(&self) -> BuildRequest {
        BuildRequest {
            job_name: self.job_name.clone(),
            pr_number: self.run.pr_number,
            refs: self.run.refs.clone(),
            base_ref: self.run.base_ref.clone(),
            base_sha: self.run.base_sha.clone(),
            pull_sha: self.run.pull_sha.clone(),
        }
    }

    /// Waits until the build has been picked up by an executor
    async fn wait_for_dequeue(&self, ticket: &QueuedBuild, pacer: &Pacer) -> Result<(), RunError> {
        let mut enqueued = self
            .builds
            .is_enqueued(ticket)
            .await
            .map_err(|e| RunError::poll("Error queueing build.", e))?;

        while enqueued {
            debug!("Build {} still queued", ticket.build_id);
            pacer.sleep(self.intervals.queue).await?;
            enqueued = self
                .builds
                .is_enqueued(ticket)
                .await
                .map_err(|e| RunError::poll("Error in queue.", e))?;
        }

        Ok(())
    }
}

fn classify(result: &BuildResult) -> Phase {
    if result.building {
        Phase::Running
    } else if result.success {
        Phase::Succeeded
    } else {
        Phase::Failed
    }
}

#[async_trait]
impl Backend for JenkinsBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Jenkins
    }

    async fn start(
        &mut self,
        reporter: &StatusReporter,
        pacer: &Pacer,
    ) -> Result<Admission, RunError> {
        let size = self
            .builds
            .queue_size()
            .await
            .map_err(|e| RunError::admission("Error checking Jenkins queue.", e))?;

        if size > MAX_QUEUE_SIZE {
            info!("Jenkins queue holds {} builds, declining run", size);
            return Ok(Admission::Declined {
                reason: OVERLOADED.to_string(),
            });
        }

        info!("Starting build.");
        reporter.report(StatusEvent::pending("Build triggered.", "")).await;

        let ticket = self
            .builds
            .build(&self.request())
            .await
            .map_err(|e| RunError::submission("Error starting build.", e))?;

        self.wait_for_dequeue(&ticket, pacer).await?;

        let result = self
            .builds
            .status(&ticket)
            .await
            .map_err(|e| RunError::poll(WAITING_FOR_BUILD, e))?;

        info!("Build {} of {} started", result.number, self.job_name);
        self.ticket = Some(ticket);
        self.first_result = Some(result);

        Ok(Admission::Started {
            build: result.number.to_string(),
        })
    }

    async fn poll_once(&mut self) -> Result<Phase, RunError> {
        if let Some(result) = self.first_result.take() {
            return Ok(classify(&result));
        }

        let ticket = self
            .ticket
            .as_ref()
            .ok_or_else(|| RunError::poll(WAITING_FOR_BUILD, anyhow::anyhow!("build was never triggered")))?;

        let result = self
            .builds
            .status(ticket)
            .await
            .map_err(|e| RunError::poll(WAITING_FOR_BUILD, e))?;

        Ok(classify(&result))
    }

    fn poll_interval(&self) -> Duration {
        self.intervals.build
    }
}

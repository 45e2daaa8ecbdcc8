//! Line Runner
//!
//! Runs one presubmit job for one pull request, on Kubernetes or on Jenkins,
//! and keeps the observers of the run in sync with its outcome.
//!
//! Architecture:
//! - Configuration: command line flags plus the mounted job config, labels and secrets
//! - Repositories: narrow contracts over GitHub, Kubernetes and Jenkins
//! - Services: result URLs, build identifiers, status and comment reporting
//! - Backends: submit and poll one unit of work
//! - Scheduler: the run lifecycle and its cancellation / deadline pacing
//!
//! The runner exits non-zero only when the run itself errored; a failing
//! test is a successful run of the runner.

mod backend;
mod config;
mod error;
mod repository;
mod scheduler;
mod service;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use line_client::{GitHubClient, JenkinsClient, KubeClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::backend::{Backends, PollIntervals, select_backend};
use crate::config::{Config, JobConfig, LogFormat, read_job_name, read_token};
use crate::scheduler::{BuildLifecycle, Pacer};
use crate::service::{RandomBuildIds, ReportOptions, ResultUrls, Sinks, StatusReporter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    info!("Starting Line Runner");
    config.validate()?;
    info!(
        "Loaded configuration: job={}, repo={}/{}, pr={}, dry_run={}, report={}",
        config.job_name,
        config.repo_owner,
        config.repo_name,
        config.pr,
        config.dry_run,
        config.report
    );

    // Secrets; empty ones are only tolerated when nothing is sent
    let github_token = read_token(&config.github_token_file, config.dry_run)?;
    let jenkins_token = read_token(&config.jenkins_token_file, config.dry_run)?;

    let github = Arc::new(GitHubClient::with_base_url(
        config.github_endpoint.clone(),
        github_token,
        config.dry_run,
    ));
    let jenkins = Arc::new(JenkinsClient::new(
        config.jenkins_url.clone(),
        config.jenkins_user.clone(),
        jenkins_token,
        config.dry_run,
    ));
    let kube = Arc::new(
        KubeClient::in_cluster(config.namespace.clone())
            .context("Failed to create Kubernetes client")?,
    );
    info!("Clients initialized");

    let job_status_name = read_job_name(&config.labels_path)?;

    let jobs = JobConfig::load(&config.job_config)?;
    info!("Loaded {} job(s) from {}", jobs.len(), config.job_config.display());

    let run = Arc::new(config.run_descriptor());
    let job = jobs
        .get_job(&run.full_name(), &config.job_name)
        .cloned()
        .with_context(|| format!("Job {} not found for {}", config.job_name, run.full_name()))?;
    let job = Arc::new(job);

    let urls = ResultUrls::default();
    let reporter = StatusReporter::new(
        Arc::clone(&run),
        Arc::clone(&job),
        Sinks {
            statuses: github.clone(),
            job_statuses: kube.clone(),
            comments: github,
        },
        ReportOptions {
            report: config.report,
            bot_login: config.bot_login.clone(),
            job_status_name,
        },
        urls.clone(),
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));
    let pacer = Pacer::new(cancel, config.timeout());

    let backends = Backends {
        pods: kube,
        builds: jenkins,
        ids: Arc::new(RandomBuildIds),
        intervals: PollIntervals::default(),
    };
    let mut backend = select_backend(&job, Arc::clone(&run), &backends);

    let span = info_span!(
        "run",
        job = %job.name,
        org = %run.owner,
        repo = %run.repo,
        pr = run.pr_number,
        base_ref = %run.base_ref,
        base_sha = %run.base_sha,
        pull_sha = %run.pull_sha,
        refs = %run.refs,
        backend = %backend.kind()
    );

    let lifecycle = BuildLifecycle::new(Arc::clone(&run), job, reporter, urls, pacer);
    let result = lifecycle
        .execute(backend.as_mut())
        .instrument(span.clone())
        .await;

    let _entered = span.enter();
    match result {
        Ok(outcome) => {
            info!("Run {}", outcome);
            Ok(())
        }
        Err(e) => {
            error!("Run error: {:#}", e);
            Err(e.into())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "line_runner=info,line_client=info".into());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Cancels the run on Ctrl-C or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }

    warn!("Shutdown signal received, cancelling run");
    cancel.cancel();
}

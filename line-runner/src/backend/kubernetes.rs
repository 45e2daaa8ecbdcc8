//! Kubernetes backend
//!
//! Runs the job's pod template as a pod named after the build identifier and
//! follows the pod's phase.

use async_trait::async_trait;
use line_core::domain::pod::{EnvVar, ObjectMeta, Pod, PodPhase, PodSpec};
use line_core::domain::run::RunDescriptor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{Admission, Backend, BackendKind, Phase};
use crate::error::RunError;
use crate::repository::PodRepository;
use crate::scheduler::Pacer;
use crate::service::{BuildIdGenerator, StatusReporter};

pub struct KubernetesBackend {
    pods: Arc<dyn PodRepository>,
    ids: Arc<dyn BuildIdGenerator>,
    run: Arc<RunDescriptor>,
    template: PodSpec,
    interval: Duration,
    pod_name: Option<String>,
}

impl KubernetesBackend {
    pub fn new(
        pods: Arc<dyn PodRepository>,
        ids: Arc<dyn BuildIdGenerator>,
        run: Arc<RunDescriptor>,
        template: PodSpec,
        interval: Duration,
    ) -> Self {
        Self {
            pods,
            ids,
            run,
            template,
            interval,
            pod_name: None,
        }
    }

    /// The pod to submit: the template plus the run's environment
    fn materialize(&self, build_id: &str) -> Pod {
        let mut spec = self.template.clone();
        spec.inject_env(&run_env(&self.run, build_id));

        Pod {
            metadata: ObjectMeta {
                name: build_id.to_string(),
                ..Default::default()
            },
            spec,
            ..Default::default()
        }
    }
}

/// Variables every test container receives
fn run_env(run: &RunDescriptor, build_id: &str) -> [EnvVar; 6] {
    [
        EnvVar::new("PULL_REFS", &run.refs),
        EnvVar::new("PULL_NUMBER", run.pr_number.to_string()),
        EnvVar::new("PULL_BASE_REF", &run.base_ref),
        EnvVar::new("PULL_BASE_SHA", &run.base_sha),
        EnvVar::new("PULL_PULL_SHA", &run.pull_sha),
        EnvVar::new("BUILD_NUMBER", build_id),
    ]
}

#[async_trait]
impl Backend for KubernetesBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Kubernetes
    }

    async fn start(
        &mut self,
        _reporter: &StatusReporter,
        _pacer: &Pacer,
    ) -> Result<Admission, RunError> {
        let build_id = self.ids.next_id();
        let pod = self.materialize(&build_id);

        info!("Starting pod {}", build_id);
        let created = self
            .pods
            .create_pod(&pod)
            .await
            .map_err(|e| RunError::submission("Error creating build pod.", e))?;

        let name = if created.metadata.name.is_empty() {
            build_id.clone()
        } else {
            created.metadata.name
        };
        self.pod_name = Some(name);

        Ok(Admission::Started { build: build_id })
    }

    async fn poll_once(&mut self) -> Result<Phase, RunError> {
        const DESCRIPTION: &str = "Error waiting for pod to complete.";

        let name = self
            .pod_name
            .as_deref()
            .ok_or_else(|| RunError::poll(DESCRIPTION, anyhow::anyhow!("pod was never created")))?;

        let pod = self
            .pods
            .get_pod(name)
            .await
            .map_err(|e| RunError::poll(DESCRIPTION, e))?;

        debug!("Pod {} is {:?}", name, pod.status.phase);

        Ok(match pod.status.phase {
            PodPhase::Pending | PodPhase::Running => Phase::Running,
            PodPhase::Succeeded => Phase::Succeeded,
            PodPhase::Failed => Phase::Failed,
            PodPhase::Unknown => Phase::Unknown,
        })
    }

    fn poll_interval(&self) -> Duration {
        self.interval
    }
}

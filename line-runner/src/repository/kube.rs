//! Kubernetes-backed pod and job status repositories

use anyhow::Result;
use async_trait::async_trait;
use line_client::KubeClient;
use line_core::domain::pod::Pod;
use line_core::domain::status::StatusEvent;

use super::{JobStatusRepository, PodRepository};

#[async_trait]
impl PodRepository for KubeClient {
    async fn create_pod(&self, pod: &Pod) -> Result<Pod> {
        Ok(KubeClient::create_pod(self, pod).await?)
    }

    async fn get_pod(&self, name: &str) -> Result<Pod> {
        Ok(KubeClient::get_pod(self, name).await?)
    }
}

#[async_trait]
impl JobStatusRepository for KubeClient {
    async fn set_job_status(&self, job_name: &str, event: &StatusEvent) -> Result<()> {
        Ok(KubeClient::set_job_status(
            self,
            job_name,
            event.state,
            &event.description,
            &event.target_url,
        )
        .await?)
    }
}

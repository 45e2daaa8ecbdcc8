//! Jenkins-backed build repository

use anyhow::Result;
use async_trait::async_trait;
use line_client::JenkinsClient;
use line_core::domain::jenkins::{BuildRequest, BuildResult, QueuedBuild};

use super::BuildRepository;

#[async_trait]
impl BuildRepository for JenkinsClient {
    async fn queue_size(&self) -> Result<usize> {
        Ok(JenkinsClient::queue_size(self).await?)
    }

    async fn build(&self, request: &BuildRequest) -> Result<QueuedBuild> {
        Ok(JenkinsClient::build(self, request).await?)
    }

    async fn is_enqueued(&self, build: &QueuedBuild) -> Result<bool> {
        Ok(JenkinsClient::is_enqueued(self, build).await?)
    }

    async fn status(&self, build: &QueuedBuild) -> Result<BuildResult> {
        Ok(JenkinsClient::status(self, build).await?)
    }
}

//! Jenkins API client
//!
//! Jenkins only returns a queue location when a build is triggered, so each
//! build is tagged with a generated `buildId` parameter. The queue and the
//! job's build list are then searched for that parameter.

use line_core::domain::jenkins::{BuildRequest, BuildResult, QueuedBuild};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::{handle_empty_response, handle_response};

const BUILD_ID_PARAM: &str = "buildId";

const DRY_RUN_RESULT: BuildResult = BuildResult {
    building: false,
    success: true,
    number: 0,
};

/// HTTP client for a Jenkins master
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    base_url: String,
    user: String,
    token: String,
    dry_run: bool,
    client: Client,
}

impl JenkinsClient {
    /// Create a Jenkins client using basic auth
    ///
    /// # Arguments
    /// * `base_url` - Jenkins master URL (e.g., "http://pull-jenkins-master:8080")
    /// * `user` - Jenkins user name
    /// * `token` - API token for that user
    /// * `dry_run` - When true, builds are logged instead of triggered
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.into(),
            token: token.into(),
            dry_run,
            client: Client::new(),
        }
    }

    /// Get the Jenkins master URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.user, Some(&self.token))
    }

    async fn queue(&self) -> Result<Vec<QueueItem>> {
        let response = self
            .get(format!("{}/queue/api/json", self.base_url))
            .send()
            .await?;

        let queue: QueueResponse = handle_response(response).await?;
        Ok(queue.items)
    }

    /// Number of items currently waiting in the Jenkins queue
    pub async fn queue_size(&self) -> Result<usize> {
        Ok(self.queue().await?.len())
    }

    /// Trigger a parameterized build
    pub async fn build(&self, req: &BuildRequest) -> Result<QueuedBuild> {
        let queued = QueuedBuild {
            job_name: req.job_name.clone(),
            build_id: Uuid::new_v4().simple().to_string(),
        };

        if self.dry_run {
            info!(
                "[dry-run] Build {} for PR {} (buildId {})",
                req.job_name, req.pr_number, queued.build_id
            );
            return Ok(queued);
        }

        let url = format!("{}/job/{}/buildWithParameters", self.base_url, req.job_name);
        let pr_number = req.pr_number.to_string();
        let response = self
            .client
            .post(url)
            .basic_auth(&self.user, Some(&self.token))
            .query(&[
                (BUILD_ID_PARAM, queued.build_id.as_str()),
                ("PULL_REFS", req.refs.as_str()),
                ("PULL_NUMBER", pr_number.as_str()),
                ("PULL_BASE_REF", req.base_ref.as_str()),
                ("PULL_BASE_SHA", req.base_sha.as_str()),
                ("PULL_PULL_SHA", req.pull_sha.as_str()),
            ])
            .send()
            .await?;

        handle_empty_response(response).await?;
        Ok(queued)
    }

    /// Whether the build is still waiting in the queue
    pub async fn is_enqueued(&self, build: &QueuedBuild) -> Result<bool> {
        if self.dry_run {
            return Ok(false);
        }

        Ok(self
            .queue()
            .await?
            .iter()
            .any(|item| item.task.name == build.job_name && has_build_id(&item.actions, &build.build_id)))
    }

    /// Current state of a build that has left the queue
    ///
    /// Dry-run builds were never triggered; they report as finished and
    /// successful so the run completes the way a live one would.
    pub async fn status(&self, build: &QueuedBuild) -> Result<BuildResult> {
        if self.dry_run {
            info!("[dry-run] Build {} of {} reported as passed", build.build_id, build.job_name);
            return Ok(DRY_RUN_RESULT);
        }

        let url = format!(
            "{}/job/{}/api/json?tree=builds[number,result,building,actions[parameters[name,value]]]",
            self.base_url, build.job_name
        );
        let response = self.get(url).send().await?;
        let info: JobInfo = handle_response(response).await?;

        info.builds
            .iter()
            .find(|b| has_build_id(&b.actions, &build.build_id))
            .map(JenkinsBuild::to_result)
            .ok_or_else(|| ClientError::BuildNotFound {
                job: build.job_name.clone(),
                build_id: build.build_id.clone(),
            })
    }
}

/// Whether any action carries a `buildId` parameter equal to `id`
fn has_build_id(actions: &[Action], id: &str) -> bool {
    actions
        .iter()
        .flat_map(|a| a.parameters.iter())
        .any(|p| p.name == BUILD_ID_PARAM && p.value.as_str() == Some(id))
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    items: Vec<QueueItem>,
}

#[derive(Debug, Deserialize)]
struct QueueItem {
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(default)]
    task: Task,
}

#[derive(Debug, Default, Deserialize)]
struct Task {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Action {
    #[serde(default)]
    parameters: Vec<Parameter>,
}

#[derive(Debug, Deserialize)]
struct Parameter {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JobInfo {
    #[serde(default)]
    builds: Vec<JenkinsBuild>,
}

#[derive(Debug, Deserialize)]
struct JenkinsBuild {
    number: u64,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    building: bool,
    #[serde(default)]
    actions: Vec<Action>,
}

impl JenkinsBuild {
    fn to_result(&self) -> BuildResult {
        BuildResult {
            building: self.building,
            success: self.result.as_deref() == Some("SUCCESS"),
            number: self.number,
        }
    }
}

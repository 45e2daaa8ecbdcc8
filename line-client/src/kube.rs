//! Kubernetes API client
//!
//! Namespace-scoped access to pods and to the batch Job that hosts the
//! runner. Authentication uses the pod's service account when running in
//! cluster.
//!
//! There is no dry-run mode: test pods and the Job's status annotations
//! live in the CI cluster itself, so they are always written.

use line_core::domain::pod::Pod;
use line_core::domain::status::StatusState;
use reqwest::{Certificate, Client};
use serde_json::json;
use tracing::info;

use crate::error::{ClientError, Result};
use crate::{handle_empty_response, handle_response};

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// HTTP client for the Kubernetes API server
#[derive(Debug, Clone)]
pub struct KubeClient {
    base_url: String,
    namespace: String,
    token: Option<String>,
    client: Client,
}

impl KubeClient {
    /// Create a client from the in-cluster service account
    ///
    /// Reads the API server address from `KUBERNETES_SERVICE_HOST` and
    /// `KUBERNETES_SERVICE_PORT`, and the bearer token and CA bundle from the
    /// mounted service account secret.
    pub fn in_cluster(namespace: impl Into<String>) -> Result<Self> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST")
            .map_err(|_| ClientError::Config("KUBERNETES_SERVICE_HOST not set".to_string()))?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT")
            .map_err(|_| ClientError::Config("KUBERNETES_SERVICE_PORT not set".to_string()))?;

        let token = std::fs::read_to_string(format!("{}/token", SERVICE_ACCOUNT_DIR))
            .map_err(|e| ClientError::Config(format!("Failed to read service account token: {}", e)))?;
        let ca = std::fs::read(format!("{}/ca.crt", SERVICE_ACCOUNT_DIR))
            .map_err(|e| ClientError::Config(format!("Failed to read service account CA: {}", e)))?;

        let client = Client::builder()
            .add_root_certificate(Certificate::from_pem(&ca)?)
            .build()?;

        let mut kube = Self::with_client(format!("https://{}:{}", host, port), namespace, client);
        kube.token = Some(token.trim().to_string());
        Ok(kube)
    }

    /// Create a client against an explicit endpoint (e.g. `kubectl proxy`)
    pub fn with_client(
        base_url: impl Into<String>,
        namespace: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: namespace.into(),
            token: None,
            client,
        }
    }

    /// Get the API server URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the namespace all calls are scoped to
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn pods_url(&self) -> String {
        format!("{}/api/v1/namespaces/{}/pods", self.base_url, self.namespace)
    }

    // =============================================================================
    // Pods
    // =============================================================================

    /// Create a pod and return the object the API server stored
    pub async fn create_pod(&self, pod: &Pod) -> Result<Pod> {
        info!("CreatePod {}/{}", self.namespace, pod.metadata.name);
        let request = self.client.post(self.pods_url()).json(pod);
        let response = self.authorize(request).send().await?;

        handle_response(response).await
    }

    /// Fetch a pod by name
    pub async fn get_pod(&self, name: &str) -> Result<Pod> {
        let request = self.client.get(format!("{}/{}", self.pods_url(), name));
        let response = self.authorize(request).send().await?;

        handle_response(response).await
    }

    // =============================================================================
    // Jobs
    // =============================================================================

    /// Record a run status on a batch Job as annotations
    ///
    /// Sets the `state`, `description` and `url` annotations with a JSON
    /// merge patch so other annotations are preserved.
    pub async fn set_job_status(
        &self,
        job_name: &str,
        state: StatusState,
        description: &str,
        url: &str,
    ) -> Result<()> {
        let url_path = format!(
            "{}/apis/batch/v1/namespaces/{}/jobs/{}",
            self.base_url, self.namespace, job_name
        );
        let request = self
            .client
            .patch(url_path)
            .header(reqwest::header::CONTENT_TYPE, "application/merge-patch+json")
            .body(status_patch(state, description, url).to_string());
        let response = self.authorize(request).send().await?;

        handle_empty_response(response).await
    }
}

/// Merge patch body carrying the status annotations
fn status_patch(state: StatusState, description: &str, url: &str) -> serde_json::Value {
    json!({
        "metadata": {
            "annotations": {
                "state": state.as_str(),
                "description": description,
                "url": url,
            }
        }
    })
}

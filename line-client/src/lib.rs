//! Line HTTP Clients
//!
//! Narrow, typed clients for the three systems a CI run talks to:
//! - GitHub: commit statuses and pull request comments
//! - Kubernetes: test pods and the status annotations of the runner's own Job
//! - Jenkins: queue inspection, build triggering and build status
//!
//! The GitHub and Jenkins clients have a dry-run mode that logs mutating
//! calls instead of sending them. Kubernetes is always live: test pods and
//! the runner's Job belong to the CI cluster itself.
//!
//! # Example
//!
//! ```no_run
//! use line_client::GitHubClient;
//!
//! #[tokio::main]
//! async fn main() -> line_client::Result<()> {
//!     let client = GitHubClient::new("token", true);
//!     let comments = client.list_issue_comments("kubernetes", "test-infra", 1).await?;
//!     println!("{} comments", comments.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod github;
mod jenkins;
mod kube;

pub use error::{ClientError, Result};
pub use github::GitHubClient;
pub use jenkins::JenkinsClient;
pub use kube::KubeClient;

use serde::de::DeserializeOwned;

// =============================================================================
// Response Handlers
// =============================================================================

/// Check the status code of a response and deserialize its JSON body
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::status(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Check the status code of a response whose body is not needed
async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::status(status.as_u16(), error_text));
    }

    Ok(())
}

//! GitHub API client
//!
//! Covers commit statuses and issue comments, which is all a presubmit run
//! reports back to a pull request.

use line_core::domain::comment::IssueComment;
use line_core::domain::status::CommitStatus;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::{handle_empty_response, handle_response};

const DEFAULT_ENDPOINT: &str = "https://api.github.com";
const USER_AGENT: &str = "line";
const PAGE_SIZE: usize = 100;

/// HTTP client for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    base_url: String,
    token: String,
    dry_run: bool,
    client: Client,
}

impl GitHubClient {
    /// Create a client for api.github.com
    ///
    /// # Arguments
    /// * `token` - OAuth token used for every request
    /// * `dry_run` - When true, statuses and comments are logged, not written
    pub fn new(token: impl Into<String>, dry_run: bool) -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT, token, dry_run)
    }

    /// Create a client for a GitHub Enterprise or proxy endpoint
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>, dry_run: bool) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            dry_run,
            client: Client::new(),
        }
    }

    /// Get the API endpoint this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether mutating calls are suppressed
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
    }

    // =============================================================================
    // Statuses
    // =============================================================================

    /// Set a commit status on `sha`
    pub async fn create_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &CommitStatus,
    ) -> Result<()> {
        if self.dry_run {
            info!(
                "[dry-run] CreateStatus {}/{}@{}: {} {:?}",
                owner, repo, sha, status.state, status.description
            );
            return Ok(());
        }

        let path = format!("/repos/{}/{}/statuses/{}", owner, repo, sha);
        let response = self.request(Method::POST, &path).json(status).send().await?;

        handle_empty_response(response).await
    }

    // =============================================================================
    // Comments
    // =============================================================================

    /// List every comment on an issue or pull request, following pagination
    pub async fn list_issue_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>> {
        let path = format!("/repos/{}/{}/issues/{}/comments", owner, repo, number);
        let mut comments = Vec::new();
        let mut page = 1;

        loop {
            let response = self
                .request(Method::GET, &path)
                .query(&[("per_page", PAGE_SIZE), ("page", page)])
                .send()
                .await?;

            let batch: Vec<IssueComment> = handle_response(response).await?;
            let last_page = batch.len() < PAGE_SIZE;
            comments.extend(batch);

            if last_page {
                return Ok(comments);
            }
            page += 1;
        }
    }

    /// Post a new comment on an issue or pull request
    pub async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<()> {
        if self.dry_run {
            info!("[dry-run] CreateComment {}/{}#{}: {}", owner, repo, number, body);
            return Ok(());
        }

        let path = format!("/repos/{}/{}/issues/{}/comments", owner, repo, number);
        let response = self
            .request(Method::POST, &path)
            .json(&CommentBody { body })
            .send()
            .await?;

        handle_empty_response(response).await
    }

    /// Delete a comment by ID
    pub async fn delete_comment(&self, owner: &str, repo: &str, id: u64) -> Result<()> {
        if self.dry_run {
            info!("[dry-run] DeleteComment {}/{} {}", owner, repo, id);
            return Ok(());
        }

        let path = format!("/repos/{}/{}/issues/comments/{}", owner, repo, id);
        let response = self.request(Method::DELETE, &path).send().await?;

        handle_empty_response(response).await
    }
}

#[derive(Debug, Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

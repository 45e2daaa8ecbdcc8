//! GitHub-backed status and comment repositories

use anyhow::Result;
use async_trait::async_trait;
use line_client::GitHubClient;
use line_core::domain::comment::IssueComment;
use line_core::domain::status::CommitStatus;

use super::{CommentRepository, CommitStatusRepository};

#[async_trait]
impl CommitStatusRepository for GitHubClient {
    async fn create_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &CommitStatus,
    ) -> Result<()> {
        Ok(GitHubClient::create_status(self, owner, repo, sha, status).await?)
    }
}

#[async_trait]
impl CommentRepository for GitHubClient {
    async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>> {
        Ok(self.list_issue_comments(owner, repo, number).await?)
    }

    async fn create_comment(&self, owner: &str, repo: &str, number: u64, body: &str) -> Result<()> {
        Ok(GitHubClient::create_comment(self, owner, repo, number, body).await?)
    }

    async fn delete_comment(&self, owner: &str, repo: &str, id: u64) -> Result<()> {
        Ok(GitHubClient::delete_comment(self, owner, repo, id).await?)
    }
}

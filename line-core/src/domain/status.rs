//! Commit status types

use serde::{Deserialize, Serialize};

/// State of a commit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Pending,
    Success,
    Failure,
    Error,
}

impl StatusState {
    /// Wire representation shared by GitHub and the job annotations
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusState::Pending => "pending",
            StatusState::Success => "success",
            StatusState::Failure => "failure",
            StatusState::Error => "error",
        }
    }

    /// Returns true for every state except pending
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusState::Pending)
    }
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status transition of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub state: StatusState,
    pub description: String,
    /// Empty when there is nothing to link yet
    pub target_url: String,
}

impl StatusEvent {
    pub fn new(
        state: StatusState,
        description: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            state,
            description: description.into(),
            target_url: target_url.into(),
        }
    }

    pub fn pending(description: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self::new(StatusState::Pending, description, target_url)
    }

    pub fn success(description: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self::new(StatusState::Success, description, target_url)
    }

    pub fn failure(description: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self::new(StatusState::Failure, description, target_url)
    }

    pub fn error(description: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self::new(StatusState::Error, description, target_url)
    }
}

/// Commit status as posted to GitHub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub state: StatusState,
    pub description: String,
    pub context: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_url: String,
}

impl CommitStatus {
    /// Builds the commit status for an event under the given context
    pub fn from_event(event: &StatusEvent, context: &str) -> Self {
        Self {
            state: event.state,
            description: event.description.clone(),
            context: context.to_string(),
            target_url: event.target_url.clone(),
        }
    }
}

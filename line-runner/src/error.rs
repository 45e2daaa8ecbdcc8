//! Run error taxonomy
//!
//! Every variant is an unrecoverable outcome of one run. The lifecycle
//! reports each of them as an `error` commit status carrying
//! [`RunError::description`] and never retries the backend call itself;
//! retrying the whole run is the caller's business.

use std::time::Duration;
use thiserror::Error;

/// Why a run ended without a backend verdict
#[derive(Debug, Error)]
pub enum RunError {
    /// The backend's load could not be checked before submitting
    #[error("{description} {source:#}")]
    Admission {
        description: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The unit of work could not be created
    #[error("{description} {source:#}")]
    Submission {
        description: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Fetching progress of a started unit failed
    #[error("{description} {source:#}")]
    Poll {
        description: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The backend reported a phase that is neither running nor a verdict
    #[error("backend reported an unknown phase")]
    UnknownPhase,

    /// The run was cancelled from outside
    #[error("run cancelled")]
    Cancelled,

    /// The run exceeded its deadline
    #[error("run exceeded its {0:?} deadline")]
    TimedOut(Duration),
}

impl RunError {
    /// Human description reported with the error status
    pub fn description(&self) -> &'static str {
        match self {
            RunError::Admission { description, .. }
            | RunError::Submission { description, .. }
            | RunError::Poll { description, .. } => description,
            RunError::UnknownPhase => "Error watching build.",
            RunError::Cancelled => "Run cancelled.",
            RunError::TimedOut(_) => "Build timed out.",
        }
    }

    pub(crate) fn admission(description: &'static str, source: anyhow::Error) -> Self {
        RunError::Admission { description, source }
    }

    pub(crate) fn submission(description: &'static str, source: anyhow::Error) -> Self {
        RunError::Submission { description, source }
    }

    pub(crate) fn poll(description: &'static str, source: anyhow::Error) -> Self {
        RunError::Poll { description, source }
    }
}

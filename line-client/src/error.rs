//! Client errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure talking to GitHub, Kubernetes or Jenkins
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("{status} from server: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Jenkins has no build carrying the tag we triggered it with
    #[error("No build of {job} tagged {build_id}")]
    BuildNotFound { job: String, build_id: String },

    /// In-cluster credentials or environment are missing
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failure() {
        assert_eq!(
            ClientError::status(422, "No commit found for SHA").to_string(),
            "422 from server: No commit found for SHA"
        );
        assert_eq!(
            ClientError::BuildNotFound {
                job: "pull-test-infra-bazel".into(),
                build_id: "abc".into(),
            }
            .to_string(),
            "No build of pull-test-infra-bazel tagged abc"
        );
    }
}

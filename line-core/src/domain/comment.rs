//! Discussion comment types

use serde::{Deserialize, Serialize};

/// Author of a comment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// A comment on an issue or pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub body: String,
}

impl IssueComment {
    /// Returns true when `login` wrote this comment and it starts with `prefix`
    pub fn is_authored_with_prefix(&self, login: &str, prefix: &str) -> bool {
        self.user.login == login && self.body.starts_with(prefix)
    }
}

//! Result viewer URLs
//!
//! Results of every run are browsable on Gubernator under a path derived
//! from the repository, the PR, the job and the build.

/// Gubernator path prefix for presubmit results
pub const GUBERNATOR_BASE: &str =
    "https://k8s-gubernator.appspot.com/build/kubernetes-jenkins/pr-logs/pull";

/// Where errors of the CI system itself should be reported
pub const DIAGNOSTIC_URL: &str = "https://github.com/kubernetes/test-infra/issues";

/// PR-level test history dashboard
pub const PR_HISTORY_BASE: &str = "http://pr-test.k8s.io";

/// Open flake issues, linked from failure comments
pub const FLAKE_ISSUES_URL: &str =
    "https://github.com/kubernetes/kubernetes/issues?q=is:issue+label:kind/flake+is:open";

const HOME_ORG: &str = "kubernetes";
const HOME_REPO: &str = "kubernetes";

/// Builds result viewer links
///
/// Paths of the home repository carry no repository segment; every other
/// repository is disambiguated by `owner_repo`, or by `repo` alone when it
/// lives in the home organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultUrls {
    base: String,
    home_owner: String,
    home_repo: String,
}

impl Default for ResultUrls {
    fn default() -> Self {
        Self::new(GUBERNATOR_BASE, HOME_ORG, HOME_REPO)
    }
}

impl ResultUrls {
    pub fn new(
        base: impl Into<String>,
        home_owner: impl Into<String>,
        home_repo: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            home_owner: home_owner.into(),
            home_repo: home_repo.into(),
        }
    }

    /// Link to the results of one build
    pub fn result_url(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        job_name: &str,
        build: &str,
    ) -> String {
        let mut url = self.base.clone();
        if owner != self.home_owner {
            url = format!("{}/{}_{}", url, owner, repo);
        } else if repo != self.home_repo {
            url = format!("{}/{}", url, repo);
        }

        let pr = if pr_number == 0 {
            "batch".to_string()
        } else {
            pr_number.to_string()
        };

        format!("{}/{}/{}/{}/", url, pr, job_name, build)
    }

    /// Link to the test history of a pull request
    pub fn pr_history_url(&self, pr_number: u64) -> String {
        format!("{}/{}", PR_HISTORY_BASE, pr_number)
    }

    /// Generic link used for errors that have no result page
    pub fn diagnostic_url(&self) -> &'static str {
        DIAGNOSTIC_URL
    }
}

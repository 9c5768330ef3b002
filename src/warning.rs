use crate::domain::BuildResult;
use std::fmt;

/// Non-fatal findings of a build that should be reported to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowWarning {
    /// Fetch failed due to authentication issues; local data was used
    FetchAuthenticationFailed { remote: String },
    /// Fetch failed for another reason; local data was used
    FetchFailed { remote: String, reason: String },
    /// A tracked branch no longer exists upstream and was forgotten
    BranchForgotten { branch: String },
    /// The build result was lowered because tracked branches are broken
    ResultDowngraded {
        from: BuildResult,
        to: BuildResult,
        broken_branches: Vec<String>,
    },
}

impl WorkflowWarning {
    /// Classify a fetch error
    pub fn fetch_failed(remote: &str, error: &str) -> Self {
        let lower = error.to_lowercase();
        if lower.contains("auth") || lower.contains("permission") || lower.contains("credential") {
            WorkflowWarning::FetchAuthenticationFailed {
                remote: remote.to_string(),
            }
        } else {
            WorkflowWarning::FetchFailed {
                remote: remote.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

impl fmt::Display for WorkflowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowWarning::FetchAuthenticationFailed { remote } => write!(
                f,
                "Authentication failed when fetching from remote '{}'; using local branch data",
                remote
            ),
            WorkflowWarning::FetchFailed { remote, reason } => write!(
                f,
                "Could not fetch from remote '{}': {}; using local branch data",
                remote, reason
            ),
            WorkflowWarning::BranchForgotten { branch } => {
                write!(f, "Branch '{}' is gone upstream and is no longer tracked", branch)
            }
            WorkflowWarning::ResultDowngraded {
                from,
                to,
                broken_branches,
            } => write!(
                f,
                "Build result lowered from {} to {}; broken branches: {}",
                from,
                to,
                broken_branches.join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_classification() {
        assert_eq!(
            WorkflowWarning::fetch_failed("origin", "authentication required"),
            WorkflowWarning::FetchAuthenticationFailed {
                remote: "origin".to_string()
            }
        );
        assert!(matches!(
            WorkflowWarning::fetch_failed("origin", "could not resolve host"),
            WorkflowWarning::FetchFailed { .. }
        ));
    }

    #[test]
    fn test_downgrade_message() {
        let warning = WorkflowWarning::ResultDowngraded {
            from: BuildResult::Success,
            to: BuildResult::Unstable,
            broken_branches: vec!["origin/release/2.3".to_string()],
        };
        assert_eq!(
            warning.to_string(),
            "Build result lowered from success to unstable; broken branches: origin/release/2.3"
        );
    }
}

use crate::domain::BuildResult;
use serde::{Deserialize, Serialize};

/// Cross-build state of one tracked branch, identified by
/// `(remote_alias, branch_name)` compared case-insensitively.
///
/// Records are plain values. Changing one means building a modified copy
/// and handing it back to the registry with `BranchRegistry::put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBranchRecord {
    pub remote_alias: String,
    pub branch_name: String,
    pub last_build_result: BuildResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_build_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_release_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_release_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_release_version_commit: Option<String>,
}

impl RemoteBranchRecord {
    /// Fresh record: nothing built yet, counted as failed until a build says otherwise
    pub fn new(remote_alias: impl Into<String>, branch_name: impl Into<String>) -> Self {
        RemoteBranchRecord {
            remote_alias: remote_alias.into(),
            branch_name: branch_name.into(),
            last_build_result: BuildResult::Failure,
            last_build_version: None,
            base_release_version: None,
            last_release_version: None,
            last_release_version_commit: None,
        }
    }

    /// Case-insensitive identity used for lookup and ordering
    pub fn sort_key(&self) -> (String, String) {
        (
            self.remote_alias.to_lowercase(),
            self.branch_name.to_lowercase(),
        )
    }

    /// Identity check, folded the same way as [`sort_key`](Self::sort_key)
    pub fn is(&self, remote_alias: &str, branch_name: &str) -> bool {
        self.remote_alias.to_lowercase() == remote_alias.to_lowercase()
            && self.branch_name.to_lowercase() == branch_name.to_lowercase()
    }

    /// `<remote>/<branch>` as shown in logs
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.remote_alias, self.branch_name)
    }

    pub fn with_result(self, last_build_result: BuildResult) -> Self {
        RemoteBranchRecord {
            last_build_result,
            ..self
        }
    }

    pub fn with_build_version(self, version: impl Into<String>) -> Self {
        RemoteBranchRecord {
            last_build_version: Some(version.into()),
            ..self
        }
    }

    pub fn with_base_release_version(self, version: impl Into<String>) -> Self {
        RemoteBranchRecord {
            base_release_version: Some(version.into()),
            ..self
        }
    }

    pub fn with_release(self, version: impl Into<String>, commit: impl Into<String>) -> Self {
        RemoteBranchRecord {
            last_release_version: Some(version.into()),
            last_release_version_commit: Some(commit.into()),
            ..self
        }
    }

    /// Copy of this record carrying every state field of `other`; identity is kept
    pub fn inherit_from(self, other: &RemoteBranchRecord) -> Self {
        RemoteBranchRecord {
            last_build_result: other.last_build_result,
            last_build_version: other.last_build_version.clone(),
            base_release_version: other.base_release_version.clone(),
            last_release_version: other.last_release_version.clone(),
            last_release_version_commit: other.last_release_version_commit.clone(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = RemoteBranchRecord::new("origin", "develop");
        assert_eq!(record.last_build_result, BuildResult::Failure);
        assert!(record.last_build_version.is_none());
        assert_eq!(record.display_name(), "origin/develop");
    }

    #[test]
    fn test_identity_is_case_insensitive() {
        let record = RemoteBranchRecord::new("Origin", "Release/2.3");
        assert!(record.is("origin", "release/2.3"));
        assert_eq!(
            record.sort_key(),
            ("origin".to_string(), "release/2.3".to_string())
        );
    }

    #[test]
    fn test_identity_folds_non_ascii_like_sort_key() {
        let record = RemoteBranchRecord::new("origin", "feature/Äpfel");
        let other = RemoteBranchRecord::new("origin", "feature/äpfel");
        assert_eq!(record.sort_key(), other.sort_key());
        assert!(record.is("origin", "feature/äpfel"));
        assert!(other.is("ORIGIN", "feature/ÄPFEL"));
    }

    #[test]
    fn test_inherit_keeps_identity() {
        let release = RemoteBranchRecord::new("origin", "release/2.3")
            .with_result(BuildResult::Success)
            .with_build_version("2.3.1-SNAPSHOT")
            .with_base_release_version("2.3")
            .with_release("2.3", "abc123");

        let hotfix = RemoteBranchRecord::new("origin", "hotfix/2.3").inherit_from(&release);
        assert_eq!(hotfix.branch_name, "hotfix/2.3");
        assert_eq!(hotfix.last_build_result, BuildResult::Success);
        assert_eq!(hotfix.last_build_version.as_deref(), Some("2.3.1-SNAPSHOT"));
        assert_eq!(hotfix.base_release_version.as_deref(), Some("2.3"));
        assert_eq!(hotfix.last_release_version_commit.as_deref(), Some("abc123"));
    }
}

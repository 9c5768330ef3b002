use crate::config::BranchesConfig;
use crate::error::{GitflowError, Result};
use std::fmt;

/// Role a branch plays in the gitflow branching model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BranchType {
    Master,
    Develop,
    Release,
    Hotfix,
    Feature,
    Unknown,
}

impl BranchType {
    /// Name exported to the build as `GIT_BRANCH_TYPE`
    pub fn name(&self) -> &'static str {
        match self {
            BranchType::Master => "master",
            BranchType::Develop => "develop",
            BranchType::Release => "release",
            BranchType::Hotfix => "hotfix",
            BranchType::Feature => "feature",
            BranchType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A branch as seen through a remote, e.g. `origin/release/2.3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranchName {
    pub remote_alias: String,
    pub branch_name: String,
}

impl RemoteBranchName {
    pub fn new(remote_alias: impl Into<String>, branch_name: impl Into<String>) -> Self {
        RemoteBranchName {
            remote_alias: remote_alias.into(),
            branch_name: branch_name.into(),
        }
    }

    /// Split a `<remote>/<branch>` reference as reported by the build host
    ///
    /// Leading `refs/remotes/` is accepted. The remote alias must be one of
    /// `known_remotes` when that list is non-empty; otherwise the first path
    /// segment is taken as the alias.
    pub fn parse(reference: &str, known_remotes: &[String]) -> Result<Self> {
        let reference = reference
            .trim()
            .trim_start_matches("refs/remotes/");

        for remote in known_remotes {
            if let Some(branch) = reference
                .strip_prefix(remote.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
            {
                if !branch.is_empty() {
                    return Ok(RemoteBranchName::new(remote.clone(), branch));
                }
            }
        }

        match reference.split_once('/') {
            Some((remote, branch)) if !remote.is_empty() && !branch.is_empty() => {
                if known_remotes.is_empty() {
                    Ok(RemoteBranchName::new(remote, branch))
                } else {
                    Err(GitflowError::configuration(format!(
                        "Branch '{}' does not belong to a known remote ({})",
                        reference,
                        known_remotes.join(", ")
                    )))
                }
            }
            _ => Err(GitflowError::configuration(format!(
                "Cannot determine remote for branch '{}' - expected <remote>/<branch>",
                reference
            ))),
        }
    }
}

impl fmt::Display for RemoteBranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote_alias, self.branch_name)
    }
}

/// Naming policy that classifies branches and derives gitflow branch names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPolicy {
    pub master: String,
    pub develop: String,
    pub release_prefix: String,
    pub hotfix_prefix: String,
    pub feature_prefix: String,
}

impl BranchPolicy {
    pub fn from_config(config: &BranchesConfig) -> Self {
        BranchPolicy {
            master: config.master.clone(),
            develop: config.develop.clone(),
            release_prefix: config.release_prefix.clone(),
            hotfix_prefix: config.hotfix_prefix.clone(),
            feature_prefix: config.feature_prefix.clone(),
        }
    }

    /// Classify a simple (remote-less) branch name
    pub fn classify(&self, branch_name: &str) -> BranchType {
        if branch_name == self.master {
            BranchType::Master
        } else if branch_name == self.develop {
            BranchType::Develop
        } else if has_prefix(branch_name, &self.release_prefix) {
            BranchType::Release
        } else if has_prefix(branch_name, &self.hotfix_prefix) {
            BranchType::Hotfix
        } else if has_prefix(branch_name, &self.feature_prefix) {
            BranchType::Feature
        } else {
            BranchType::Unknown
        }
    }

    /// Release branch for a release version, e.g. "2.3" -> "release/2.3"
    pub fn release_branch(&self, release_version: &str) -> String {
        format!("{}{}", self.release_prefix, release_version)
    }

    /// Hotfix branch for a hotfix version, e.g. "2.3" -> "hotfix/2.3"
    pub fn hotfix_branch(&self, hotfix_version: &str) -> String {
        format!("{}{}", self.hotfix_prefix, hotfix_version)
    }

    /// Hotfix branch that follows a release branch, e.g. "release/2.3" -> "hotfix/2.3"
    pub fn hotfix_branch_for_release(&self, release_branch: &str) -> Result<String> {
        let version = self.branch_version(release_branch, BranchType::Release)?;
        Ok(self.hotfix_branch(version))
    }

    /// Version part of a release or hotfix branch name
    pub fn branch_version<'a>(&self, branch_name: &'a str, expected: BranchType) -> Result<&'a str> {
        let prefix = match expected {
            BranchType::Release => &self.release_prefix,
            BranchType::Hotfix => &self.hotfix_prefix,
            other => {
                return Err(GitflowError::configuration(format!(
                    "Branches of type '{}' carry no version",
                    other
                )))
            }
        };
        self.require(branch_name, expected)?;
        Ok(&branch_name[prefix.len()..])
    }

    /// Fail unless the branch is classified as `expected`
    pub fn require(&self, branch_name: &str, expected: BranchType) -> Result<()> {
        let actual = self.classify(branch_name);
        if actual == expected {
            Ok(())
        } else {
            Err(GitflowError::configuration(format!(
                "Branch '{}' is a {} branch, expected a {} branch",
                branch_name, actual, expected
            )))
        }
    }
}

impl Default for BranchPolicy {
    fn default() -> Self {
        BranchPolicy::from_config(&BranchesConfig::default())
    }
}

fn has_prefix(branch_name: &str, prefix: &str) -> bool {
    !prefix.is_empty() && branch_name.len() > prefix.len() && branch_name.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_default_policy() {
        let policy = BranchPolicy::default();
        assert_eq!(policy.classify("master"), BranchType::Master);
        assert_eq!(policy.classify("develop"), BranchType::Develop);
        assert_eq!(policy.classify("release/2.3"), BranchType::Release);
        assert_eq!(policy.classify("hotfix/1.0"), BranchType::Hotfix);
        assert_eq!(policy.classify("feature/login"), BranchType::Feature);
        assert_eq!(policy.classify("main"), BranchType::Unknown);
        assert_eq!(policy.classify("release/"), BranchType::Unknown);
    }

    #[test]
    fn test_branch_names() {
        let policy = BranchPolicy::default();
        assert_eq!(policy.release_branch("2.3"), "release/2.3");
        assert_eq!(policy.hotfix_branch("1.0"), "hotfix/1.0");
        assert_eq!(
            policy.hotfix_branch_for_release("release/2.3").unwrap(),
            "hotfix/2.3"
        );
    }

    #[test]
    fn test_require_rejects_wrong_type() {
        let policy = BranchPolicy::default();
        assert!(policy.require("release/2.3", BranchType::Release).is_ok());
        let err = policy
            .require("hotfix/2.3", BranchType::Release)
            .unwrap_err();
        assert!(err.to_string().contains("expected a release branch"));
    }

    #[test]
    fn test_remote_branch_name_parse() {
        let remotes = vec!["origin".to_string()];
        let name = RemoteBranchName::parse("origin/release/2.3", &remotes).unwrap();
        assert_eq!(name.remote_alias, "origin");
        assert_eq!(name.branch_name, "release/2.3");
        assert_eq!(name.to_string(), "origin/release/2.3");

        let name = RemoteBranchName::parse("refs/remotes/origin/develop", &[]).unwrap();
        assert_eq!(name, RemoteBranchName::new("origin", "develop"));
    }

    #[test]
    fn test_remote_branch_name_parse_errors() {
        let remotes = vec!["origin".to_string()];
        assert!(RemoteBranchName::parse("develop", &remotes).is_err());
        assert!(RemoteBranchName::parse("upstream/develop", &remotes).is_err());
    }
}

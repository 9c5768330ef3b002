//! What triggered a build
//!
//! A [WorkflowCause] names one gitflow action together with exactly the
//! parameters that action needs. Every variant can be filled in from the
//! branch registry, so callers usually only pick the branch and override
//! the versions they want to change.

use crate::domain::version::is_newer;
use crate::domain::{next_minor, next_patch, strip_snapshot, BranchPolicy, BranchType, VersionNumber};
use crate::error::{GitflowError, Result};
use crate::registry::{BranchRegistry, RemoteBranchRecord};
use std::fmt;

/// Cut a release branch off develop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRelease {
    pub release_version: String,
    pub next_patch_development_version: String,
    pub next_development_version: String,
    pub dry_run: bool,
}

/// Build a patch release from a release branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRelease {
    pub release_branch: String,
    pub patch_release_version: String,
    pub next_patch_development_version: String,
    pub dry_run: bool,
}

/// Merge a release branch's last patch release into master
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRelease {
    pub release_branch: String,
    pub last_patch_release_version: String,
    pub last_patch_release_commit: String,
    pub dry_run: bool,
}

/// Delete a release branch, optionally continuing it as a hotfix branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishRelease {
    pub release_branch: String,
    pub include_followup_action: bool,
    pub dry_run: bool,
}

/// Cut a hotfix branch off master
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartHotfix {
    pub hotfix_version: String,
    pub next_patch_development_version: String,
    pub dry_run: bool,
}

/// Build a patch release from a hotfix branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestHotfix {
    pub hotfix_branch: String,
    pub patch_release_version: String,
    pub next_patch_development_version: String,
    pub dry_run: bool,
}

/// Merge a hotfix branch's last patch release into master, and optionally
/// into develop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishHotfix {
    pub hotfix_branch: String,
    pub last_patch_release_version: String,
    pub last_patch_release_commit: String,
    pub merge_to_develop: bool,
    pub include_followup_action: bool,
    pub dry_run: bool,
}

/// Delete a hotfix branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishHotfix {
    pub hotfix_branch: String,
    pub dry_run: bool,
}

/// The closed set of gitflow actions a build can perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowCause {
    /// Plain build of whatever branch the host checked out
    NoAction,
    StartRelease(StartRelease),
    TestRelease(TestRelease),
    PublishRelease(PublishRelease),
    FinishRelease(FinishRelease),
    StartHotfix(StartHotfix),
    TestHotfix(TestHotfix),
    PublishHotfix(PublishHotfix),
    FinishHotfix(FinishHotfix),
}

impl WorkflowCause {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowCause::NoAction => "no-action",
            WorkflowCause::StartRelease(_) => "start-release",
            WorkflowCause::TestRelease(_) => "test-release",
            WorkflowCause::PublishRelease(_) => "publish-release",
            WorkflowCause::FinishRelease(_) => "finish-release",
            WorkflowCause::StartHotfix(_) => "start-hotfix",
            WorkflowCause::TestHotfix(_) => "test-hotfix",
            WorkflowCause::PublishHotfix(_) => "publish-hotfix",
            WorkflowCause::FinishHotfix(_) => "finish-hotfix",
        }
    }

    pub fn is_dry_run(&self) -> bool {
        match self {
            WorkflowCause::NoAction => false,
            WorkflowCause::StartRelease(c) => c.dry_run,
            WorkflowCause::TestRelease(c) => c.dry_run,
            WorkflowCause::PublishRelease(c) => c.dry_run,
            WorkflowCause::FinishRelease(c) => c.dry_run,
            WorkflowCause::StartHotfix(c) => c.dry_run,
            WorkflowCause::TestHotfix(c) => c.dry_run,
            WorkflowCause::PublishHotfix(c) => c.dry_run,
            WorkflowCause::FinishHotfix(c) => c.dry_run,
        }
    }

    /// Set the dry-run flag; a plain build has none and ignores it
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        match &mut self {
            WorkflowCause::NoAction => {}
            WorkflowCause::StartRelease(c) => c.dry_run = dry_run,
            WorkflowCause::TestRelease(c) => c.dry_run = dry_run,
            WorkflowCause::PublishRelease(c) => c.dry_run = dry_run,
            WorkflowCause::FinishRelease(c) => c.dry_run = dry_run,
            WorkflowCause::StartHotfix(c) => c.dry_run = dry_run,
            WorkflowCause::TestHotfix(c) => c.dry_run = dry_run,
            WorkflowCause::PublishHotfix(c) => c.dry_run = dry_run,
            WorkflowCause::FinishHotfix(c) => c.dry_run = dry_run,
        }
        self
    }

    /// Version shown on the build badge
    pub fn display_version(&self) -> Option<&str> {
        match self {
            WorkflowCause::NoAction => None,
            WorkflowCause::StartRelease(c) => Some(&c.release_version),
            WorkflowCause::TestRelease(c) => Some(&c.patch_release_version),
            WorkflowCause::PublishRelease(c) => Some(&c.last_patch_release_version),
            WorkflowCause::FinishRelease(_) => None,
            WorkflowCause::StartHotfix(c) => Some(&c.hotfix_version),
            WorkflowCause::TestHotfix(c) => Some(&c.patch_release_version),
            WorkflowCause::PublishHotfix(c) => Some(&c.last_patch_release_version),
            WorkflowCause::FinishHotfix(_) => None,
        }
    }

    /// Branch the action works on, if it names one
    pub fn branch(&self, policy: &BranchPolicy) -> Option<String> {
        match self {
            WorkflowCause::NoAction => None,
            WorkflowCause::StartRelease(c) => Some(policy.release_branch(&c.release_version)),
            WorkflowCause::TestRelease(c) => Some(c.release_branch.clone()),
            WorkflowCause::PublishRelease(c) => Some(c.release_branch.clone()),
            WorkflowCause::FinishRelease(c) => Some(c.release_branch.clone()),
            WorkflowCause::StartHotfix(c) => Some(policy.hotfix_branch(&c.hotfix_version)),
            WorkflowCause::TestHotfix(c) => Some(c.hotfix_branch.clone()),
            WorkflowCause::PublishHotfix(c) => Some(c.hotfix_branch.clone()),
            WorkflowCause::FinishHotfix(c) => Some(c.hotfix_branch.clone()),
        }
    }

    /// Check every field before anything touches the repository
    pub fn validate(&self, policy: &BranchPolicy) -> Result<()> {
        match self {
            WorkflowCause::NoAction => Ok(()),
            WorkflowCause::StartRelease(c) => {
                release_version("release version", &c.release_version)?;
                policy.require(&policy.release_branch(&c.release_version), BranchType::Release)?;
                newer_snapshot(
                    "next patch development version",
                    &c.next_patch_development_version,
                    &c.release_version,
                )?;
                newer_snapshot(
                    "next development version",
                    &c.next_development_version,
                    &c.release_version,
                )
            }
            WorkflowCause::TestRelease(c) => {
                policy.require(&c.release_branch, BranchType::Release)?;
                release_version("patch release version", &c.patch_release_version)?;
                newer_snapshot(
                    "next patch development version",
                    &c.next_patch_development_version,
                    &c.patch_release_version,
                )
            }
            WorkflowCause::PublishRelease(c) => {
                policy.require(&c.release_branch, BranchType::Release)?;
                release_version("last patch release version", &c.last_patch_release_version)?;
                present("last patch release commit", &c.last_patch_release_commit)
            }
            WorkflowCause::FinishRelease(c) => policy.require(&c.release_branch, BranchType::Release),
            WorkflowCause::StartHotfix(c) => {
                release_version("hotfix version", &c.hotfix_version)?;
                policy.require(&policy.hotfix_branch(&c.hotfix_version), BranchType::Hotfix)?;
                newer_snapshot(
                    "next patch development version",
                    &c.next_patch_development_version,
                    &c.hotfix_version,
                )
            }
            WorkflowCause::TestHotfix(c) => {
                policy.require(&c.hotfix_branch, BranchType::Hotfix)?;
                release_version("patch release version", &c.patch_release_version)?;
                newer_snapshot(
                    "next patch development version",
                    &c.next_patch_development_version,
                    &c.patch_release_version,
                )
            }
            WorkflowCause::PublishHotfix(c) => {
                policy.require(&c.hotfix_branch, BranchType::Hotfix)?;
                release_version("last patch release version", &c.last_patch_release_version)?;
                present("last patch release commit", &c.last_patch_release_commit)
            }
            WorkflowCause::FinishHotfix(c) => policy.require(&c.hotfix_branch, BranchType::Hotfix),
        }
    }
}

impl fmt::Display for WorkflowCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if let Some(version) = self.display_version() {
            write!(f, " {}", version)?;
        }
        Ok(())
    }
}

impl StartRelease {
    /// Release the version develop is currently building
    pub fn from_registry(
        registry: &BranchRegistry,
        policy: &BranchPolicy,
        remote_alias: &str,
    ) -> Result<Self> {
        let develop = tracked(registry, remote_alias, &policy.develop)?;
        let current = last_build_version(develop)?;
        let release_version = strip_snapshot(current);
        Ok(StartRelease {
            next_patch_development_version: next_patch(&release_version)?,
            next_development_version: next_minor(current)?,
            release_version,
            dry_run: false,
        })
    }
}

impl TestRelease {
    pub fn from_registry(registry: &BranchRegistry, remote_alias: &str, release_branch: &str) -> Result<Self> {
        let (patch_release_version, next_patch_development_version) =
            patch_versions(tracked(registry, remote_alias, release_branch)?)?;
        Ok(TestRelease {
            release_branch: release_branch.to_string(),
            patch_release_version,
            next_patch_development_version,
            dry_run: false,
        })
    }
}

impl PublishRelease {
    pub fn from_registry(registry: &BranchRegistry, remote_alias: &str, release_branch: &str) -> Result<Self> {
        let (last_patch_release_version, last_patch_release_commit) =
            last_release(tracked(registry, remote_alias, release_branch)?)?;
        Ok(PublishRelease {
            release_branch: release_branch.to_string(),
            last_patch_release_version,
            last_patch_release_commit,
            dry_run: false,
        })
    }
}

impl FinishRelease {
    pub fn new(release_branch: impl Into<String>) -> Self {
        FinishRelease {
            release_branch: release_branch.into(),
            include_followup_action: false,
            dry_run: false,
        }
    }
}

impl StartHotfix {
    /// Hotfix the release master currently carries
    pub fn from_registry(
        registry: &BranchRegistry,
        policy: &BranchPolicy,
        remote_alias: &str,
    ) -> Result<Self> {
        let master = tracked(registry, remote_alias, &policy.master)?;
        let last_release = master.last_release_version.as_deref().ok_or_else(|| {
            GitflowError::configuration(format!(
                "Branch {} has no recorded release version",
                master.display_name()
            ))
        })?;
        let hotfix_version = master
            .base_release_version
            .clone()
            .unwrap_or_else(|| last_release.to_string());
        Ok(StartHotfix {
            next_patch_development_version: next_patch(last_release)?,
            hotfix_version,
            dry_run: false,
        })
    }
}

impl TestHotfix {
    pub fn from_registry(registry: &BranchRegistry, remote_alias: &str, hotfix_branch: &str) -> Result<Self> {
        let (patch_release_version, next_patch_development_version) =
            patch_versions(tracked(registry, remote_alias, hotfix_branch)?)?;
        Ok(TestHotfix {
            hotfix_branch: hotfix_branch.to_string(),
            patch_release_version,
            next_patch_development_version,
            dry_run: false,
        })
    }
}

impl PublishHotfix {
    /// Merges into develop as well; the hotfix branch is kept
    pub fn from_registry(registry: &BranchRegistry, remote_alias: &str, hotfix_branch: &str) -> Result<Self> {
        let (last_patch_release_version, last_patch_release_commit) =
            last_release(tracked(registry, remote_alias, hotfix_branch)?)?;
        Ok(PublishHotfix {
            hotfix_branch: hotfix_branch.to_string(),
            last_patch_release_version,
            last_patch_release_commit,
            merge_to_develop: true,
            include_followup_action: false,
            dry_run: false,
        })
    }
}

impl FinishHotfix {
    pub fn new(hotfix_branch: impl Into<String>) -> Self {
        FinishHotfix {
            hotfix_branch: hotfix_branch.into(),
            dry_run: false,
        }
    }
}

fn tracked<'a>(
    registry: &'a BranchRegistry,
    remote_alias: &str,
    branch_name: &str,
) -> Result<&'a RemoteBranchRecord> {
    registry.get(remote_alias, branch_name).ok_or_else(|| {
        GitflowError::configuration(format!(
            "Branch {}/{} has never been built",
            remote_alias, branch_name
        ))
    })
}

fn last_build_version(record: &RemoteBranchRecord) -> Result<&str> {
    record.last_build_version.as_deref().ok_or_else(|| {
        GitflowError::configuration(format!(
            "Branch {} has no recorded build version",
            record.display_name()
        ))
    })
}

// (patch release version, next patch development version) of a branch
fn patch_versions(record: &RemoteBranchRecord) -> Result<(String, String)> {
    let current = last_build_version(record)?;
    Ok((strip_snapshot(current), next_patch(current)?))
}

fn last_release(record: &RemoteBranchRecord) -> Result<(String, String)> {
    match (
        &record.last_release_version,
        &record.last_release_version_commit,
    ) {
        (Some(version), Some(commit)) => Ok((version.clone(), commit.clone())),
        _ => Err(GitflowError::configuration(format!(
            "Branch {} has not produced a release yet",
            record.display_name()
        ))),
    }
}

fn release_version(field: &str, value: &str) -> Result<()> {
    present(field, value)?;
    let version = VersionNumber::parse(value)?;
    if version.snapshot {
        return Err(GitflowError::configuration(format!(
            "The {} must not be a development version: {}",
            field, value
        )));
    }
    Ok(())
}

fn newer_snapshot(field: &str, value: &str, baseline: &str) -> Result<()> {
    present(field, value)?;
    if !VersionNumber::parse(value)?.snapshot {
        return Err(GitflowError::configuration(format!(
            "The {} must be a development version: {}",
            field, value
        )));
    }
    if !is_newer(value, baseline)? {
        return Err(GitflowError::configuration(format!(
            "The {} {} is not newer than {}",
            field, value, baseline
        )));
    }
    Ok(())
}

fn present(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GitflowError::configuration(format!("The {} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildResult;

    fn registry_with(branch: &str, build_version: &str) -> BranchRegistry {
        let mut registry = BranchRegistry::new();
        let record = registry
            .get_or_add("origin", branch)
            .with_result(BuildResult::Success)
            .with_build_version(build_version);
        registry.put(record);
        registry
    }

    #[test]
    fn test_start_release_defaults_from_develop() {
        let registry = registry_with("develop", "2.3-SNAPSHOT");
        let policy = BranchPolicy::default();
        let cause = StartRelease::from_registry(&registry, &policy, "origin").unwrap();

        assert_eq!(cause.release_version, "2.3");
        assert_eq!(cause.next_patch_development_version, "2.3.1-SNAPSHOT");
        assert_eq!(cause.next_development_version, "2.4-SNAPSHOT");

        let cause = WorkflowCause::StartRelease(cause);
        assert_eq!(cause.branch(&policy).as_deref(), Some("release/2.3"));
        assert!(cause.validate(&policy).is_ok());
    }

    #[test]
    fn test_test_hotfix_defaults_from_branch() {
        let registry = registry_with("hotfix/1.0", "1.0.2-SNAPSHOT");
        let cause = TestHotfix::from_registry(&registry, "origin", "hotfix/1.0").unwrap();
        assert_eq!(cause.patch_release_version, "1.0.2");
        assert_eq!(cause.next_patch_development_version, "1.0.3-SNAPSHOT");
    }

    #[test]
    fn test_defaults_need_registry_data() {
        let registry = BranchRegistry::new();
        let policy = BranchPolicy::default();
        assert!(matches!(
            StartRelease::from_registry(&registry, &policy, "origin"),
            Err(GitflowError::Configuration(_))
        ));

        let registry = registry_with("release/2.3", "2.3.1-SNAPSHOT");
        assert!(matches!(
            PublishRelease::from_registry(&registry, "origin", "release/2.3"),
            Err(GitflowError::Configuration(_))
        ));
    }

    #[test]
    fn test_start_hotfix_prefers_base_release_version() {
        let mut registry = BranchRegistry::new();
        let master = registry
            .get_or_add("origin", "master")
            .with_release("2.3.2", "abc")
            .with_base_release_version("2.3");
        registry.put(master);

        let cause =
            StartHotfix::from_registry(&registry, &BranchPolicy::default(), "origin").unwrap();
        assert_eq!(cause.hotfix_version, "2.3");
        assert_eq!(cause.next_patch_development_version, "2.3.3-SNAPSHOT");
    }

    #[test]
    fn test_validate_rejects_wrong_branch_type() {
        let policy = BranchPolicy::default();
        let cause = WorkflowCause::TestRelease(TestRelease {
            release_branch: "hotfix/1.0".to_string(),
            patch_release_version: "1.0.1".to_string(),
            next_patch_development_version: "1.0.2-SNAPSHOT".to_string(),
            dry_run: false,
        });
        assert!(matches!(
            cause.validate(&policy),
            Err(GitflowError::Configuration(_))
        ));

        let cause = WorkflowCause::FinishHotfix(FinishHotfix::new("release/1.0"));
        assert!(cause.validate(&policy).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_versions() {
        let policy = BranchPolicy::default();
        let snapshot_release = WorkflowCause::StartRelease(StartRelease {
            release_version: "2.3-SNAPSHOT".to_string(),
            next_patch_development_version: "2.3.1-SNAPSHOT".to_string(),
            next_development_version: "2.4-SNAPSHOT".to_string(),
            dry_run: false,
        });
        assert!(snapshot_release.validate(&policy).is_err());

        let older_next = WorkflowCause::StartHotfix(StartHotfix {
            hotfix_version: "2.3".to_string(),
            next_patch_development_version: "2.2.1-SNAPSHOT".to_string(),
            dry_run: false,
        });
        assert!(older_next.validate(&policy).is_err());

        let missing_commit = WorkflowCause::PublishHotfix(PublishHotfix {
            hotfix_branch: "hotfix/1.0".to_string(),
            last_patch_release_version: "1.0.2".to_string(),
            last_patch_release_commit: " ".to_string(),
            merge_to_develop: true,
            include_followup_action: false,
            dry_run: false,
        });
        assert!(missing_commit.validate(&policy).is_err());
    }

    #[test]
    fn test_dry_run_and_display() {
        let cause = WorkflowCause::FinishRelease(FinishRelease::new("release/2.3")).with_dry_run(true);
        assert!(cause.is_dry_run());
        assert_eq!(cause.to_string(), "finish-release");

        let cause = WorkflowCause::NoAction.with_dry_run(true);
        assert!(!cause.is_dry_run());
    }
}

//! Main workflow orchestration logic
//!
//! Turns a parsed command into a [WorkflowCause] and runs it. Values left
//! out on the command line are filled in from the branch registry, the way
//! a build form would pre-fill them. Kept free of clap so the workflow can
//! be driven programmatically.

use crate::cause::{
    FinishHotfix, FinishRelease, PublishHotfix, PublishRelease, StartHotfix, StartRelease,
    TestHotfix, TestRelease, WorkflowCause,
};
use crate::config::Config;
use crate::domain::{next_minor, next_patch, BranchPolicy};
use crate::engine::{BuildRunner, BuildSummary};
use crate::error::Result;
use crate::git::VcsClient;
use crate::host::BuildHost;
use crate::registry::BranchRegistry;
use crate::updater::ProjectVersionUpdater;

/// One workflow action with optional overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowCommand {
    Build,
    StartRelease {
        release_version: Option<String>,
        next_patch_development_version: Option<String>,
        next_development_version: Option<String>,
    },
    TestRelease {
        branch: String,
        patch_release_version: Option<String>,
        next_patch_development_version: Option<String>,
    },
    PublishRelease {
        branch: String,
        version: Option<String>,
        commit: Option<String>,
    },
    FinishRelease {
        branch: String,
        start_hotfix: bool,
    },
    StartHotfix {
        hotfix_version: Option<String>,
        next_patch_development_version: Option<String>,
    },
    TestHotfix {
        branch: String,
        patch_release_version: Option<String>,
        next_patch_development_version: Option<String>,
    },
    PublishHotfix {
        branch: String,
        version: Option<String>,
        commit: Option<String>,
        skip_develop: bool,
        finish: bool,
    },
    FinishHotfix {
        branch: String,
    },
}

/// Arguments for the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowArgs {
    pub command: WorkflowCommand,

    /// Leave the remote and the registry untouched
    pub dry_run: bool,
}

/// Build the cause for a command, taking missing values from the registry
pub fn resolve_cause(
    command: &WorkflowCommand,
    registry: &BranchRegistry,
    config: &Config,
) -> Result<WorkflowCause> {
    let policy = BranchPolicy::from_config(&config.branches);
    let remote = config.remote.alias.as_str();

    let cause = match command {
        WorkflowCommand::Build => WorkflowCause::NoAction,
        WorkflowCommand::StartRelease {
            release_version,
            next_patch_development_version,
            next_development_version,
        } => {
            let defaults = match release_version {
                Some(version) => StartRelease {
                    release_version: version.clone(),
                    next_patch_development_version: next_patch(version)?,
                    next_development_version: next_minor(version)?,
                    dry_run: false,
                },
                None => StartRelease::from_registry(registry, &policy, remote)?,
            };
            WorkflowCause::StartRelease(StartRelease {
                next_patch_development_version: next_patch_development_version
                    .clone()
                    .unwrap_or(defaults.next_patch_development_version),
                next_development_version: next_development_version
                    .clone()
                    .unwrap_or(defaults.next_development_version),
                ..defaults
            })
        }
        WorkflowCommand::TestRelease {
            branch,
            patch_release_version,
            next_patch_development_version,
        } => {
            let defaults = match patch_release_version {
                Some(version) => TestRelease {
                    release_branch: branch.clone(),
                    patch_release_version: version.clone(),
                    next_patch_development_version: next_patch(version)?,
                    dry_run: false,
                },
                None => TestRelease::from_registry(registry, remote, branch)?,
            };
            WorkflowCause::TestRelease(TestRelease {
                next_patch_development_version: next_patch_development_version
                    .clone()
                    .unwrap_or(defaults.next_patch_development_version),
                ..defaults
            })
        }
        WorkflowCommand::PublishRelease {
            branch,
            version,
            commit,
        } => {
            let defaults = match (version, commit) {
                (Some(version), Some(commit)) => PublishRelease {
                    release_branch: branch.clone(),
                    last_patch_release_version: version.clone(),
                    last_patch_release_commit: commit.clone(),
                    dry_run: false,
                },
                _ => PublishRelease::from_registry(registry, remote, branch)?,
            };
            WorkflowCause::PublishRelease(PublishRelease {
                last_patch_release_version: version
                    .clone()
                    .unwrap_or(defaults.last_patch_release_version),
                last_patch_release_commit: commit
                    .clone()
                    .unwrap_or(defaults.last_patch_release_commit),
                ..defaults
            })
        }
        WorkflowCommand::FinishRelease {
            branch,
            start_hotfix,
        } => WorkflowCause::FinishRelease(FinishRelease {
            include_followup_action: *start_hotfix,
            ..FinishRelease::new(branch.clone())
        }),
        WorkflowCommand::StartHotfix {
            hotfix_version,
            next_patch_development_version,
        } => {
            let defaults = match hotfix_version {
                Some(version) => StartHotfix {
                    hotfix_version: version.clone(),
                    next_patch_development_version: next_patch(version)?,
                    dry_run: false,
                },
                None => StartHotfix::from_registry(registry, &policy, remote)?,
            };
            WorkflowCause::StartHotfix(StartHotfix {
                next_patch_development_version: next_patch_development_version
                    .clone()
                    .unwrap_or(defaults.next_patch_development_version),
                ..defaults
            })
        }
        WorkflowCommand::TestHotfix {
            branch,
            patch_release_version,
            next_patch_development_version,
        } => {
            let defaults = match patch_release_version {
                Some(version) => TestHotfix {
                    hotfix_branch: branch.clone(),
                    patch_release_version: version.clone(),
                    next_patch_development_version: next_patch(version)?,
                    dry_run: false,
                },
                None => TestHotfix::from_registry(registry, remote, branch)?,
            };
            WorkflowCause::TestHotfix(TestHotfix {
                next_patch_development_version: next_patch_development_version
                    .clone()
                    .unwrap_or(defaults.next_patch_development_version),
                ..defaults
            })
        }
        WorkflowCommand::PublishHotfix {
            branch,
            version,
            commit,
            skip_develop,
            finish,
        } => {
            let defaults = match (version, commit) {
                (Some(version), Some(commit)) => PublishHotfix {
                    hotfix_branch: branch.clone(),
                    last_patch_release_version: version.clone(),
                    last_patch_release_commit: commit.clone(),
                    merge_to_develop: true,
                    include_followup_action: false,
                    dry_run: false,
                },
                _ => PublishHotfix::from_registry(registry, remote, branch)?,
            };
            WorkflowCause::PublishHotfix(PublishHotfix {
                last_patch_release_version: version
                    .clone()
                    .unwrap_or(defaults.last_patch_release_version),
                last_patch_release_commit: commit
                    .clone()
                    .unwrap_or(defaults.last_patch_release_commit),
                merge_to_develop: !skip_develop,
                include_followup_action: *finish,
                ..defaults
            })
        }
        WorkflowCommand::FinishHotfix { branch } => {
            WorkflowCause::FinishHotfix(FinishHotfix::new(branch.clone()))
        }
    };

    Ok(cause)
}

/// Main workflow
///
/// 1. Load the registry this build will start from
/// 2. Resolve the cause, filling gaps from the registry
/// 3. Run the build
pub fn run_workflow(
    args: &WorkflowArgs,
    config: &Config,
    vcs: &mut dyn VcsClient,
    updater: &mut dyn ProjectVersionUpdater,
    host: &mut dyn BuildHost,
) -> Result<BuildSummary> {
    let runner = BuildRunner::new(config);
    let (registry, _) = runner.initial_registry(host, vcs)?;
    let cause = resolve_cause(&args.command, &registry, config)?.with_dry_run(args.dry_run);
    runner.run(cause, vcs, updater, host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildResult;
    use crate::error::GitflowError;

    fn registry() -> BranchRegistry {
        let mut registry = BranchRegistry::new();
        let develop = registry
            .get_or_add("origin", "develop")
            .with_result(BuildResult::Success)
            .with_build_version("2.3-SNAPSHOT");
        registry.put(develop);
        let hotfix = registry
            .get_or_add("origin", "hotfix/1.0")
            .with_result(BuildResult::Success)
            .with_build_version("1.0.3-SNAPSHOT")
            .with_release("1.0.2", "abc123");
        registry.put(hotfix);
        registry
    }

    #[test]
    fn test_start_release_from_registry() {
        let command = WorkflowCommand::StartRelease {
            release_version: None,
            next_patch_development_version: None,
            next_development_version: None,
        };
        let cause = resolve_cause(&command, &registry(), &Config::default()).unwrap();
        assert_eq!(
            cause,
            WorkflowCause::StartRelease(StartRelease {
                release_version: "2.3".to_string(),
                next_patch_development_version: "2.3.1-SNAPSHOT".to_string(),
                next_development_version: "2.4-SNAPSHOT".to_string(),
                dry_run: false,
            })
        );
    }

    #[test]
    fn test_overrides_win() {
        let command = WorkflowCommand::StartRelease {
            release_version: Some("3.0".to_string()),
            next_patch_development_version: None,
            next_development_version: Some("3.1.0-SNAPSHOT".to_string()),
        };
        let cause = resolve_cause(&command, &BranchRegistry::new(), &Config::default()).unwrap();
        match cause {
            WorkflowCause::StartRelease(c) => {
                assert_eq!(c.release_version, "3.0");
                assert_eq!(c.next_patch_development_version, "3.0.1-SNAPSHOT");
                assert_eq!(c.next_development_version, "3.1.0-SNAPSHOT");
            }
            other => panic!("unexpected cause {:?}", other),
        }
    }

    #[test]
    fn test_publish_hotfix_from_registry() {
        let command = WorkflowCommand::PublishHotfix {
            branch: "hotfix/1.0".to_string(),
            version: None,
            commit: None,
            skip_develop: true,
            finish: true,
        };
        let cause = resolve_cause(&command, &registry(), &Config::default()).unwrap();
        assert_eq!(
            cause,
            WorkflowCause::PublishHotfix(PublishHotfix {
                hotfix_branch: "hotfix/1.0".to_string(),
                last_patch_release_version: "1.0.2".to_string(),
                last_patch_release_commit: "abc123".to_string(),
                merge_to_develop: false,
                include_followup_action: true,
                dry_run: false,
            })
        );
    }

    #[test]
    fn test_unknown_branch_needs_explicit_values() {
        let command = WorkflowCommand::TestRelease {
            branch: "release/9.9".to_string(),
            patch_release_version: None,
            next_patch_development_version: None,
        };
        assert!(matches!(
            resolve_cause(&command, &registry(), &Config::default()),
            Err(GitflowError::Configuration(_))
        ));
    }
}

//! One build, start to finish
//!
//! [BuildRunner] wires the pieces together for a single build:
//!
//! 1. validate the cause and pick the action
//! 2. inherit the previous build's registry and drop branches that are
//!    gone upstream
//! 3. run the action's `before` phase
//! 4. run the main build unless the action omitted it
//! 5. run the action's `after` phase
//! 6. downgrade the result if tracked branches are broken
//! 7. attach the registry to the build

use crate::action::{dispatch, ActionContext};
use crate::cause::WorkflowCause;
use crate::config::Config;
use crate::domain::BuildResult;
use crate::error::Result;
use crate::escalation::escalate;
use crate::git::{DryRunGate, VcsClient};
use crate::host::BuildHost;
use crate::registry::{BranchRegistry, RemoteBranchRecord};
use crate::updater::ProjectVersionUpdater;
use crate::warning::WorkflowWarning;
use std::fmt;
use tracing::{debug, info};

/// What a build did, for the badge shown to users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub action: &'static str,
    pub version: Option<String>,
    pub dry_run: bool,
    pub release_build: bool,
    pub main_build_omitted: bool,
    pub result: BuildResult,
    pub warnings: Vec<WorkflowWarning>,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action)?;
        if let Some(version) = &self.version {
            write!(f, " {}", version)?;
        }
        if self.dry_run {
            f.write_str(" (dry run)")?;
        }
        Ok(())
    }
}

/// Drives builds against a fixed configuration
pub struct BuildRunner<'a> {
    config: &'a Config,
}

impl<'a> BuildRunner<'a> {
    pub fn new(config: &'a Config) -> Self {
        BuildRunner { config }
    }

    /// Registry a new build starts from
    ///
    /// A copy of the nearest earlier registry, without the records of
    /// branches the remote no longer has. Records of other remotes are
    /// kept as they are.
    ///
    /// Returns the registry and the records that were dropped.
    pub fn initial_registry(
        &self,
        host: &dyn BuildHost,
        vcs: &dyn VcsClient,
    ) -> Result<(BranchRegistry, Vec<RemoteBranchRecord>)> {
        let Some(previous) = host.previous_build_registry()? else {
            debug!("no earlier registry, starting empty");
            return Ok((BranchRegistry::new(), Vec::new()));
        };

        let mut registry = BranchRegistry::inherit(&previous);
        let remote = &self.config.remote.alias;
        let upstream = vcs.remote_branches(remote)?;
        let pruned = registry.prune(|record| {
            !record.remote_alias.eq_ignore_ascii_case(remote)
                || upstream
                    .iter()
                    .any(|branch| branch.eq_ignore_ascii_case(&record.branch_name))
        });
        for record in &pruned {
            info!(branch = %record.display_name(), "branch is gone upstream, forgetting it");
        }
        Ok((registry, pruned))
    }

    /// Run one build for `cause`
    pub fn run(
        &self,
        cause: WorkflowCause,
        vcs: &mut dyn VcsClient,
        updater: &mut dyn ProjectVersionUpdater,
        host: &mut dyn BuildHost,
    ) -> Result<BuildSummary> {
        let dry_run = cause.is_dry_run();
        let mut action = dispatch(cause, self.config)?;

        let (mut registry, forgotten) = self.initial_registry(host, vcs)?;
        registry.set_dry_run(dry_run);
        let mut warnings: Vec<WorkflowWarning> = forgotten
            .iter()
            .map(|record| WorkflowWarning::BranchForgotten {
                branch: record.display_name(),
            })
            .collect();

        let (release_build, main_build_omitted) = {
            let mut gate = DryRunGate::new(vcs, dry_run);
            let mut ctx = ActionContext::new(&mut gate, updater, host, &mut registry, self.config);

            action.before(&mut ctx)?;
            if !action.main_build_omitted() {
                let env = ctx.env().clone();
                let result = ctx.host.run_main_build(&env)?;
                info!(%result, "main build finished");
                ctx.host.set_result(result);
                action.main_build_executed()?;
            }
            action.after(&mut ctx)?;

            (ctx.is_release_build(), ctx.main_build_omitted())
        };

        let reported = host.result();
        let result = escalate(reported, &registry);
        if result != reported {
            warnings.push(WorkflowWarning::ResultDowngraded {
                from: reported,
                to: result,
                broken_branches: registry
                    .broken_branches()
                    .iter()
                    .map(|record| record.display_name())
                    .collect(),
            });
        }
        host.set_result(result);

        host.attach_build_artifact(&registry)?;

        let summary = BuildSummary {
            action: action.name(),
            version: action.cause().display_version().map(str::to_string),
            dry_run,
            release_build,
            main_build_omitted,
            result,
            warnings,
        };
        info!(summary = %summary, %result, "build finished");
        Ok(summary)
    }
}

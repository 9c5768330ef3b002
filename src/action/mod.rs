//! Gitflow actions
//!
//! Every [WorkflowCause] maps to exactly one [Action]. An action runs in
//! two phases around the main build:
//!
//! ```text
//! Created -> BeforeRun -> MainBuildOmitted  -> AfterRun -> Complete
//!                      \> MainBuildExecuted /
//! ```
//!
//! `before` prepares the working tree and may omit the main build;
//! `after` inspects the build result and pushes, tags and records what the
//! build produced. Errors in either phase end the build; nothing is rolled
//! back.

pub mod context;
mod finish_hotfix;
mod finish_release;
mod no_action;
mod patch_release;
mod publish_hotfix;
mod publish_release;
mod start_hotfix;
mod start_release;
mod test_hotfix;
mod test_release;

pub use context::ActionContext;

use crate::cause::WorkflowCause;
use crate::config::Config;
use crate::domain::BranchPolicy;
use crate::error::{GitflowError, Result};
use std::fmt;
use tracing::{debug, info_span};

/// Lifecycle position of an [Action]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Created,
    BeforeRun,
    MainBuildOmitted,
    MainBuildExecuted,
    AfterRun,
    Complete,
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionState::Created => "created",
            ActionState::BeforeRun => "before-run",
            ActionState::MainBuildOmitted => "main-build-omitted",
            ActionState::MainBuildExecuted => "main-build-executed",
            ActionState::AfterRun => "after-run",
            ActionState::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// A validated cause, ready to run
#[derive(Debug)]
pub struct Action {
    cause: WorkflowCause,
    state: ActionState,
}

/// Validate a cause and select the action that carries it out
pub fn dispatch(cause: WorkflowCause, config: &Config) -> Result<Action> {
    cause.validate(&BranchPolicy::from_config(&config.branches))?;
    debug!(action = cause.name(), "dispatched");
    Ok(Action {
        cause,
        state: ActionState::Created,
    })
}

impl Action {
    pub fn cause(&self) -> &WorkflowCause {
        &self.cause
    }

    pub fn name(&self) -> &'static str {
        self.cause.name()
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Whether `before` decided the main build must not run
    pub fn main_build_omitted(&self) -> bool {
        self.state == ActionState::MainBuildOmitted
    }

    /// Phase run before the main build
    pub fn before(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        self.transition(&[ActionState::Created], ActionState::BeforeRun)?;
        let span = info_span!("action", action = self.cause.name());
        let _guard = span.enter();

        match &self.cause {
            WorkflowCause::NoAction => no_action::before(ctx)?,
            WorkflowCause::StartRelease(c) => start_release::before(c, ctx)?,
            WorkflowCause::TestRelease(c) => test_release::before(c, ctx)?,
            WorkflowCause::PublishRelease(c) => publish_release::before(c, ctx)?,
            WorkflowCause::FinishRelease(c) => finish_release::before(c, ctx)?,
            WorkflowCause::StartHotfix(c) => start_hotfix::before(c, ctx)?,
            WorkflowCause::TestHotfix(c) => test_hotfix::before(c, ctx)?,
            WorkflowCause::PublishHotfix(c) => publish_hotfix::before(c, ctx)?,
            WorkflowCause::FinishHotfix(c) => finish_hotfix::before(c, ctx)?,
        }

        if ctx.main_build_omitted() {
            self.state = ActionState::MainBuildOmitted;
        }
        Ok(())
    }

    /// Note that the host ran the main build
    pub fn main_build_executed(&mut self) -> Result<()> {
        self.transition(&[ActionState::BeforeRun], ActionState::MainBuildExecuted)
    }

    /// Phase run once the main build has finished or was omitted
    pub fn after(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        let omitted = self.main_build_omitted();
        self.transition(
            &[ActionState::MainBuildOmitted, ActionState::MainBuildExecuted],
            ActionState::AfterRun,
        )?;
        let span = info_span!("action", action = self.cause.name());
        let _guard = span.enter();

        if !omitted {
            match &self.cause {
                WorkflowCause::NoAction => no_action::after(ctx)?,
                WorkflowCause::StartRelease(c) => start_release::after(c, ctx)?,
                WorkflowCause::TestRelease(c) => test_release::after(c, ctx)?,
                WorkflowCause::TestHotfix(c) => test_hotfix::after(c, ctx)?,
                // These always omit the main build and have nothing to do afterwards.
                WorkflowCause::PublishRelease(_)
                | WorkflowCause::FinishRelease(_)
                | WorkflowCause::StartHotfix(_)
                | WorkflowCause::PublishHotfix(_)
                | WorkflowCause::FinishHotfix(_) => {}
            }
        }

        self.state = ActionState::Complete;
        Ok(())
    }

    fn transition(&mut self, expected: &[ActionState], next: ActionState) -> Result<()> {
        if !expected.contains(&self.state) {
            return Err(GitflowError::configuration(format!(
                "Action {} cannot move to {} while {}",
                self.cause.name(),
                next,
                self.state
            )));
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cause::FinishHotfix;
    use crate::domain::BuildResult;
    use crate::git::MockVcs;
    use crate::host::{BuildHost, MockHost};
    use crate::registry::BranchRegistry;
    use crate::updater::MockUpdater;

    #[test]
    fn test_dispatch_validates_cause() {
        let config = Config::default();
        let invalid = WorkflowCause::FinishHotfix(FinishHotfix::new("release/2.3"));
        assert!(matches!(
            dispatch(invalid, &config),
            Err(GitflowError::Configuration(_))
        ));

        let action = dispatch(WorkflowCause::NoAction, &config).unwrap();
        assert_eq!(action.state(), ActionState::Created);
        assert_eq!(action.name(), "no-action");
    }

    #[test]
    fn test_phases_out_of_order_are_rejected() {
        let config = Config::default();
        let mut vcs = MockVcs::new();
        let mut updater = MockUpdater::new("2.4-SNAPSHOT");
        let mut host = MockHost::new().with_branch("origin/develop");
        let mut registry = BranchRegistry::new();
        let mut ctx = ActionContext::new(&mut vcs, &mut updater, &mut host, &mut registry, &config);

        let mut action = dispatch(WorkflowCause::NoAction, &config).unwrap();
        assert!(action.after(&mut ctx).is_err());
        assert!(action.main_build_executed().is_err());

        action.before(&mut ctx).unwrap();
        assert_eq!(action.state(), ActionState::BeforeRun);
        assert!(action.before(&mut ctx).is_err());

        action.main_build_executed().unwrap();
        action.after(&mut ctx).unwrap();
        assert_eq!(action.state(), ActionState::Complete);
        assert!(action.after(&mut ctx).is_err());
    }

    #[test]
    fn test_omitting_actions_skip_after_phase() {
        let config = Config::default();
        let mut vcs = MockVcs::new();
        vcs.add_remote_branch("origin", "hotfix/1.0");
        let mut updater = MockUpdater::new("1.0.1-SNAPSHOT");
        let mut host = MockHost::new();
        let mut registry = BranchRegistry::new();
        let mut ctx = ActionContext::new(&mut vcs, &mut updater, &mut host, &mut registry, &config);

        let cause = WorkflowCause::FinishHotfix(FinishHotfix::new("hotfix/1.0"));
        let mut action = dispatch(cause, &config).unwrap();
        action.before(&mut ctx).unwrap();
        assert!(action.main_build_omitted());
        assert!(action.main_build_executed().is_err());
        action.after(&mut ctx).unwrap();
        assert_eq!(action.state(), ActionState::Complete);
        drop(ctx);

        assert_eq!(host.result(), BuildResult::Success);
    }
}

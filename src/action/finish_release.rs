use crate::action::ActionContext;
use crate::cause::FinishRelease;
use crate::domain::BuildResult;
use crate::error::Result;
use tracing::info;

pub(super) fn before(cause: &FinishRelease, ctx: &mut ActionContext<'_>) -> Result<()> {
    if cause.include_followup_action {
        let hotfix_branch = ctx.policy.hotfix_branch_for_release(&cause.release_branch)?;
        ctx.checkout(&hotfix_branch, &cause.release_branch)?;
        ctx.push_branch(&hotfix_branch)?;
        let hotfix = ctx.record(&hotfix_branch);
        let hotfix = match ctx.tracked(&cause.release_branch) {
            Some(release) => hotfix.inherit_from(&release),
            // the release was never built here; nothing is known to be broken
            None => hotfix.with_result(BuildResult::Success),
        };
        ctx.registry.put(hotfix);
        info!(hotfix_branch = %hotfix_branch, "hotfix branch continues the release");
    }

    ctx.delete_branch(&cause.release_branch)?;
    ctx.forget(&cause.release_branch);
    info!(release_branch = %cause.release_branch, "release finished");

    ctx.omit_main_build()
}

use crate::action::ActionContext;
use crate::cause::FinishHotfix;
use crate::error::Result;
use tracing::info;

pub(super) fn before(cause: &FinishHotfix, ctx: &mut ActionContext<'_>) -> Result<()> {
    ctx.delete_branch(&cause.hotfix_branch)?;
    ctx.forget(&cause.hotfix_branch);
    info!(hotfix_branch = %cause.hotfix_branch, "hotfix finished");

    ctx.omit_main_build()
}

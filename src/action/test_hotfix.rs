use crate::action::{patch_release, ActionContext};
use crate::cause::TestHotfix;
use crate::error::Result;

pub(super) fn before(cause: &TestHotfix, ctx: &mut ActionContext<'_>) -> Result<()> {
    patch_release::before(ctx, &cause.hotfix_branch, &cause.patch_release_version)
}

pub(super) fn after(cause: &TestHotfix, ctx: &mut ActionContext<'_>) -> Result<()> {
    patch_release::after(
        ctx,
        &cause.hotfix_branch,
        &cause.patch_release_version,
        &cause.next_patch_development_version,
    )
}

use crate::action::{patch_release, ActionContext};
use crate::cause::TestRelease;
use crate::error::Result;

pub(super) fn before(cause: &TestRelease, ctx: &mut ActionContext<'_>) -> Result<()> {
    patch_release::before(ctx, &cause.release_branch, &cause.patch_release_version)
}

pub(super) fn after(cause: &TestRelease, ctx: &mut ActionContext<'_>) -> Result<()> {
    patch_release::after(
        ctx,
        &cause.release_branch,
        &cause.patch_release_version,
        &cause.next_patch_development_version,
    )
}

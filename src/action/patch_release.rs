//! Patch release builds, shared by release and hotfix branches

use crate::action::ActionContext;
use crate::domain::BuildResult;
use crate::error::Result;
use tracing::info;

/// Check out `branch` at its upstream state and set the patch release version
pub(super) fn before(
    ctx: &mut ActionContext<'_>,
    branch: &str,
    patch_release_version: &str,
) -> Result<()> {
    ctx.begin_release_build(branch)?;
    ctx.checkout(branch, branch)?;
    ctx.update_version(
        patch_release_version,
        &format!("Release version {}", patch_release_version),
    )?;
    ctx.expose_branch(branch);
    Ok(())
}

/// Publish a successful patch release: push it, tag it, move the branch on
/// to the next development version and remember the release
pub(super) fn after(
    ctx: &mut ActionContext<'_>,
    branch: &str,
    patch_release_version: &str,
    next_patch_development_version: &str,
) -> Result<()> {
    if !ctx.build_succeeded() {
        ctx.record_result(branch);
        return Ok(());
    }

    ctx.push_branch(branch)?;
    let (tag, release_commit) = ctx.tag_release(patch_release_version)?;
    ctx.push_tag(&tag)?;

    ctx.update_version(
        next_patch_development_version,
        &format!("Next patch development version {}", next_patch_development_version),
    )?;
    ctx.push_branch(branch)?;

    let record = ctx
        .record(branch)
        .with_result(BuildResult::Success)
        .with_build_version(next_patch_development_version)
        .with_release(patch_release_version, release_commit);
    ctx.registry.put(record);

    info!(branch, release = patch_release_version, tag = %tag, "patch released");
    Ok(())
}

use crate::action::ActionContext;
use crate::cause::StartRelease;
use crate::domain::BuildResult;
use crate::error::Result;
use tracing::info;

pub(super) fn before(cause: &StartRelease, ctx: &mut ActionContext<'_>) -> Result<()> {
    let release_branch = ctx.policy.release_branch(&cause.release_version);
    let develop = ctx.policy.develop.clone();

    ctx.begin_release_build(&release_branch)?;
    ctx.checkout(&release_branch, &develop)?;
    ctx.update_version(
        &cause.release_version,
        &format!("Start release {}", cause.release_version),
    )?;
    ctx.expose_branch(&release_branch);
    Ok(())
}

pub(super) fn after(cause: &StartRelease, ctx: &mut ActionContext<'_>) -> Result<()> {
    let develop = ctx.policy.develop.clone();
    if !ctx.build_succeeded() {
        ctx.record_result(&develop);
        return Ok(());
    }

    let release_branch = ctx.policy.release_branch(&cause.release_version);
    let (tag, release_commit) = ctx.tag_release(&cause.release_version)?;
    ctx.update_version(
        &cause.next_patch_development_version,
        &format!("Next patch development version {}", cause.next_patch_development_version),
    )?;

    ctx.checkout(&develop, &develop)?;
    ctx.update_version(
        &cause.next_development_version,
        &format!("Next development version {}", cause.next_development_version),
    )?;

    ctx.push_branch(&release_branch)?;
    ctx.push_branch(&develop)?;
    ctx.push_tag(&tag)?;

    let release = ctx
        .record(&release_branch)
        .with_result(BuildResult::Success)
        .with_build_version(cause.next_patch_development_version.as_str())
        .with_base_release_version(cause.release_version.as_str())
        .with_release(cause.release_version.as_str(), release_commit);
    ctx.registry.put(release);

    let develop_record = ctx
        .record(&develop)
        .with_result(BuildResult::Success)
        .with_build_version(cause.next_development_version.as_str());
    ctx.registry.put(develop_record);

    info!(
        release_branch = %release_branch,
        release = %cause.release_version,
        "release started"
    );
    Ok(())
}

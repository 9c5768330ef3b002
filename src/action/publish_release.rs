use crate::action::ActionContext;
use crate::cause::PublishRelease;
use crate::domain::BuildResult;
use crate::error::Result;
use crate::git::StrategyOption;
use tracing::info;

pub(super) fn before(cause: &PublishRelease, ctx: &mut ActionContext<'_>) -> Result<()> {
    let master = ctx.policy.master.clone();
    ctx.merge_into(
        &master,
        &cause.last_patch_release_commit,
        StrategyOption::Theirs,
        &format!(
            "Merge release version {} from {}",
            cause.last_patch_release_version, cause.release_branch
        ),
    )?;

    let master_record = ctx.record(&master);
    let master_record = match ctx.tracked(&cause.release_branch) {
        Some(release) => master_record.inherit_from(&release),
        // master now holds the released commit
        None => master_record
            .with_result(BuildResult::Success)
            .with_build_version(cause.last_patch_release_version.as_str())
            .with_release(
                cause.last_patch_release_version.as_str(),
                cause.last_patch_release_commit.as_str(),
            ),
    };
    ctx.registry.put(master_record);
    info!(
        release_branch = %cause.release_branch,
        release = %cause.last_patch_release_version,
        "release published"
    );

    ctx.omit_main_build()
}

use crate::action::ActionContext;
use crate::cause::PublishHotfix;
use crate::domain::BuildResult;
use crate::error::Result;
use crate::git::StrategyOption;
use tracing::info;

pub(super) fn before(cause: &PublishHotfix, ctx: &mut ActionContext<'_>) -> Result<()> {
    let master = ctx.policy.master.clone();
    let develop = ctx.policy.develop.clone();
    let text = format!(
        "Merge hotfix version {} from {}",
        cause.last_patch_release_version, cause.hotfix_branch
    );

    ctx.merge_into(
        &master,
        &cause.last_patch_release_commit,
        StrategyOption::Theirs,
        &text,
    )?;
    if cause.merge_to_develop {
        ctx.merge_into(
            &develop,
            &cause.last_patch_release_commit,
            StrategyOption::Ours,
            &text,
        )?;
    }

    // master now holds the released commit
    let mut master_record = ctx
        .record(&master)
        .with_result(BuildResult::Success)
        .with_build_version(cause.last_patch_release_version.as_str())
        .with_release(
            cause.last_patch_release_version.as_str(),
            cause.last_patch_release_commit.as_str(),
        );
    if let Some(base) = ctx
        .tracked(&cause.hotfix_branch)
        .and_then(|hotfix| hotfix.base_release_version)
    {
        master_record = master_record.with_base_release_version(base.as_str());
    }
    ctx.registry.put(master_record);
    info!(
        hotfix_branch = %cause.hotfix_branch,
        release = %cause.last_patch_release_version,
        "hotfix published"
    );

    if cause.include_followup_action {
        ctx.delete_branch(&cause.hotfix_branch)?;
        ctx.forget(&cause.hotfix_branch);
        info!(hotfix_branch = %cause.hotfix_branch, "hotfix finished");
    }

    ctx.omit_main_build()
}

use crate::action::ActionContext;
use crate::cause::StartHotfix;
use crate::domain::BuildResult;
use crate::error::Result;
use tracing::info;

pub(super) fn before(cause: &StartHotfix, ctx: &mut ActionContext<'_>) -> Result<()> {
    let master = ctx.policy.master.clone();
    let hotfix_branch = ctx.policy.hotfix_branch(&cause.hotfix_version);

    ctx.checkout(&hotfix_branch, &master)?;
    ctx.update_version(
        &cause.next_patch_development_version,
        &format!("Start hotfix {}", cause.hotfix_version),
    )?;
    ctx.push_branch(&hotfix_branch)?;

    let remote = ctx.remote().to_string();
    let mut hotfix = ctx.record(&hotfix_branch);
    hotfix = match ctx.registry.get(&remote, &master) {
        Some(master_record) => hotfix.inherit_from(master_record),
        // master was never built here; nothing is known to be broken
        None => hotfix.with_result(BuildResult::Success),
    };
    let hotfix = hotfix
        .with_build_version(cause.next_patch_development_version.as_str())
        .with_base_release_version(cause.hotfix_version.as_str());
    ctx.registry.put(hotfix);
    info!(hotfix_branch = %hotfix_branch, "hotfix started");

    ctx.omit_main_build()
}

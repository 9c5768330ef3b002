use crate::action::ActionContext;
use crate::domain::RemoteBranchName;
use crate::error::{GitflowError, Result};
use crate::host::BUILD_BRANCH;
use tracing::info;

/// Remote branch the host is building
fn built_branch(ctx: &ActionContext<'_>) -> Result<RemoteBranchName> {
    let reference = ctx.host.environment().get(BUILD_BRANCH).cloned().ok_or_else(|| {
        GitflowError::configuration(format!(
            "The host does not say which branch is built ({} is not set)",
            BUILD_BRANCH
        ))
    })?;
    RemoteBranchName::parse(&reference, &[ctx.remote().to_string()])
}

pub(super) fn before(ctx: &mut ActionContext<'_>) -> Result<()> {
    let branch = built_branch(ctx)?;
    let branch_type = ctx.policy.classify(&branch.branch_name);
    info!(branch = %branch, branch_type = %branch_type, "building branch");
    ctx.expose(branch, branch_type);
    Ok(())
}

pub(super) fn after(ctx: &mut ActionContext<'_>) -> Result<()> {
    let branch = built_branch(ctx)?;
    let version = ctx.updater.current_version()?;
    let result = ctx.host.result();
    let record = ctx
        .registry
        .get_or_add(&branch.remote_alias, &branch.branch_name)
        .with_result(result)
        .with_build_version(version.as_str());
    ctx.registry.put(record);
    info!(branch = %branch, %result, version = %version, "recorded build");
    Ok(())
}

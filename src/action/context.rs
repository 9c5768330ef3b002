use crate::config::Config;
use crate::domain::{BranchPolicy, BranchType, BuildResult, RemoteBranchName, TagPattern};
use crate::environment::{BranchEnvironment, RELEASE_BUILD};
use crate::error::{GitflowError, Result};
use crate::git::{
    branch_refspec, delete_refspec, tag_refspec, FastForwardMode, MergeStrategy, StrategyOption,
    VcsClient,
};
use crate::host::BuildHost;
use crate::registry::{BranchRegistry, RemoteBranchRecord};
use crate::updater::ProjectVersionUpdater;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Everything an action works with during one build
///
/// The VCS client handed in here is already gated for dry runs, and the
/// registry already carries the dry-run flag.
pub struct ActionContext<'a> {
    pub vcs: &'a mut dyn VcsClient,
    pub updater: &'a mut dyn ProjectVersionUpdater,
    pub host: &'a mut dyn BuildHost,
    pub registry: &'a mut BranchRegistry,
    pub config: &'a Config,
    pub policy: BranchPolicy,
    pub tags: TagPattern,
    env: BTreeMap<String, String>,
    release_build: bool,
    main_build_omitted: bool,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        vcs: &'a mut dyn VcsClient,
        updater: &'a mut dyn ProjectVersionUpdater,
        host: &'a mut dyn BuildHost,
        registry: &'a mut BranchRegistry,
        config: &'a Config,
    ) -> Self {
        ActionContext {
            vcs,
            updater,
            host,
            registry,
            config,
            policy: BranchPolicy::from_config(&config.branches),
            tags: TagPattern::new(config.versions.tag_prefix.clone()),
            env: BTreeMap::new(),
            release_build: false,
            main_build_omitted: false,
        }
    }

    /// Alias of the remote every branch lives on
    pub fn remote(&self) -> &str {
        &self.config.remote.alias
    }

    /// Remote-tracking name of a branch, e.g. `origin/develop`
    pub fn remote_ref(&self, branch: &str) -> String {
        format!("{}/{}", self.remote(), branch)
    }

    /// Commit or tag message with the configured prefix
    pub fn message(&self, text: &str) -> String {
        format!("{}{}", self.config.behavior.commit_message_prefix, text)
    }

    /// Extra environment for the main build
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn is_release_build(&self) -> bool {
        self.release_build
    }

    pub fn main_build_omitted(&self) -> bool {
        self.main_build_omitted
    }

    /// Whether the build so far counts as successful
    pub fn build_succeeded(&self) -> bool {
        self.host.result() == BuildResult::Success
    }

    /// Skip the main build while reporting success
    pub fn omit_main_build(&mut self) -> Result<()> {
        self.host.interrupt_with_result(BuildResult::Success);
        self.updater.prevent_archive_publication(&mut self.env)?;
        self.main_build_omitted = true;
        info!("main build omitted");
        Ok(())
    }

    /// Turn the coming main build into a release build of `branch`
    ///
    /// Refused while other tracked branches are unstable or worse, unless
    /// unstable deployments are allowed. The branch itself is not counted
    /// since this build is about to replace its result.
    pub fn begin_release_build(&mut self, branch: &str) -> Result<()> {
        if !self.config.behavior.deploy_unstable {
            let remote = self.remote().to_string();
            let broken: Vec<String> = self
                .registry
                .broken_branches()
                .into_iter()
                .filter(|record| !record.is(&remote, branch))
                .map(|record| format!("{} ({})", record.display_name(), record.last_build_result))
                .collect();
            if !broken.is_empty() {
                return Err(GitflowError::publication(format!(
                    "Refusing a release build while branches are broken: {}",
                    broken.join(", ")
                )));
            }
        }

        self.updater.prepare_for_release_build()?;
        self.env.insert(RELEASE_BUILD.to_string(), "true".to_string());
        self.release_build = true;
        info!(branch, "release build");
        Ok(())
    }

    /// Expose the branch to the main build through environment variables
    pub fn expose_branch(&mut self, branch: &str) {
        let branch_type = self.policy.classify(branch);
        let remote = self.remote().to_string();
        self.expose(RemoteBranchName::new(remote, branch), branch_type);
    }

    pub fn expose(&mut self, branch: RemoteBranchName, branch_type: BranchType) {
        debug!(branch = %branch, branch_type = %branch_type, "exposing branch");
        self.env
            .extend(BranchEnvironment::new(branch, branch_type).to_env_vars());
    }

    /// Check out `branch` reset to its upstream state (or to another branch's)
    pub fn checkout(&mut self, branch: &str, start_from: &str) -> Result<()> {
        let start_point = self.remote_ref(start_from);
        self.vcs.checkout_branch(branch, &start_point)?;
        info!(branch, start_point = %start_point, "checked out");
        Ok(())
    }

    /// Write `version` into the project and commit the modified files
    pub fn update_version(&mut self, version: &str, text: &str) -> Result<String> {
        let files = self.updater.update_version(version)?;
        for file in &files {
            self.vcs.add(&file.to_string_lossy())?;
        }
        let message = self.message(text);
        let commit = self.vcs.commit(&message)?;
        info!(version, commit = %commit, "updated project version");
        Ok(commit)
    }

    /// Merge a released commit into the upstream state of `branch` without
    /// fast-forwarding, commit and push the result
    pub fn merge_into(
        &mut self,
        branch: &str,
        commit: &str,
        favor: StrategyOption,
        text: &str,
    ) -> Result<String> {
        self.checkout(branch, branch)?;
        self.vcs.merge(
            commit,
            FastForwardMode::NoFastForward,
            MergeStrategy::Recursive,
            Some(favor),
            false,
        )?;
        let message = self.message(text);
        let merge_commit = self.vcs.commit(&message)?;
        info!(branch, merged = commit, strategy_option = %favor, "merged");
        self.push_branch(branch)?;
        Ok(merge_commit)
    }

    /// Tag the current commit with a release version; returns the tag and
    /// the commit it points at
    pub fn tag_release(&mut self, version: &str) -> Result<(String, String)> {
        let tag = self.tags.format(version)?;
        let message = self.message(&format!("Release version {}", version));
        self.vcs.tag(&tag, &message)?;
        let commit = self.vcs.rev_parse(&tag)?;
        info!(tag = %tag, commit = %commit, "tagged release");
        Ok((tag, commit))
    }

    pub fn push_branch(&mut self, branch: &str) -> Result<()> {
        let remote = self.remote().to_string();
        self.vcs.push(&remote, &branch_refspec(branch))
    }

    pub fn push_tag(&mut self, tag: &str) -> Result<()> {
        let remote = self.remote().to_string();
        self.vcs.push(&remote, &tag_refspec(tag))
    }

    /// Delete a branch locally, when it exists there, and upstream
    pub fn delete_branch(&mut self, branch: &str) -> Result<()> {
        if self.vcs.branches()?.contains(branch) {
            self.vcs.delete_branch(branch)?;
            info!(branch, "deleted local branch");
        } else {
            debug!(branch, "no local branch to delete");
        }
        let remote = self.remote().to_string();
        self.vcs.push(&remote, &delete_refspec(branch))?;
        Ok(())
    }

    /// Current registry record of a branch on the configured remote
    pub fn record(&mut self, branch: &str) -> RemoteBranchRecord {
        let remote = self.remote().to_string();
        self.registry.get_or_add(&remote, branch)
    }

    /// Record of a branch on the configured remote, if it is tracked
    pub fn tracked(&self, branch: &str) -> Option<RemoteBranchRecord> {
        self.registry.get(self.remote(), branch).cloned()
    }

    /// Stop tracking a branch; untracked branches are left alone
    pub fn forget(&mut self, branch: &str) -> Option<RemoteBranchRecord> {
        let remote = self.remote().to_string();
        self.registry.remove(&RemoteBranchRecord::new(remote, branch))
    }

    /// Store the host's current result on a branch record
    pub fn record_result(&mut self, branch: &str) -> RemoteBranchRecord {
        let result = self.host.result();
        let record = self.record(branch).with_result(result);
        info!(branch, %result, "recorded build result");
        self.registry.put(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{DryRunGate, MockVcs};
    use crate::host::MockHost;
    use crate::updater::MockUpdater;

    #[test]
    fn test_release_build_refused_with_broken_branches() {
        let mut vcs = MockVcs::new();
        let mut updater = MockUpdater::new("2.3-SNAPSHOT");
        let mut host = MockHost::new();
        let mut registry = BranchRegistry::new();
        let feature = registry
            .get_or_add("origin", "feature/login")
            .with_result(BuildResult::Unstable);
        registry.put(feature);
        registry.get_or_add("origin", "release/2.3");
        let config = Config::default();

        let mut ctx = ActionContext::new(&mut vcs, &mut updater, &mut host, &mut registry, &config);
        let err = ctx.begin_release_build("release/2.3").unwrap_err();
        assert!(matches!(err, GitflowError::PublicationPrecondition(_)));
        assert!(err.to_string().contains("origin/feature/login (unstable)"));
        assert!(!err.to_string().contains("release/2.3"));
        assert!(!ctx.is_release_build());
    }

    #[test]
    fn test_release_build_allowed_when_deploying_unstable() {
        let mut vcs = MockVcs::new();
        let mut updater = MockUpdater::new("2.3-SNAPSHOT");
        let mut host = MockHost::new();
        let mut registry = BranchRegistry::new();
        registry.get_or_add("origin", "feature/login");
        let mut config = Config::default();
        config.behavior.deploy_unstable = true;

        let mut ctx = ActionContext::new(&mut vcs, &mut updater, &mut host, &mut registry, &config);
        ctx.begin_release_build("release/2.3").unwrap();
        assert!(ctx.is_release_build());
        assert_eq!(ctx.env().get(RELEASE_BUILD).map(String::as_str), Some("true"));
        drop(ctx);
        assert_eq!(updater.release_builds_prepared(), 1);
    }

    #[test]
    fn test_delete_branch_tolerates_missing_local_branch() {
        let mut vcs = MockVcs::new();
        vcs.add_remote_branch("origin", "release/2.3");
        let mut updater = MockUpdater::new("2.3");
        let mut host = MockHost::new();
        let mut registry = BranchRegistry::new();
        let config = Config::default();

        let mut ctx = ActionContext::new(&mut vcs, &mut updater, &mut host, &mut registry, &config);
        ctx.delete_branch("release/2.3").unwrap();
        drop(ctx);

        assert!(vcs.deleted_branches().is_empty());
        assert_eq!(vcs.pushes().len(), 1);
        assert_eq!(vcs.pushes()[0].refspec, ":refs/heads/release/2.3");
        assert!(vcs.remote_head("origin", "release/2.3").is_none());
    }

    #[test]
    fn test_omit_main_build() {
        let mut vcs = MockVcs::new();
        let mut gate = DryRunGate::new(&mut vcs, true);
        let mut updater = MockUpdater::new("2.3");
        let mut host = MockHost::new();
        host.set_result(BuildResult::Failure);
        let mut registry = BranchRegistry::new();
        let config = Config::default();

        let mut ctx = ActionContext::new(&mut gate, &mut updater, &mut host, &mut registry, &config);
        ctx.omit_main_build().unwrap();
        assert!(ctx.main_build_omitted());
        drop(ctx);

        assert_eq!(host.interrupted_with(), Some(BuildResult::Success));
        assert!(updater.archive_prevented());
    }

    #[test]
    fn test_messages_carry_prefix() {
        let mut vcs = MockVcs::new();
        vcs.add_remote_branch("origin", "develop");
        let mut updater = MockUpdater::new("2.3-SNAPSHOT");
        let mut host = MockHost::new();
        let mut registry = BranchRegistry::new();
        let mut config = Config::default();
        config.behavior.commit_message_prefix = "[ci] ".to_string();

        let mut ctx = ActionContext::new(&mut vcs, &mut updater, &mut host, &mut registry, &config);
        ctx.checkout("develop", "develop").unwrap();
        ctx.update_version("2.4-SNAPSHOT", "Next development version").unwrap();
        drop(ctx);

        assert_eq!(vcs.commit_messages(), vec!["[ci] Next development version"]);
        assert_eq!(updater.updates(), &["2.4-SNAPSHOT".to_string()]);
    }
}

use crate::error::Result;
use crate::git::{FastForwardMode, MergeStrategy, StrategyOption, VcsClient};
use std::collections::BTreeSet;
use tracing::info;

/// VCS client wrapper that suppresses remote mutations during a dry run
///
/// Pushes (which includes remote branch deletion) are logged and dropped.
/// Checkout, commit, merge and tag still run, so later steps of an action
/// see the same local workspace a real run would.
pub struct DryRunGate<'a> {
    inner: &'a mut dyn VcsClient,
    dry_run: bool,
}

impl<'a> DryRunGate<'a> {
    pub fn new(inner: &'a mut dyn VcsClient, dry_run: bool) -> Self {
        DryRunGate { inner, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

impl VcsClient for DryRunGate<'_> {
    fn checkout_branch(&mut self, branch: &str, start_point: &str) -> Result<()> {
        self.inner.checkout_branch(branch, start_point)
    }

    fn add(&mut self, path_pattern: &str) -> Result<()> {
        self.inner.add(path_pattern)
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        self.inner.commit(message)
    }

    fn merge(
        &mut self,
        commit: &str,
        fast_forward: FastForwardMode,
        strategy: MergeStrategy,
        strategy_option: Option<StrategyOption>,
        auto_commit: bool,
    ) -> Result<()> {
        self.inner
            .merge(commit, fast_forward, strategy, strategy_option, auto_commit)
    }

    fn push(&mut self, remote_alias: &str, refspec: &str) -> Result<()> {
        if self.dry_run {
            info!(remote = remote_alias, refspec, "(dry run) omitted push");
            return Ok(());
        }
        self.inner.push(remote_alias, refspec)?;
        info!(remote = remote_alias, refspec, "pushed");
        Ok(())
    }

    fn tag(&mut self, name: &str, message: &str) -> Result<()> {
        self.inner.tag(name, message)
    }

    fn delete_branch(&mut self, name: &str) -> Result<()> {
        self.inner.delete_branch(name)
    }

    fn head_rev(&self, branch: &str) -> Result<String> {
        self.inner.head_rev(branch)
    }

    fn branches(&self) -> Result<BTreeSet<String>> {
        self.inner.branches()
    }

    fn remote_branches(&self, remote_alias: &str) -> Result<BTreeSet<String>> {
        self.inner.remote_branches(remote_alias)
    }

    fn rev_parse(&self, reference: &str) -> Result<String> {
        self.inner.rev_parse(reference)
    }

    fn fetch(&mut self, remote_alias: &str) -> Result<()> {
        self.inner.fetch(remote_alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{branch_refspec, MockVcs};

    #[test]
    fn test_dry_run_drops_push_but_keeps_local_work() {
        let mut mock = MockVcs::new();
        mock.add_remote_branch("origin", "develop");
        {
            let mut gate = DryRunGate::new(&mut mock, true);
            gate.checkout_branch("develop", "origin/develop").unwrap();
            gate.add("Cargo.toml").unwrap();
            gate.commit("bump").unwrap();
            gate.tag("version/1.0", "release").unwrap();
            gate.push("origin", &branch_refspec("develop")).unwrap();
        }
        assert!(mock.pushes().is_empty());
        assert_eq!(mock.commit_messages(), vec!["bump"]);
        assert!(mock.has_tag("version/1.0"));
    }

    #[test]
    fn test_live_run_pushes() {
        let mut mock = MockVcs::new();
        mock.add_remote_branch("origin", "develop");
        {
            let mut gate = DryRunGate::new(&mut mock, false);
            gate.checkout_branch("develop", "origin/develop").unwrap();
            gate.push("origin", &branch_refspec("develop")).unwrap();
        }
        assert_eq!(mock.pushes().len(), 1);
    }
}

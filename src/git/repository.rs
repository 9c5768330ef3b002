use crate::error::{GitflowError, Result};
use crate::git::{FastForwardMode, MergeStrategy, StrategyOption, VcsClient};
use git2::build::CheckoutBuilder;
use git2::{
    BranchType, Commit, Cred, CredentialType, FetchOptions, FetchPrune, FileFavor, MergeOptions,
    ObjectType, Oid, PushOptions, RemoteCallbacks, Repository as Git2Repo, Signature,
};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// [VcsClient] backed by a local git repository through `git2`
pub struct Git2Vcs {
    repo: Git2Repo,
    pending_merge: Option<Oid>,
}

impl Git2Vcs {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        Ok(Git2Vcs::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Vcs {
            repo,
            pending_merge: None,
        }
    }

    /// Directory of the working tree
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Name of the checked-out branch, if HEAD is on one
    pub fn current_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if head.is_branch() {
            head.shorthand().map(str::to_string)
        } else {
            None
        }
    }

    fn resolve_commit(&self, reference: &str) -> Result<Commit<'_>> {
        let object = self.repo.revparse_single(reference).map_err(|e| {
            GitflowError::vcs(format!("Cannot resolve '{}': {}", reference, e.message()))
        })?;
        Ok(object.peel_to_commit()?)
    }

    fn signature(&self) -> Result<Signature<'static>> {
        match self.repo.signature() {
            Ok(signature) => Ok(signature.to_owned()),
            Err(_) => Ok(Signature::now("gitflow-build", "gitflow-build@localhost")?),
        }
    }

    fn head_is_branch(&self, branch: &str) -> bool {
        self.current_branch().as_deref() == Some(branch)
    }
}

/// Credential lookup for fetch and push: SSH keys from ~/.ssh, then the
/// SSH agent, then libgit2's defaults
fn credentials(
    _url: &str,
    username_from_url: Option<&str>,
    allowed_types: CredentialType,
) -> std::result::Result<Cred, git2::Error> {
    let username = username_from_url.unwrap_or("git");

    if allowed_types.contains(CredentialType::SSH_KEY) {
        if let Some(home) = dirs::home_dir() {
            for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                let path = home.join(".ssh").join(key);
                if path.exists() {
                    if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                        return Ok(cred);
                    }
                }
            }
        }

        if let Ok(cred) = Cred::ssh_key_from_agent(username) {
            return Ok(cred);
        }
    }

    Cred::default()
}

impl VcsClient for Git2Vcs {
    fn checkout_branch(&mut self, branch: &str, start_point: &str) -> Result<()> {
        self.pending_merge = None;
        let commit = self.resolve_commit(start_point)?;

        // A branch cannot be force-reset while HEAD points at it.
        if self.head_is_branch(branch) {
            self.repo.set_head_detached(commit.id())?;
        }
        self.repo.branch(branch, &commit, true)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;
        self.repo.set_head(&format!("refs/heads/{}", branch))?;

        debug!(branch, start_point, "checked out");
        Ok(())
    }

    fn add(&mut self, path_pattern: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_all([path_pattern], git2::IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        let signature = self.signature()?;
        let mut index = self.repo.index()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let mut parents = Vec::new();
        if let Ok(head) = self.repo.head() {
            parents.push(head.peel_to_commit()?);
        }
        if let Some(merged) = self.pending_merge.take() {
            parents.push(self.repo.find_commit(merged)?);
        }
        let parent_refs: Vec<&Commit> = parents.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parent_refs,
        )?;
        self.repo.cleanup_state()?;
        Ok(oid.to_string())
    }

    fn merge(
        &mut self,
        commit: &str,
        fast_forward: FastForwardMode,
        strategy: MergeStrategy,
        strategy_option: Option<StrategyOption>,
        auto_commit: bool,
    ) -> Result<()> {
        let their_id = self.resolve_commit(commit)?.id();
        {
            let annotated = self.repo.find_annotated_commit(their_id)?;
            let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;

            if analysis.is_up_to_date() {
                debug!(commit, "already up to date");
                return Ok(());
            }

            if analysis.is_fast_forward()
                && fast_forward != FastForwardMode::NoFastForward
                && strategy == MergeStrategy::Recursive
            {
                let head = self.repo.head()?;
                let head_name = head
                    .name()
                    .ok_or_else(|| GitflowError::vcs("HEAD has no name"))?
                    .to_string();
                self.repo
                    .reference(&head_name, their_id, true, "gitflow: fast-forward")?;
                let mut checkout = CheckoutBuilder::new();
                checkout.force();
                self.repo.checkout_head(Some(&mut checkout))?;
                return Ok(());
            }

            if fast_forward == FastForwardMode::FastForwardOnly {
                return Err(GitflowError::vcs(format!(
                    "Cannot fast-forward to '{}'",
                    commit
                )));
            }

            match strategy {
                MergeStrategy::Recursive => {
                    let mut options = MergeOptions::new();
                    if let Some(option) = strategy_option {
                        options.file_favor(match option {
                            StrategyOption::Ours => FileFavor::Ours,
                            StrategyOption::Theirs => FileFavor::Theirs,
                        });
                    }
                    let mut checkout = CheckoutBuilder::new();
                    checkout.force().allow_conflicts(true);
                    self.repo
                        .merge(&[&annotated], Some(&mut options), Some(&mut checkout))?;

                    if self.repo.index()?.has_conflicts() {
                        self.repo.cleanup_state()?;
                        return Err(GitflowError::vcs(format!(
                            "Merging '{}' left conflicts",
                            commit
                        )));
                    }
                }
                // Index and worktree stay as they are; only the parent is recorded.
                MergeStrategy::Ours => {}
            }
        }

        self.pending_merge = Some(their_id);
        if auto_commit {
            let branch = self.current_branch().unwrap_or_else(|| "HEAD".to_string());
            self.commit(&format!("Merge commit '{}' into {}", commit, branch))?;
        }
        Ok(())
    }

    fn push(&mut self, remote_alias: &str, refspec: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_alias).map_err(|e| {
            GitflowError::vcs(format!("Cannot find remote '{}': {}", remote_alias, e))
        })?;

        let mut rejections = Vec::new();
        {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(credentials);
            callbacks.push_update_reference(|reference, status| {
                if let Some(message) = status {
                    rejections.push(format!("{}: {}", reference, message));
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote
                .push(&[refspec], Some(&mut options))
                .map_err(|e| GitflowError::vcs(format!("Push of '{}' failed: {}", refspec, e)))?;
        }

        if !rejections.is_empty() {
            return Err(GitflowError::vcs(format!(
                "Remote '{}' rejected {}",
                remote_alias,
                rejections.join(", ")
            )));
        }
        Ok(())
    }

    fn tag(&mut self, name: &str, message: &str) -> Result<()> {
        let head = self.repo.head()?.peel(ObjectType::Commit)?;
        let signature = self.signature()?;
        self.repo
            .tag(name, &head, &signature, message, false)
            .map_err(|e| GitflowError::vcs(format!("Cannot create tag '{}': {}", name, e)))?;
        Ok(())
    }

    fn delete_branch(&mut self, name: &str) -> Result<()> {
        let mut branch = self.repo.find_branch(name, BranchType::Local)?;
        if branch.is_head() {
            let tip = branch.get().peel_to_commit()?.id();
            self.repo.set_head_detached(tip)?;
        }
        branch.delete()?;
        Ok(())
    }

    fn head_rev(&self, branch: &str) -> Result<String> {
        Ok(self.resolve_commit(branch)?.id().to_string())
    }

    fn branches(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                names.insert(name.to_string());
            }
        }
        Ok(names)
    }

    fn remote_branches(&self, remote_alias: &str) -> Result<BTreeSet<String>> {
        let prefix = format!("{}/", remote_alias);
        let mut names = BTreeSet::new();
        for entry in self.repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                if let Some(short) = name.strip_prefix(&prefix) {
                    if short != "HEAD" {
                        names.insert(short.to_string());
                    }
                }
            }
        }
        Ok(names)
    }

    fn rev_parse(&self, reference: &str) -> Result<String> {
        Ok(self.resolve_commit(reference)?.id().to_string())
    }

    fn fetch(&mut self, remote_alias: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_alias).map_err(|e| {
            GitflowError::vcs(format!("Cannot find remote '{}': {}", remote_alias, e))
        })?;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(credentials);
        let mut options = FetchOptions::new();
        options.remote_callbacks(callbacks);
        options.prune(FetchPrune::On);

        let heads = format!("+refs/heads/*:refs/remotes/{}/*", remote_alias);
        remote
            .fetch(
                &[heads.as_str(), "+refs/tags/*:refs/tags/*"],
                Some(&mut options),
                None,
            )
            .map_err(|e| GitflowError::vcs(format!("Fetch from '{}' failed: {}", remote_alias, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("not-a-repo");
        std::fs::create_dir_all(&nested).unwrap();
        // discover walks upwards; a fresh temp dir normally has no repository above it
        if Git2Repo::discover(&nested).is_err() {
            assert!(Git2Vcs::open(&nested).is_err());
        }
    }
}

use crate::error::{GitflowError, Result};
use crate::git::{FastForwardMode, MergeStrategy, StrategyOption, VcsClient};
use std::collections::{BTreeMap, BTreeSet};

/// A commit created in the mock repository
#[derive(Debug, Clone, PartialEq)]
pub struct MockCommit {
    pub id: String,
    pub message: String,
    pub parents: Vec<String>,
    pub files: Vec<String>,
}

/// A push that reached the (simulated) remote
#[derive(Debug, Clone, PartialEq)]
pub struct PushRecord {
    pub remote: String,
    pub refspec: String,
}

/// A merge request made against the mock repository
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRecord {
    pub into_branch: String,
    pub commit: String,
    pub fast_forward: FastForwardMode,
    pub strategy: MergeStrategy,
    pub strategy_option: Option<StrategyOption>,
    pub auto_commit: bool,
}

/// In-memory repository for testing without actual git operations
///
/// Keeps local branches, remote branches, tags and commits in maps and
/// records every push and merge so tests can assert on what reached the
/// remote.
#[derive(Debug, Default)]
pub struct MockVcs {
    local_branches: BTreeMap<String, String>,
    remote_heads: BTreeMap<(String, String), String>,
    tags: BTreeMap<String, (String, String)>,
    remote_tags: BTreeMap<(String, String), String>,
    commits: Vec<MockCommit>,
    current: Option<String>,
    staged: Vec<String>,
    pending_merge: Option<String>,
    pushes: Vec<PushRecord>,
    merges: Vec<MergeRecord>,
    deleted: Vec<String>,
    calls: Vec<String>,
    failing: BTreeSet<String>,
}

impl MockVcs {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a branch on a remote, pointing at a fresh commit; returns the commit id
    pub fn add_remote_branch(&mut self, remote: &str, branch: &str) -> String {
        let id = self.new_commit(format!("initial commit of {}", branch), Vec::new(), Vec::new());
        self.remote_heads
            .insert((remote.to_string(), branch.to_string()), id.clone());
        id
    }

    /// Add a local branch pointing at a fresh commit; returns the commit id
    pub fn add_local_branch(&mut self, branch: &str) -> String {
        let id = self.new_commit(format!("initial commit of {}", branch), Vec::new(), Vec::new());
        self.local_branches.insert(branch.to_string(), id.clone());
        id
    }

    /// Add a free-standing commit; returns its id
    pub fn add_commit(&mut self, message: &str) -> String {
        self.new_commit(message.to_string(), Vec::new(), Vec::new())
    }

    /// Make every subsequent call of `operation` (e.g. "push") fail
    pub fn fail_on(&mut self, operation: &str) {
        self.failing.insert(operation.to_string());
    }

    pub fn pushes(&self) -> &[PushRecord] {
        &self.pushes
    }

    pub fn merges(&self) -> &[MergeRecord] {
        &self.merges
    }

    pub fn commits(&self) -> &[MockCommit] {
        &self.commits
    }

    /// Messages of the commits created through [VcsClient::commit], oldest first
    pub fn commit_messages(&self) -> Vec<String> {
        self.commits
            .iter()
            .filter(|commit| !commit.message.starts_with("initial commit of "))
            .map(|commit| commit.message.clone())
            .collect()
    }

    /// Every operation in call order, e.g. "checkout release/2.3 origin/develop"
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    pub fn current_branch(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn deleted_branches(&self) -> &[String] {
        &self.deleted
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn tag_commit(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(|(commit, _)| commit.as_str())
    }

    pub fn has_remote_tag(&self, remote: &str, name: &str) -> bool {
        self.remote_tags
            .contains_key(&(remote.to_string(), name.to_string()))
    }

    pub fn remote_head(&self, remote: &str, branch: &str) -> Option<&str> {
        self.remote_heads
            .get(&(remote.to_string(), branch.to_string()))
            .map(String::as_str)
    }

    pub fn local_head(&self, branch: &str) -> Option<&str> {
        self.local_branches.get(branch).map(String::as_str)
    }

    fn new_commit(&mut self, message: String, parents: Vec<String>, files: Vec<String>) -> String {
        let id = format!("{:040x}", self.commits.len() + 1);
        self.commits.push(MockCommit {
            id: id.clone(),
            message,
            parents,
            files,
        });
        id
    }

    fn record(&mut self, operation: &str, detail: String) -> Result<()> {
        self.calls.push(format!("{} {}", operation, detail).trim_end().to_string());
        if self.failing.contains(operation) {
            return Err(GitflowError::vcs(format!("simulated {} failure", operation)));
        }
        Ok(())
    }

    fn resolve(&self, reference: &str) -> Result<String> {
        let reference = reference
            .strip_prefix("refs/heads/")
            .or_else(|| reference.strip_prefix("refs/tags/"))
            .unwrap_or(reference);

        if let Some(id) = self.local_branches.get(reference) {
            return Ok(id.clone());
        }
        if let Some((commit, _)) = self.tags.get(reference) {
            return Ok(commit.clone());
        }
        if let Some((remote, branch)) = reference.split_once('/') {
            if let Some(id) = self
                .remote_heads
                .get(&(remote.to_string(), branch.to_string()))
            {
                return Ok(id.clone());
            }
        }
        if self.commits.iter().any(|commit| commit.id == reference) {
            return Ok(reference.to_string());
        }
        Err(GitflowError::vcs(format!("unknown revision '{}'", reference)))
    }

    fn current_branch_or_err(&self) -> Result<String> {
        self.current
            .clone()
            .ok_or_else(|| GitflowError::vcs("no branch checked out"))
    }
}

impl VcsClient for MockVcs {
    fn checkout_branch(&mut self, branch: &str, start_point: &str) -> Result<()> {
        self.record("checkout", format!("{} {}", branch, start_point))?;
        let id = self.resolve(start_point)?;
        self.local_branches.insert(branch.to_string(), id);
        self.current = Some(branch.to_string());
        self.pending_merge = None;
        Ok(())
    }

    fn add(&mut self, path_pattern: &str) -> Result<()> {
        self.record("add", path_pattern.to_string())?;
        self.staged.push(path_pattern.to_string());
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        self.record("commit", message.to_string())?;
        let branch = self.current_branch_or_err()?;
        let mut parents = vec![self.resolve(&branch)?];
        parents.extend(self.pending_merge.take());
        let files = std::mem::take(&mut self.staged);
        let id = self.new_commit(message.to_string(), parents, files);
        self.local_branches.insert(branch, id.clone());
        Ok(id)
    }

    fn merge(
        &mut self,
        commit: &str,
        fast_forward: FastForwardMode,
        strategy: MergeStrategy,
        strategy_option: Option<StrategyOption>,
        auto_commit: bool,
    ) -> Result<()> {
        self.record("merge", commit.to_string())?;
        let into_branch = self.current_branch_or_err()?;
        let their = self.resolve(commit)?;
        self.merges.push(MergeRecord {
            into_branch: into_branch.clone(),
            commit: commit.to_string(),
            fast_forward,
            strategy,
            strategy_option,
            auto_commit,
        });
        self.pending_merge = Some(their);
        if auto_commit {
            self.commit(&format!("Merge commit '{}' into {}", commit, into_branch))?;
        }
        Ok(())
    }

    fn push(&mut self, remote_alias: &str, refspec: &str) -> Result<()> {
        self.record("push", format!("{} {}", remote_alias, refspec))?;
        let (source, destination) = refspec
            .split_once(':')
            .ok_or_else(|| GitflowError::vcs(format!("invalid refspec '{}'", refspec)))?;

        if let Some(branch) = destination.strip_prefix("refs/heads/") {
            let key = (remote_alias.to_string(), branch.to_string());
            if source.is_empty() {
                self.remote_heads.remove(&key);
            } else {
                let id = self.resolve(source)?;
                self.remote_heads.insert(key, id);
            }
        } else if let Some(tag) = destination.strip_prefix("refs/tags/") {
            let id = self.resolve(source)?;
            self.remote_tags
                .insert((remote_alias.to_string(), tag.to_string()), id);
        } else {
            return Err(GitflowError::vcs(format!(
                "unsupported push destination '{}'",
                destination
            )));
        }

        self.pushes.push(PushRecord {
            remote: remote_alias.to_string(),
            refspec: refspec.to_string(),
        });
        Ok(())
    }

    fn tag(&mut self, name: &str, message: &str) -> Result<()> {
        self.record("tag", name.to_string())?;
        if self.tags.contains_key(name) {
            return Err(GitflowError::vcs(format!("tag '{}' already exists", name)));
        }
        let branch = self.current_branch_or_err()?;
        let id = self.resolve(&branch)?;
        self.tags
            .insert(name.to_string(), (id, message.to_string()));
        Ok(())
    }

    fn delete_branch(&mut self, name: &str) -> Result<()> {
        self.record("delete", name.to_string())?;
        if self.local_branches.remove(name).is_none() {
            return Err(GitflowError::vcs(format!("branch '{}' not found", name)));
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        self.deleted.push(name.to_string());
        Ok(())
    }

    fn head_rev(&self, branch: &str) -> Result<String> {
        self.resolve(branch)
    }

    fn branches(&self) -> Result<BTreeSet<String>> {
        Ok(self.local_branches.keys().cloned().collect())
    }

    fn remote_branches(&self, remote_alias: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .remote_heads
            .keys()
            .filter(|(remote, _)| remote == remote_alias)
            .map(|(_, branch)| branch.clone())
            .collect())
    }

    fn rev_parse(&self, reference: &str) -> Result<String> {
        self.resolve(reference)
    }

    fn fetch(&mut self, remote_alias: &str) -> Result<()> {
        self.record("fetch", remote_alias.to_string())
    }
}

//! Version-control abstraction layer
//!
//! The workflow engine never talks to git directly. Every branch, merge,
//! tag and push goes through the [VcsClient] trait, with these
//! implementations:
//!
//! - [repository::Git2Vcs]: the real client, built on the `git2` crate
//! - [mock::MockVcs]: an in-memory repository that records every call
//! - [dry_run::DryRunGate]: a wrapper that lets local operations through
//!   but swallows anything that would change the remote
//!
//! The client is chosen once, when the build starts, and handed to the
//! actions as a trait object.
//!
//! ```rust
//! # use gitflow_build::git::{MockVcs, VcsClient};
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut vcs = MockVcs::new();
//! vcs.add_remote_branch("origin", "develop");
//! vcs.checkout_branch("develop", "origin/develop")?;
//! assert!(vcs.branches()?.contains("develop"));
//! # Ok(())
//! # }
//! ```

pub mod dry_run;
pub mod mock;
pub mod repository;

pub use dry_run::DryRunGate;
pub use mock::MockVcs;
pub use repository::Git2Vcs;

use crate::error::Result;
use std::collections::BTreeSet;
use std::fmt;

/// Whether a merge may, must, or must not fast-forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastForwardMode {
    FastForward,
    FastForwardOnly,
    NoFastForward,
}

/// Merge strategy, as in `git merge -s <strategy>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Three-way merge of both sides
    Recursive,
    /// Record the merge but keep our tree unchanged
    Ours,
}

/// Side that wins conflicting hunks, as in `git merge -X <option>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyOption {
    Ours,
    Theirs,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::Recursive => f.write_str("recursive"),
            MergeStrategy::Ours => f.write_str("ours"),
        }
    }
}

impl fmt::Display for StrategyOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyOption::Ours => f.write_str("ours"),
            StrategyOption::Theirs => f.write_str("theirs"),
        }
    }
}

/// Refspec that pushes a local branch to the same name upstream
pub fn branch_refspec(branch: &str) -> String {
    format!("refs/heads/{0}:refs/heads/{0}", branch)
}

/// Refspec that pushes a tag to the same name upstream
pub fn tag_refspec(tag: &str) -> String {
    format!("refs/tags/{0}:refs/tags/{0}", tag)
}

/// Refspec that deletes a branch upstream
pub fn delete_refspec(branch: &str) -> String {
    format!(":refs/heads/{}", branch)
}

/// Version-control operations the workflow needs
///
/// All calls are blocking. Failures surface as
/// [crate::error::GitflowError] and are fatal to the build; nothing is
/// retried.
///
/// Commit identifiers are full hexadecimal object ids.
pub trait VcsClient {
    /// Create or reset `branch` to `start_point` and check it out
    /// (`git checkout -B <branch> <start_point>`)
    fn checkout_branch(&mut self, branch: &str, start_point: &str) -> Result<()>;

    /// Stage files matching a workdir-relative path pattern
    fn add(&mut self, path_pattern: &str) -> Result<()>;

    /// Commit the index on the current branch, concluding a pending merge
    /// if there is one; returns the new commit id
    fn commit(&mut self, message: &str) -> Result<String>;

    /// Merge `commit` into the current branch
    ///
    /// With `auto_commit` off the merge is left pending and the next
    /// [VcsClient::commit] records it.
    fn merge(
        &mut self,
        commit: &str,
        fast_forward: FastForwardMode,
        strategy: MergeStrategy,
        strategy_option: Option<StrategyOption>,
        auto_commit: bool,
    ) -> Result<()>;

    /// Push a refspec to a remote
    fn push(&mut self, remote_alias: &str, refspec: &str) -> Result<()>;

    /// Create an annotated tag on the current commit
    fn tag(&mut self, name: &str, message: &str) -> Result<()>;

    /// Delete a local branch; fails if it does not exist
    fn delete_branch(&mut self, name: &str) -> Result<()>;

    /// Commit id at the tip of a branch (local, or `<remote>/<branch>`)
    fn head_rev(&self, branch: &str) -> Result<String>;

    /// Names of all local branches
    fn branches(&self) -> Result<BTreeSet<String>>;

    /// Names of the branches a remote is known to have, without the alias prefix
    fn remote_branches(&self, remote_alias: &str) -> Result<BTreeSet<String>>;

    /// Resolve any revision expression to a commit id
    fn rev_parse(&self, reference: &str) -> Result<String>;

    /// Refresh remote-tracking branches and tags
    fn fetch(&mut self, remote_alias: &str) -> Result<()>;
}

use crate::domain::{BranchType, RemoteBranchName};
use std::collections::BTreeMap;

/// Branch name without the remote, e.g. `release/2.3`
pub const SIMPLE_BRANCH_NAME: &str = "GIT_SIMPLE_BRANCH_NAME";
/// Branch name with the remote, e.g. `origin/release/2.3`
pub const REMOTE_BRANCH_NAME: &str = "GIT_REMOTE_BRANCH_NAME";
/// Classification of the branch, e.g. `release`
pub const BRANCH_TYPE: &str = "GIT_BRANCH_TYPE";
/// Set to `true` when the main build produces release artifacts
pub const RELEASE_BUILD: &str = "GITFLOW_RELEASE_BUILD";
/// Set to `true` when the main build must not publish archives
pub const SKIP_ARCHIVE: &str = "GITFLOW_SKIP_ARCHIVE";

/// Branch information handed to the main build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchEnvironment {
    pub branch: RemoteBranchName,
    pub branch_type: BranchType,
}

impl BranchEnvironment {
    pub fn new(branch: RemoteBranchName, branch_type: BranchType) -> Self {
        BranchEnvironment {
            branch,
            branch_type,
        }
    }

    /// Environment variables describing the branch
    pub fn to_env_vars(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();

        env.insert(
            SIMPLE_BRANCH_NAME.to_string(),
            self.branch.branch_name.clone(),
        );
        env.insert(REMOTE_BRANCH_NAME.to_string(), self.branch.to_string());
        env.insert(BRANCH_TYPE.to_string(), self.branch_type.name().to_string());

        env
    }
}

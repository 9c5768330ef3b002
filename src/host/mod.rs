//! The build host around the workflow engine
//!
//! The host owns the build: its environment, its running result, the
//! history of earlier builds and the artifacts this build leaves behind.
//! [BuildHost] is the narrow interface the engine uses to reach it.

pub mod local;
pub mod mock;

pub use local::LocalHost;
pub use mock::MockHost;

use crate::domain::BuildResult;
use crate::error::Result;
use crate::registry::BranchRegistry;
use std::collections::BTreeMap;

/// Remote branch the host is building, e.g. `origin/develop`
pub const BUILD_BRANCH: &str = "GIT_BRANCH";

/// Build scheduler the workflow runs inside
pub trait BuildHost {
    /// Environment of the running build; carries [BUILD_BRANCH]
    fn environment(&self) -> BTreeMap<String, String>;

    /// Result of the build so far
    fn result(&self) -> BuildResult;

    fn set_result(&mut self, result: BuildResult);

    /// Stop the build before the main build starts, reporting `result`
    fn interrupt_with_result(&mut self, result: BuildResult);

    /// Registry attached to the nearest earlier build that has one
    fn previous_build_registry(&self) -> Result<Option<BranchRegistry>>;

    /// Store this build's registry with the build
    fn attach_build_artifact(&mut self, registry: &BranchRegistry) -> Result<()>;

    /// Run the main build with extra environment variables
    fn run_main_build(&mut self, env: &BTreeMap<String, String>) -> Result<BuildResult>;
}

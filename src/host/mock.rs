use crate::domain::BuildResult;
use crate::error::Result;
use crate::host::{BuildHost, BUILD_BRANCH};
use crate::registry::BranchRegistry;
use std::collections::BTreeMap;

/// In-memory build host for testing
#[derive(Debug, Clone)]
pub struct MockHost {
    environment: BTreeMap<String, String>,
    result: BuildResult,
    interrupted_with: Option<BuildResult>,
    previous: Option<BranchRegistry>,
    attached: Vec<BranchRegistry>,
    main_build_result: BuildResult,
    main_builds: Vec<BTreeMap<String, String>>,
}

impl Default for MockHost {
    fn default() -> Self {
        MockHost {
            environment: BTreeMap::new(),
            result: BuildResult::Success,
            interrupted_with: None,
            previous: None,
            attached: Vec::new(),
            main_build_result: BuildResult::Success,
            main_builds: Vec::new(),
        }
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote branch being built, e.g. `origin/develop`
    pub fn with_branch(mut self, remote_branch: &str) -> Self {
        self.environment
            .insert(BUILD_BRANCH.to_string(), remote_branch.to_string());
        self
    }

    pub fn with_previous_registry(mut self, registry: BranchRegistry) -> Self {
        self.previous = Some(registry);
        self
    }

    /// Result the main build reports when it runs
    pub fn with_main_build_result(mut self, result: BuildResult) -> Self {
        self.main_build_result = result;
        self
    }

    pub fn interrupted_with(&self) -> Option<BuildResult> {
        self.interrupted_with
    }

    /// Environment of every main build run, in order
    pub fn main_builds(&self) -> &[BTreeMap<String, String>] {
        &self.main_builds
    }

    pub fn attached(&self) -> &[BranchRegistry] {
        &self.attached
    }

    pub fn last_attached(&self) -> Option<&BranchRegistry> {
        self.attached.last()
    }
}

impl BuildHost for MockHost {
    fn environment(&self) -> BTreeMap<String, String> {
        self.environment.clone()
    }

    fn result(&self) -> BuildResult {
        self.result
    }

    fn set_result(&mut self, result: BuildResult) {
        self.result = result;
    }

    fn interrupt_with_result(&mut self, result: BuildResult) {
        self.result = result;
        self.interrupted_with = Some(result);
    }

    fn previous_build_registry(&self) -> Result<Option<BranchRegistry>> {
        Ok(self.previous.clone())
    }

    fn attach_build_artifact(&mut self, registry: &BranchRegistry) -> Result<()> {
        self.attached.push(registry.clone());
        Ok(())
    }

    fn run_main_build(&mut self, env: &BTreeMap<String, String>) -> Result<BuildResult> {
        self.main_builds.push(env.clone());
        Ok(self.main_build_result)
    }
}

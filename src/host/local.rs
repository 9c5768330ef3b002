use crate::domain::BuildResult;
use crate::error::{GitflowError, Result};
use crate::host::{BuildHost, BUILD_BRANCH};
use crate::registry::BranchRegistry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// File name of the registry artifact inside a build directory
pub const REGISTRY_ARTIFACT: &str = "branches.toml";

/// Host that keeps numbered build directories on the local disk and runs
/// the main build as a shell command
///
/// ```text
/// <history_dir>/
///   1/branches.toml
///   2/branches.toml
///   3/            <- this build
/// ```
pub struct LocalHost {
    history_dir: PathBuf,
    build_number: u32,
    build_command: Option<String>,
    working_dir: Option<PathBuf>,
    environment: BTreeMap<String, String>,
    result: BuildResult,
    interrupted: bool,
}

impl LocalHost {
    /// Host for the next build number in `history_dir`
    pub fn new(history_dir: impl Into<PathBuf>, build_command: Option<String>) -> Result<Self> {
        let history_dir = history_dir.into();
        let build_number = Self::last_build_number(&history_dir)? + 1;
        Ok(LocalHost {
            history_dir,
            build_number,
            build_command,
            working_dir: None,
            environment: BTreeMap::new(),
            result: BuildResult::Success,
            interrupted: false,
        })
    }

    /// Remote branch being built, exposed as [BUILD_BRANCH]
    pub fn with_branch(mut self, remote_branch: impl Into<String>) -> Self {
        self.environment
            .insert(BUILD_BRANCH.to_string(), remote_branch.into());
        self
    }

    /// Directory the build command runs in
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn build_number(&self) -> u32 {
        self.build_number
    }

    pub fn build_dir(&self) -> PathBuf {
        self.history_dir.join(self.build_number.to_string())
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    fn last_build_number(history_dir: &Path) -> Result<u32> {
        if !history_dir.exists() {
            return Ok(0);
        }
        let mut last = 0;
        for entry in fs::read_dir(history_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(number) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            {
                last = last.max(number);
            }
        }
        Ok(last)
    }
}

impl BuildHost for LocalHost {
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
        info!(build = self.build_number, %result, "main build interrupted");
        self.result = result;
        self.interrupted = true;
    }

    fn previous_build_registry(&self) -> Result<Option<BranchRegistry>> {
        for number in (1..self.build_number).rev() {
            let path = self
                .history_dir
                .join(number.to_string())
                .join(REGISTRY_ARTIFACT);
            if path.is_file() {
                debug!(build = number, path = %path.display(), "found previous registry");
                return BranchRegistry::load(&path).map(Some);
            }
        }
        Ok(None)
    }

    fn attach_build_artifact(&mut self, registry: &BranchRegistry) -> Result<()> {
        let path = self.build_dir().join(REGISTRY_ARTIFACT);
        registry.save(&path)?;
        debug!(path = %path.display(), records = registry.len(), "attached registry");
        Ok(())
    }

    fn run_main_build(&mut self, env: &BTreeMap<String, String>) -> Result<BuildResult> {
        let Some(command) = self.build_command.as_deref() else {
            info!("no build command configured, nothing to build");
            return Ok(BuildResult::Success);
        };

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in self.environment.iter().chain(env.iter()) {
            cmd.env(key, value);
        }

        info!(command, "running main build");
        let status = cmd.status().map_err(|e| {
            GitflowError::configuration(format!("Failed to run build command '{}': {}", command, e))
        })?;

        if status.success() {
            Ok(BuildResult::Success)
        } else {
            warn!(command, code = status.code().unwrap_or(-1), "main build failed");
            Ok(BuildResult::Failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_numbers_continue_history() {
        let dir = tempfile::tempdir().unwrap();
        let host = LocalHost::new(dir.path(), None).unwrap();
        assert_eq!(host.build_number(), 1);

        fs::create_dir_all(dir.path().join("1")).unwrap();
        fs::create_dir_all(dir.path().join("7")).unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        let host = LocalHost::new(dir.path(), None).unwrap();
        assert_eq!(host.build_number(), 8);
    }

    #[test]
    fn test_previous_registry_walks_back() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = LocalHost::new(dir.path(), None).unwrap();
        let mut registry = BranchRegistry::new();
        registry.get_or_add("origin", "develop");
        first.attach_build_artifact(&registry).unwrap();

        // build 2 left no registry behind
        fs::create_dir_all(dir.path().join("2")).unwrap();

        let third = LocalHost::new(dir.path(), None).unwrap();
        assert_eq!(third.build_number(), 3);
        let previous = third.previous_build_registry().unwrap().unwrap();
        assert_eq!(previous, registry);
    }

    #[test]
    fn test_no_previous_registry() {
        let dir = tempfile::tempdir().unwrap();
        let host = LocalHost::new(dir.path(), None).unwrap();
        assert!(host.previous_build_registry().unwrap().is_none());
    }

    #[test]
    fn test_run_main_build_without_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = LocalHost::new(dir.path(), None).unwrap();
        assert_eq!(
            host.run_main_build(&BTreeMap::new()).unwrap(),
            BuildResult::Success
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_main_build_passes_environment() {
        let dir = tempfile::tempdir().unwrap();
        let command = r#"test "$GIT_BRANCH" = "origin/develop" && test "$GITFLOW_RELEASE_BUILD" = "true""#;
        let mut host = LocalHost::new(dir.path(), Some(command.to_string()))
            .unwrap()
            .with_branch("origin/develop");

        let mut env = BTreeMap::new();
        env.insert("GITFLOW_RELEASE_BUILD".to_string(), "true".to_string());
        assert_eq!(host.run_main_build(&env).unwrap(), BuildResult::Success);

        env.clear();
        assert_eq!(host.run_main_build(&env).unwrap(), BuildResult::Failure);
    }

    #[test]
    fn test_interrupt_sets_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = LocalHost::new(dir.path(), None).unwrap();
        host.set_result(BuildResult::Failure);
        host.interrupt_with_result(BuildResult::Success);
        assert!(host.is_interrupted());
        assert_eq!(host.result(), BuildResult::Success);
    }
}

use crate::environment::SKIP_ARCHIVE;
use crate::error::{GitflowError, Result};
use crate::updater::ProjectVersionUpdater;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// In-memory version updater for testing
#[derive(Debug, Clone)]
pub struct MockUpdater {
    version: String,
    files: Vec<PathBuf>,
    updates: Vec<String>,
    release_builds_prepared: usize,
    archive_prevented: bool,
    refuse_release: bool,
}

impl MockUpdater {
    /// Project declaring `version`, stored in a single `Cargo.toml`
    pub fn new(version: impl Into<String>) -> Self {
        MockUpdater {
            version: version.into(),
            files: vec![PathBuf::from("Cargo.toml")],
            updates: Vec::new(),
            release_builds_prepared: 0,
            archive_prevented: false,
            refuse_release: false,
        }
    }

    /// Make [ProjectVersionUpdater::prepare_for_release_build] fail
    pub fn refuse_release_builds(mut self) -> Self {
        self.refuse_release = true;
        self
    }

    /// Every version written, in order
    pub fn updates(&self) -> &[String] {
        &self.updates
    }

    pub fn release_builds_prepared(&self) -> usize {
        self.release_builds_prepared
    }

    pub fn archive_prevented(&self) -> bool {
        self.archive_prevented
    }
}

impl ProjectVersionUpdater for MockUpdater {
    fn current_version(&self) -> Result<String> {
        Ok(self.version.clone())
    }

    fn update_version(&mut self, new_version: &str) -> Result<Vec<PathBuf>> {
        self.version = new_version.to_string();
        self.updates.push(new_version.to_string());
        Ok(self.files.clone())
    }

    fn prepare_for_release_build(&mut self) -> Result<()> {
        if self.refuse_release {
            return Err(GitflowError::publication("release publishing is not configured"));
        }
        self.release_builds_prepared += 1;
        Ok(())
    }

    fn prevent_archive_publication(&mut self, env: &mut BTreeMap<String, String>) -> Result<()> {
        env.insert(SKIP_ARCHIVE.to_string(), "true".to_string());
        self.archive_prevented = true;
        Ok(())
    }
}

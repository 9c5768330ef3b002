//! Rewriting the project's own version number
//!
//! Actions bump versions through [ProjectVersionUpdater] and commit the
//! files it reports as modified.

pub mod manifest;
pub mod mock;

pub use manifest::ManifestUpdater;
pub use mock::MockUpdater;

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Build-tool integration that reads and writes the project version
pub trait ProjectVersionUpdater {
    /// Version currently declared by the project
    fn current_version(&self) -> Result<String>;

    /// Write `new_version` into the project files; returns the modified
    /// paths, relative to the working tree root
    fn update_version(&mut self, new_version: &str) -> Result<Vec<PathBuf>>;

    /// Check that the artifacts of a release build can be published;
    /// fails with a publication precondition error otherwise
    fn prepare_for_release_build(&mut self) -> Result<()>;

    /// Make sure the main build publishes no archives
    fn prevent_archive_publication(&mut self, env: &mut BTreeMap<String, String>) -> Result<()>;
}

//! Branch registry carried from build to build
//!
//! The registry is the per-project memory of the workflow: which remote
//! branches have been built, with which result, and which release they
//! last produced. Each build starts from a copy of the previous build's
//! registry and attaches its own copy when it finishes.
//!
//! While the dry-run flag is set every mutating call still returns a value
//! but leaves the stored records untouched.

pub mod record;

pub use record::RemoteBranchRecord;

use crate::domain::BuildResult;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Ordered collection of [RemoteBranchRecord]s (alias, then branch name,
/// both case-insensitive)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchRegistry {
    #[serde(default)]
    records: Vec<RemoteBranchRecord>,
    #[serde(skip)]
    dry_run: bool,
}

// Two registries are equal when they track the same records
impl PartialEq for BranchRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Eq for BranchRegistry {}

impl BranchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from arbitrary records, restoring canonical order
    pub fn from_records(records: impl IntoIterator<Item = RemoteBranchRecord>) -> Self {
        let mut registry = BranchRegistry {
            records: records.into_iter().collect(),
            dry_run: false,
        };
        registry.normalize();
        registry
    }

    /// Copy of a previous build's registry for a new build (never in dry-run mode)
    pub fn inherit(previous: &BranchRegistry) -> Self {
        BranchRegistry::from_records(previous.records.iter().cloned())
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Record for a branch, created with default state if missing
    pub fn get_or_add(&mut self, remote_alias: &str, branch_name: &str) -> RemoteBranchRecord {
        if let Some(existing) = self.get(remote_alias, branch_name) {
            return existing.clone();
        }

        let record = RemoteBranchRecord::new(remote_alias, branch_name);
        if self.dry_run {
            info!(
                branch = %record.display_name(),
                "(dry run) omitted adding branch record"
            );
        } else {
            debug!(branch = %record.display_name(), "tracking new branch");
            self.records.push(record.clone());
            self.normalize();
        }
        record
    }

    pub fn get(&self, remote_alias: &str, branch_name: &str) -> Option<&RemoteBranchRecord> {
        self.records
            .iter()
            .find(|record| record.is(remote_alias, branch_name))
    }

    /// Store a record, replacing the one with the same identity
    pub fn put(&mut self, record: RemoteBranchRecord) -> RemoteBranchRecord {
        if self.dry_run {
            info!(
                branch = %record.display_name(),
                result = %record.last_build_result,
                "(dry run) omitted updating branch record"
            );
            return record;
        }

        match self
            .records
            .iter_mut()
            .find(|existing| existing.is(&record.remote_alias, &record.branch_name))
        {
            Some(existing) => *existing = record.clone(),
            None => {
                self.records.push(record.clone());
                self.normalize();
            }
        }
        record
    }

    /// Drop the record with the same identity as `record`
    ///
    /// Returns the record that was (or, in dry-run mode, would have been) removed.
    pub fn remove(&mut self, record: &RemoteBranchRecord) -> Option<RemoteBranchRecord> {
        let position = self
            .records
            .iter()
            .position(|existing| existing.is(&record.remote_alias, &record.branch_name))?;

        if self.dry_run {
            info!(
                branch = %record.display_name(),
                "(dry run) omitted removing branch record"
            );
            return Some(self.records[position].clone());
        }
        Some(self.records.remove(position))
    }

    /// Remove every record whose branch no longer exists upstream
    pub fn prune<F>(&mut self, mut still_exists: F) -> Vec<RemoteBranchRecord>
    where
        F: FnMut(&RemoteBranchRecord) -> bool,
    {
        let stale: Vec<RemoteBranchRecord> = self
            .records
            .iter()
            .filter(|record| !still_exists(record))
            .cloned()
            .collect();

        for record in &stale {
            self.remove(record);
        }
        stale
    }

    pub fn all(&self) -> &[RemoteBranchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose last build was unstable or worse
    pub fn broken_branches(&self) -> Vec<&RemoteBranchRecord> {
        self.records
            .iter()
            .filter(|record| {
                record
                    .last_build_result
                    .is_worse_or_equal_to(BuildResult::Unstable)
            })
            .collect()
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let mut registry: BranchRegistry = toml::from_str(input)?;
        registry.normalize();
        Ok(registry)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    // Persisted order is not trusted; duplicates keep the last occurrence.
    fn normalize(&mut self) {
        let mut keyed: Vec<(usize, RemoteBranchRecord)> =
            std::mem::take(&mut self.records).into_iter().enumerate().collect();
        keyed.sort_by(|(ia, a), (ib, b)| a.sort_key().cmp(&b.sort_key()).then(ib.cmp(ia)));
        keyed.dedup_by(|(_, later), (_, kept)| later.sort_key() == kept.sort_key());
        self.records = keyed.into_iter().map(|(_, record)| record).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_add_is_idempotent() {
        let mut registry = BranchRegistry::new();
        let first = registry.get_or_add("origin", "develop");
        let second = registry.get_or_add("origin", "develop");
        let third = registry.get_or_add("ORIGIN", "Develop");
        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_non_ascii_names_share_one_record() {
        let mut registry = BranchRegistry::new();
        registry.put(
            RemoteBranchRecord::new("origin", "feature/Äpfel").with_result(BuildResult::Success),
        );
        let found = registry.get_or_add("origin", "feature/äpfel");
        assert_eq!(found.last_build_result, BuildResult::Success);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_order_is_independent_of_insertion() {
        let names = ["release/2.3", "Develop", "master", "hotfix/1.0"];

        let mut forward = BranchRegistry::new();
        for name in names {
            forward.get_or_add("origin", name);
        }
        forward.get_or_add("backup", "master");

        let mut backward = BranchRegistry::new();
        backward.get_or_add("backup", "master");
        for name in names.iter().rev() {
            backward.get_or_add("origin", name);
        }

        let order: Vec<String> = forward.all().iter().map(|r| r.display_name()).collect();
        assert_eq!(
            order,
            vec![
                "backup/master",
                "origin/Develop",
                "origin/hotfix/1.0",
                "origin/master",
                "origin/release/2.3"
            ]
        );
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_put_replaces_existing() {
        let mut registry = BranchRegistry::new();
        let record = registry
            .get_or_add("origin", "develop")
            .with_result(BuildResult::Success)
            .with_build_version("2.4-SNAPSHOT");
        registry.put(record);

        let stored = registry.get("origin", "develop").unwrap();
        assert_eq!(stored.last_build_result, BuildResult::Success);
        assert_eq!(stored.last_build_version.as_deref(), Some("2.4-SNAPSHOT"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_dry_run_blocks_every_write() {
        let mut registry = BranchRegistry::new();
        registry.get_or_add("origin", "develop");
        let before = registry.clone();

        registry.set_dry_run(true);
        let added = registry.get_or_add("origin", "release/2.3");
        assert_eq!(added.branch_name, "release/2.3");

        let develop = registry
            .get_or_add("origin", "develop")
            .with_result(BuildResult::Success);
        let updated = registry.put(develop);
        assert_eq!(updated.last_build_result, BuildResult::Success);

        let removed = registry.remove(&RemoteBranchRecord::new("origin", "develop"));
        assert!(removed.is_some());

        registry.set_dry_run(false);
        assert_eq!(registry, before);
    }

    #[test]
    fn test_remove_missing_record() {
        let mut registry = BranchRegistry::new();
        assert!(registry
            .remove(&RemoteBranchRecord::new("origin", "gone"))
            .is_none());
    }

    #[test]
    fn test_prune() {
        let mut registry = BranchRegistry::new();
        registry.get_or_add("origin", "develop");
        registry.get_or_add("origin", "release/1.0");

        let pruned = registry.prune(|record| record.branch_name != "release/1.0");
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].branch_name, "release/1.0");
        assert!(registry.get("origin", "release/1.0").is_none());
        assert!(registry.get("origin", "develop").is_some());
    }

    #[test]
    fn test_broken_branches() {
        let mut registry = BranchRegistry::new();
        for (name, result) in [
            ("develop", BuildResult::Success),
            ("release/1.0", BuildResult::Unstable),
            ("hotfix/0.9", BuildResult::Aborted),
        ] {
            let record = registry.get_or_add("origin", name).with_result(result);
            registry.put(record);
        }

        let broken: Vec<&str> = registry
            .broken_branches()
            .iter()
            .map(|r| r.branch_name.as_str())
            .collect();
        assert_eq!(broken, vec!["hotfix/0.9", "release/1.0"]);
    }

    #[test]
    fn test_load_sorts_and_deduplicates() {
        let input = r#"
[[records]]
remote_alias = "origin"
branch_name = "release/2.3"
last_build_result = "unstable"

[[records]]
remote_alias = "origin"
branch_name = "develop"
last_build_result = "success"
last_build_version = "2.4-SNAPSHOT"

[[records]]
remote_alias = "origin"
branch_name = "Develop"
last_build_result = "failure"
"#;
        let registry = BranchRegistry::from_toml_str(input).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.all()[0].branch_name, "Develop");
        assert_eq!(registry.all()[0].last_build_result, BuildResult::Failure);
        assert_eq!(registry.all()[1].branch_name, "release/2.3");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("branches.toml");

        let mut registry = BranchRegistry::new();
        let record = registry
            .get_or_add("origin", "hotfix/1.0")
            .with_result(BuildResult::Success)
            .with_release("1.0.2", "0123abcd");
        registry.put(record);
        registry.save(&path).unwrap();

        let loaded = BranchRegistry::load(&path).unwrap();
        assert_eq!(loaded, registry);
    }
}

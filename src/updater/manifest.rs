use crate::domain::VersionNumber;
use crate::environment::SKIP_ARCHIVE;
use crate::error::{GitflowError, Result};
use crate::updater::ProjectVersionUpdater;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const VERSION_SECTIONS: [&str; 2] = ["package", "workspace.package"];

/// Updates `version = "..."` in the `[package]` or `[workspace.package]`
/// table of TOML manifests such as `Cargo.toml`
///
/// Only the version line is rewritten; comments and formatting elsewhere
/// in the file are left alone.
pub struct ManifestUpdater {
    root: PathBuf,
    files: Vec<PathBuf>,
    archive_prevented: bool,
}

impl ManifestUpdater {
    /// `files` are relative to `root`; the first one is authoritative for
    /// [ProjectVersionUpdater::current_version]
    pub fn new(root: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        ManifestUpdater {
            root: root.into(),
            files,
            archive_prevented: false,
        }
    }

    pub fn archive_prevented(&self) -> bool {
        self.archive_prevented
    }

    fn primary(&self) -> Result<&PathBuf> {
        self.files
            .first()
            .ok_or_else(|| GitflowError::configuration("No version files configured"))
    }

    fn read(&self, relative: &Path) -> Result<String> {
        let path = self.root.join(relative);
        fs::read_to_string(&path).map_err(|e| {
            GitflowError::configuration(format!("Cannot read {}: {}", path.display(), e))
        })
    }
}

/// Version declared in a manifest, if any
pub fn declared_version(manifest: &str) -> Result<Option<String>> {
    let table: toml::Table = toml::from_str(manifest)?;
    let package = table
        .get("package")
        .or_else(|| table.get("workspace").and_then(|w| w.get("package")));
    Ok(package
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

/// Rewrite the version line of the package table; `None` if the manifest
/// declares no explicit version there
pub fn replace_version(manifest: &str, new_version: &str) -> Option<String> {
    let version_line = Regex::new(r#"^(\s*version\s*=\s*")([^"]*)(".*)$"#).ok()?;
    let section_header = Regex::new(r"^\s*\[\s*([A-Za-z0-9_.\-]+)\s*\]").ok()?;

    let mut section = String::new();
    let mut replaced = false;
    let mut lines = Vec::new();

    for line in manifest.lines() {
        if let Some(captures) = section_header.captures(line) {
            section = captures[1].to_string();
        }
        if !replaced && VERSION_SECTIONS.contains(&section.as_str()) {
            if let Some(captures) = version_line.captures(line) {
                lines.push(format!("{}{}{}", &captures[1], new_version, &captures[3]));
                replaced = true;
                continue;
            }
        }
        lines.push(line.to_string());
    }

    if !replaced {
        return None;
    }
    let mut updated = lines.join("\n");
    if manifest.ends_with('\n') {
        updated.push('\n');
    }
    Some(updated)
}

impl ProjectVersionUpdater for ManifestUpdater {
    fn current_version(&self) -> Result<String> {
        let primary = self.primary()?;
        declared_version(&self.read(primary)?)?.ok_or_else(|| {
            GitflowError::configuration(format!(
                "{} declares no package version",
                primary.display()
            ))
        })
    }

    fn update_version(&mut self, new_version: &str) -> Result<Vec<PathBuf>> {
        VersionNumber::parse(new_version)?;

        let mut modified = Vec::new();
        for relative in &self.files {
            let content = self.read(relative)?;
            if let Some(updated) = replace_version(&content, new_version) {
                if updated != content {
                    fs::write(self.root.join(relative), updated)?;
                    modified.push(relative.clone());
                }
            }
        }

        if modified.is_empty() && self.current_version()? != new_version {
            return Err(GitflowError::configuration(format!(
                "None of the version files could be set to {}",
                new_version
            )));
        }
        Ok(modified)
    }

    fn prepare_for_release_build(&mut self) -> Result<()> {
        for relative in &self.files {
            let content = self.read(relative).map_err(|e| {
                GitflowError::publication(format!("{} is not readable: {}", relative.display(), e))
            })?;
            toml::from_str::<toml::Table>(&content).map_err(|e| {
                GitflowError::publication(format!("{} is not valid TOML: {}", relative.display(), e))
            })?;
        }
        let version = self.current_version()?;
        VersionNumber::parse(&version).map_err(|_| {
            GitflowError::publication(format!(
                "Project version '{}' cannot be released",
                version
            ))
        })?;
        Ok(())
    }

    fn prevent_archive_publication(&mut self, env: &mut BTreeMap<String, String>) -> Result<()> {
        env.insert(SKIP_ARCHIVE.to_string(), "true".to_string());
        self.archive_prevented = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"# project manifest
[package]
name = "demo"
version = "2.3-SNAPSHOT"   # bumped by gitflow
edition = "2021"

[dependencies]
serde = { version = "1.0" }
"#;

    #[test]
    fn test_declared_version() {
        assert_eq!(
            declared_version(MANIFEST).unwrap().as_deref(),
            Some("2.3-SNAPSHOT")
        );
        let workspace = "[workspace.package]\nversion = \"1.0\"\n";
        assert_eq!(declared_version(workspace).unwrap().as_deref(), Some("1.0"));
        assert_eq!(declared_version("[package]\nname = \"x\"\n").unwrap(), None);
    }

    #[test]
    fn test_replace_version_keeps_layout() {
        let updated = replace_version(MANIFEST, "2.3").unwrap();
        assert!(updated.contains("version = \"2.3\"   # bumped by gitflow"));
        assert!(updated.contains("serde = { version = \"1.0\" }"));
        assert!(updated.starts_with("# project manifest"));
        assert!(updated.ends_with('\n'));
    }

    #[test]
    fn test_replace_version_ignores_other_tables() {
        let manifest = "[dependencies]\nversion = \"9.9\"\n";
        assert!(replace_version(manifest, "1.0").is_none());
    }

    #[test]
    fn test_update_version_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), MANIFEST).unwrap();
        let mut updater = ManifestUpdater::new(dir.path(), vec![PathBuf::from("Cargo.toml")]);

        let modified = updater.update_version("2.3").unwrap();
        assert_eq!(modified, vec![PathBuf::from("Cargo.toml")]);
        assert_eq!(updater.current_version().unwrap(), "2.3");

        assert!(updater.update_version("not-a-version").is_err());
    }

    #[test]
    fn test_prepare_for_release_build_requires_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut updater = ManifestUpdater::new(dir.path(), vec![PathBuf::from("Cargo.toml")]);
        assert!(matches!(
            updater.prepare_for_release_build(),
            Err(GitflowError::PublicationPrecondition(_))
        ));

        fs::write(dir.path().join("Cargo.toml"), MANIFEST).unwrap();
        assert!(updater.prepare_for_release_build().is_ok());
    }

    #[test]
    fn test_prevent_archive_publication() {
        let mut updater = ManifestUpdater::new(".", Vec::new());
        let mut env = BTreeMap::new();
        updater.prevent_archive_publication(&mut env).unwrap();
        assert_eq!(env.get(SKIP_ARCHIVE).map(String::as_str), Some("true"));
        assert!(updater.archive_prevented());
    }
}

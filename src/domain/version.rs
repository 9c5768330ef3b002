use crate::error::{GitflowError, Result};
use std::fmt;
use std::str::FromStr;

/// Marker appended to versions that are still under development
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Version number of the form `major.minor[.patch][-SNAPSHOT]`
///
/// Values are immutable; every bump returns a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
    pub snapshot: bool,
}

impl VersionNumber {
    /// Create a release (non-snapshot) version
    pub fn new(major: u32, minor: u32, patch: Option<u32>) -> Self {
        VersionNumber {
            major,
            minor,
            patch,
            snapshot: false,
        }
    }

    /// Parse a version string such as "2.3-SNAPSHOT" or "1.0.2"
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (numbers, snapshot) = match trimmed.strip_suffix(SNAPSHOT_SUFFIX) {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };

        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(GitflowError::version(format!(
                "Invalid version format: '{}' - expected MAJOR.MINOR[.PATCH][{}]",
                input, SNAPSHOT_SUFFIX
            )));
        }

        let component = |name: &str, raw: &str| {
            raw.parse::<u32>().map_err(|_| {
                GitflowError::version(format!(
                    "Invalid {} version component '{}' in '{}'",
                    name, raw, input
                ))
            })
        };

        let major = component("major", parts[0])?;
        let minor = component("minor", parts[1])?;
        let patch = match parts.get(2) {
            Some(raw) => Some(component("patch", raw)?),
            None => None,
        };

        Ok(VersionNumber {
            major,
            minor,
            patch,
            snapshot,
        })
    }

    /// Same version without the snapshot marker
    pub fn release(&self) -> Self {
        VersionNumber {
            snapshot: false,
            ..*self
        }
    }

    /// Same version with the snapshot marker
    pub fn snapshot(&self) -> Self {
        VersionNumber {
            snapshot: true,
            ..*self
        }
    }

    /// Next patch development version: `X.Y[.Z]` -> `X.Y.(Z+1)-SNAPSHOT`
    ///
    /// A missing patch component counts as zero, so `2.3` becomes `2.3.1-SNAPSHOT`.
    pub fn next_patch(&self) -> Self {
        VersionNumber {
            major: self.major,
            minor: self.minor,
            patch: Some(self.patch.unwrap_or(0) + 1),
            snapshot: true,
        }
    }

    /// Next minor development version: `X.Y[.Z]` -> `X.(Y+1)[.0]-SNAPSHOT`
    pub fn next_minor(&self) -> Self {
        VersionNumber {
            major: self.major,
            minor: self.minor + 1,
            patch: self.patch.map(|_| 0),
            snapshot: true,
        }
    }

    /// Convert to a semantic version for ordering checks (missing patch = 0)
    pub fn to_semver(&self) -> semver::Version {
        let mut version =
            semver::Version::new(self.major as u64, self.minor as u64, self.patch.unwrap_or(0) as u64);
        if self.snapshot {
            version.pre = semver::Prerelease::new("SNAPSHOT").unwrap_or(semver::Prerelease::EMPTY);
        }
        version
    }
}

impl FromStr for VersionNumber {
    type Err = GitflowError;

    fn from_str(s: &str) -> Result<Self> {
        VersionNumber::parse(s)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
        }
        if self.snapshot {
            write!(f, "{}", SNAPSHOT_SUFFIX)?;
        }
        Ok(())
    }
}

/// Remove a trailing snapshot marker; identity for anything else
pub fn strip_snapshot(version: &str) -> String {
    version
        .strip_suffix(SNAPSHOT_SUFFIX)
        .unwrap_or(version)
        .to_string()
}

/// Next patch development version of a version string
pub fn next_patch(version: &str) -> Result<String> {
    Ok(VersionNumber::parse(version)?.next_patch().to_string())
}

/// Next minor development version of a version string
pub fn next_minor(version: &str) -> Result<String> {
    Ok(VersionNumber::parse(version)?.next_minor().to_string())
}

/// Whether `candidate` is strictly newer than `baseline`
pub fn is_newer(candidate: &str, baseline: &str) -> Result<bool> {
    let candidate = VersionNumber::parse(candidate)?.to_semver();
    let baseline = VersionNumber::parse(baseline)?.to_semver();
    Ok(candidate > baseline)
}

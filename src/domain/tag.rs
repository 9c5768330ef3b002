use crate::domain::version::VersionNumber;
use crate::error::{GitflowError, Result};

/// Naming pattern for release tags: configured prefix followed by the version
/// (e.g. prefix "version/" and version "2.3" -> "version/2.3")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pub prefix: String,
}

impl TagPattern {
    /// Create a new tag pattern
    pub fn new(prefix: impl Into<String>) -> Self {
        TagPattern {
            prefix: prefix.into(),
        }
    }

    /// Tag name for a release version
    ///
    /// Snapshot versions are never tagged.
    pub fn format(&self, version: &str) -> Result<String> {
        let parsed = VersionNumber::parse(version)?;
        if parsed.snapshot {
            return Err(GitflowError::version(format!(
                "Refusing to tag development version '{}'",
                version
            )));
        }
        Ok(format!("{}{}", self.prefix, parsed))
    }

    /// Release version encoded in a tag name, if the tag follows this pattern
    pub fn version_of(&self, tag: &str) -> Option<VersionNumber> {
        let escaped = regex::escape(&self.prefix);
        let re = regex::Regex::new(&format!(r"^{}(\d+\.\d+(?:\.\d+)?)$", escaped)).ok()?;
        let captures = re.captures(tag)?;
        VersionNumber::parse(captures.get(1)?.as_str()).ok()
    }
}

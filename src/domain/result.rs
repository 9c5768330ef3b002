use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a build, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    pub fn is_better_than(self, other: BuildResult) -> bool {
        self < other
    }

    pub fn is_worse_or_equal_to(self, other: BuildResult) -> bool {
        self >= other
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildResult::Success => "success",
            BuildResult::Unstable => "unstable",
            BuildResult::Failure => "failure",
            BuildResult::NotBuilt => "not-built",
            BuildResult::Aborted => "aborted",
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

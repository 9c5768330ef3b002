//! Domain logic - pure business rules independent of git operations

pub mod branch;
pub mod result;
pub mod tag;
pub mod version;

pub use branch::{BranchPolicy, BranchType, RemoteBranchName};
pub use result::BuildResult;
pub use tag::TagPattern;
pub use version::{next_minor, next_patch, strip_snapshot, VersionNumber, SNAPSHOT_SUFFIX};

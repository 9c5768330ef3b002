use thiserror::Error;

/// Unified error type for gitflow build operations
///
/// Every variant is fatal for the current build; nothing in the engine
/// retries or rolls back.
#[derive(Error, Debug)]
pub enum GitflowError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Git operation failed: {0}")]
    Vcs(#[from] git2::Error),

    #[error("VCS operation failed: {0}")]
    VcsOperation(String),

    #[error("Publication precondition failed: {0}")]
    PublicationPrecondition(String),

    #[error("Version parsing error: {0}")]
    VersionParse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in gitflow-build
pub type Result<T> = std::result::Result<T, GitflowError>;

impl GitflowError {
    /// Create a configuration error with context
    pub fn configuration(msg: impl Into<String>) -> Self {
        GitflowError::Configuration(msg.into())
    }

    /// Create a VCS operation error with context
    pub fn vcs(msg: impl Into<String>) -> Self {
        GitflowError::VcsOperation(msg.into())
    }

    /// Create a publication precondition error with context
    pub fn publication(msg: impl Into<String>) -> Self {
        GitflowError::PublicationPrecondition(msg.into())
    }

    /// Create a version parsing error with context
    pub fn version(msg: impl Into<String>) -> Self {
        GitflowError::VersionParse(msg.into())
    }
}

impl From<toml::de::Error> for GitflowError {
    fn from(err: toml::de::Error) -> Self {
        GitflowError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for GitflowError {
    fn from(err: toml::ser::Error) -> Self {
        GitflowError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GitflowError::configuration("unknown cause");
        assert_eq!(err.to_string(), "Configuration error: unknown cause");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GitflowError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_from_toml() {
        let parse_err = toml::from_str::<toml::Table>("not = [valid").unwrap_err();
        let err: GitflowError = parse_err.into();
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (GitflowError::configuration("x"), "Configuration error"),
            (GitflowError::vcs("x"), "VCS operation failed"),
            (
                GitflowError::publication("x"),
                "Publication precondition failed",
            ),
            (GitflowError::version("x"), "Version parsing error"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}

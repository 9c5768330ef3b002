use crate::error::{GitflowError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration for gitflow-build.
///
/// Holds the branch naming policy, the remote to work against, release
/// tag and version file settings, and behavior switches.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub branches: BranchesConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub versions: VersionsConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

fn default_master() -> String {
    "master".to_string()
}

fn default_develop() -> String {
    "develop".to_string()
}

fn default_release_prefix() -> String {
    "release/".to_string()
}

fn default_hotfix_prefix() -> String {
    "hotfix/".to_string()
}

fn default_feature_prefix() -> String {
    "feature/".to_string()
}

/// Names of the long-lived branches and prefixes of the short-lived ones.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BranchesConfig {
    #[serde(default = "default_master")]
    pub master: String,

    #[serde(default = "default_develop")]
    pub develop: String,

    #[serde(default = "default_release_prefix")]
    pub release_prefix: String,

    #[serde(default = "default_hotfix_prefix")]
    pub hotfix_prefix: String,

    #[serde(default = "default_feature_prefix")]
    pub feature_prefix: String,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        BranchesConfig {
            master: default_master(),
            develop: default_develop(),
            release_prefix: default_release_prefix(),
            hotfix_prefix: default_hotfix_prefix(),
            feature_prefix: default_feature_prefix(),
        }
    }
}

fn default_remote_alias() -> String {
    "origin".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_alias")]
    pub alias: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            alias: default_remote_alias(),
        }
    }
}

fn default_tag_prefix() -> String {
    "version/".to_string()
}

fn default_version_files() -> Vec<PathBuf> {
    vec![PathBuf::from("Cargo.toml")]
}

/// Release tag naming and the project files that carry the version.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct VersionsConfig {
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    #[serde(default = "default_version_files")]
    pub files: Vec<PathBuf>,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        VersionsConfig {
            tag_prefix: default_tag_prefix(),
            files: default_version_files(),
        }
    }
}

fn default_history_dir() -> PathBuf {
    PathBuf::from(".gitflow/builds")
}

/// Runtime behavior switches.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BehaviorConfig {
    /// Prepended to every commit and tag message
    #[serde(default)]
    pub commit_message_prefix: String,

    /// Allow release builds while tracked branches are unstable
    #[serde(default)]
    pub deploy_unstable: bool,

    /// Where the local host keeps numbered build records
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,

    /// Shell command that performs the main build
    #[serde(default)]
    pub build_command: Option<String>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            commit_message_prefix: String::new(),
            deploy_unstable: false,
            history_dir: default_history_dir(),
            build_command: None,
        }
    }
}

impl Config {
    /// Fail on settings no workflow can run with
    pub fn validate(&self) -> Result<()> {
        let b = &self.branches;
        if b.master.is_empty() || b.develop.is_empty() {
            return Err(GitflowError::configuration(
                "master and develop branch names must not be empty",
            ));
        }
        if b.master == b.develop {
            return Err(GitflowError::configuration(format!(
                "master and develop must be different branches (both are '{}')",
                b.master
            )));
        }
        for (name, prefix) in [
            ("release_prefix", &b.release_prefix),
            ("hotfix_prefix", &b.hotfix_prefix),
        ] {
            if prefix.is_empty() {
                return Err(GitflowError::configuration(format!(
                    "branches.{} must not be empty",
                    name
                )));
            }
        }
        if b.release_prefix == b.hotfix_prefix {
            return Err(GitflowError::configuration(
                "release and hotfix branches need distinct prefixes",
            ));
        }
        if self.remote.alias.is_empty() {
            return Err(GitflowError::configuration("remote.alias must not be empty"));
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `gitflow.toml` in current directory
/// 3. `.gitflow.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded (and validated) or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path).map_err(|e| {
            GitflowError::configuration(format!("Cannot read {}: {}", path.display(), e))
        })?
    } else if Path::new("./gitflow.toml").exists() {
        fs::read_to_string("./gitflow.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".gitflow.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| GitflowError::configuration(format!("Invalid configuration: {}", e)))?;
    config.validate()?;
    Ok(config)
}

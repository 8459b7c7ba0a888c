use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default marker written next to the runner's working directory
pub const DEFAULT_MARKER_FILE: &str = ".postgres-reporter-session-id.txt";

/// Environment variable consulted when no connection url is configured
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Reporter configuration, as passed by the runner or read from a YAML/JSON file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReporterOptions {
    /// PostgreSQL connection url
    pub connection_url: String,

    /// Environment label stored on the session (e.g. "ci", "staging")
    pub environment: Option<String>,

    /// Explicit commit id; skips `git rev-parse` when set
    pub commit_id: Option<String>,

    /// Free-form session metadata, stored verbatim as JSON
    pub metadata: Option<BTreeMap<String, String>>,

    /// Where the session id is written for external tooling
    pub marker_path: PathBuf,

    /// Pool size shared by bootstrap and result writes
    pub max_connections: u32,

    /// Repository used to resolve the commit (defaults to the cwd)
    pub repo_dir: Option<PathBuf>,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            connection_url: String::new(),
            environment: None,
            commit_id: None,
            metadata: None,
            marker_path: PathBuf::from(DEFAULT_MARKER_FILE),
            max_connections: 5,
            repo_dir: None,
        }
    }
}

impl ReporterOptions {
    pub fn new(connection_url: &str) -> Self {
        Self {
            connection_url: connection_url.to_string(),
            ..Default::default()
        }
    }

    /// Parse options from YAML (JSON is accepted too)
    pub fn from_yaml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read options from a file without validating them
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    /// Fill the connection url from the environment when it is unset
    pub fn apply_env(&mut self, database_url: Option<String>) {
        if self.connection_url.trim().is_empty() {
            if let Some(url) = database_url {
                self.connection_url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_url.trim().is_empty() {
            return Err(ConfigError::MissingConnectionUrl);
        }
        Ok(())
    }

    /// Configured commit id, ignoring blank values
    pub fn explicit_commit_id(&self) -> Option<&str> {
        self.commit_id.as_deref().filter(|c| !c.trim().is_empty())
    }
}

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::report::types::TestStatus;

/// Error type shared by every link of the recording chain.
///
/// A failure is observed by all later links and by the completion gate, so
/// the same cause is handed out behind an `Arc`.
pub type SharedError = Arc<ReporterError>;

/// Failures of the datastore seam.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    /// Raised by stores that are not backed by a live connection.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure to obtain the short revision of the checked-out tree.
#[derive(Debug, Error)]
pub enum CommitResolutionError {
    #[error("git executable not found: {0}")]
    GitNotFound(#[from] which::Error),

    #[error("failed to execute git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("git returned an empty revision")]
    EmptyRevision,
}

/// Underlying cause of a bootstrap failure.
#[derive(Debug, Error)]
pub enum BootstrapCause {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write session marker: {0}")]
    Marker(#[from] std::io::Error),
}

/// Errors surfaced by the reporter.
///
/// Rendered as `[postgres reporter]: Error: <message>, caused by: <cause>`.
#[derive(Debug, Error)]
pub enum ReporterError {
    CommitResolution(#[from] CommitResolutionError),

    SessionBootstrap {
        message: String,
        #[source]
        source: Option<BootstrapCause>,
    },

    ResultRecording {
        session_id: String,
        test_name: String,
        status: TestStatus,
        #[source]
        source: StoreError,
    },

    Migration {
        file: PathBuf,
        #[source]
        source: MigrationCause,
    },

    Config(#[from] ConfigError),

    Store(#[source] StoreError),

    TaskAborted(#[source] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum MigrationCause {
    #[error("failed to read migration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to apply migration: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("connection_url is required")]
    MissingConnectionUrl,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ReporterError {
    pub(crate) fn empty_session_id() -> Self {
        ReporterError::SessionBootstrap {
            message: "unexpected empty session id".to_string(),
            source: None,
        }
    }

    pub(crate) fn bootstrap(cause: impl Into<BootstrapCause>) -> Self {
        ReporterError::SessionBootstrap {
            message: "Failed to create test session".to_string(),
            source: Some(cause.into()),
        }
    }

    fn message(&self) -> String {
        match self {
            ReporterError::CommitResolution(_) => "Failed to get git commit".to_string(),
            ReporterError::SessionBootstrap { message, .. } => message.clone(),
            ReporterError::ResultRecording {
                session_id,
                test_name,
                status,
                ..
            } => format!(
                "Failed to insert test result:\n test_session_id: {}\n test: {}\n result: {}",
                session_id, test_name, status
            ),
            ReporterError::Migration { file, .. } => {
                format!("Failed to migrate database ({})", file.display())
            }
            ReporterError::Config(_) => "invalid reporter configuration".to_string(),
            ReporterError::Store(_) => "database unavailable".to_string(),
            ReporterError::TaskAborted(_) => "recording task aborted".to_string(),
        }
    }
}

impl fmt::Display for ReporterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[postgres reporter]: Error: {}", self.message())?;
        if let Some(cause) = std::error::Error::source(self) {
            write!(f, ", caused by: {}", cause)?;
        }
        Ok(())
    }
}

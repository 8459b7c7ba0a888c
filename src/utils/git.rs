use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::CommitResolutionError;

/// Source of the revision stored on each session
#[async_trait]
pub trait CommitResolver: Send + Sync {
    async fn resolve(&self) -> Result<String, CommitResolutionError>;
}

/// Resolves the short hash of `HEAD` with `git rev-parse`
#[derive(Debug, Clone, Default)]
pub struct GitCommitResolver {
    repo_dir: Option<PathBuf>,
}

impl GitCommitResolver {
    pub fn new(repo_dir: Option<PathBuf>) -> Self {
        Self { repo_dir }
    }
}

#[async_trait]
impl CommitResolver for GitCommitResolver {
    async fn resolve(&self) -> Result<String, CommitResolutionError> {
        let git = which::which("git")?;

        let mut cmd = Command::new(git);
        cmd.args(["rev-parse", "--short", "HEAD"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.repo_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await?;
        if !output.status.success() {
            return Err(CommitResolutionError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if revision.is_empty() {
            return Err(CommitResolutionError::EmptyRevision);
        }

        debug!("resolved commit {}", revision);
        Ok(revision)
    }
}

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Side channel exposing the active session id to out-of-process tooling
#[async_trait]
pub trait SessionMarker: Send + Sync {
    /// Record the session id, replacing any previous value
    async fn write(&self, session_id: &str) -> io::Result<()>;
}

/// Writes the raw session id to a file, truncating it first
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionMarker for FileMarker {
    async fn write(&self, session_id: &str) -> io::Result<()> {
        tokio::fs::write(&self.path, session_id).await
    }
}

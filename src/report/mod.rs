pub mod json;
pub mod naming;
pub mod recorder;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{error, info};
use std::future::Future;
use std::sync::Arc;

use crate::error::{ReporterError, SharedError};
use crate::store::{PgResultStore, ResultStore};
use crate::utils::config::ReporterOptions;
use crate::utils::git::{CommitResolver, GitCommitResolver};
use crate::utils::marker::{FileMarker, SessionMarker};
use types::{SharedTestResult, TestCase};

/// Lifecycle hooks a test runner drives
#[async_trait]
pub trait Reporter: Send {
    /// Called once per finished test. Must not block the runner.
    fn on_test_end(&mut self, test: TestCase, result: SharedTestResult);

    /// Called once the whole run finished; resolves when all reporting is done
    async fn on_end(&mut self) -> Result<(), SharedError>;
}

/// Tail of the recording chain. Resolves to the session id once every
/// queued operation before it has completed.
type Chain = Shared<BoxFuture<'static, Result<String, SharedError>>>;

/// Persists a run as one session plus one upserted row per test.
///
/// Bootstrap starts at construction. Each `on_test_end` spawns a link that
/// first awaits the previous tail, so writes reach the store one at a time
/// and in call order. A failed link fails every link after it.
pub struct PostgresReporter {
    store: Arc<dyn ResultStore>,
    chain: Chain,
}

impl PostgresReporter {
    /// Reporter backed by PostgreSQL, `git` and the marker file from `options`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(options: ReporterOptions) -> Result<Self, ReporterError> {
        options.validate()?;

        let store = PgResultStore::connect_lazy(&options.connection_url, options.max_connections)
            .map_err(ReporterError::Store)?;
        let resolver = GitCommitResolver::new(options.repo_dir.clone());
        let marker = FileMarker::new(options.marker_path.clone());

        Ok(Self::with_collaborators(
            options,
            Arc::new(store),
            Arc::new(resolver),
            Arc::new(marker),
        ))
    }

    /// Must be called from within a Tokio runtime.
    pub fn with_collaborators(
        options: ReporterOptions,
        store: Arc<dyn ResultStore>,
        resolver: Arc<dyn CommitResolver>,
        marker: Arc<dyn SessionMarker>,
    ) -> Self {
        let bootstrap_store = store.clone();
        let chain = spawn_link(async move {
            session::bootstrap(
                &options,
                bootstrap_store.as_ref(),
                resolver.as_ref(),
                marker.as_ref(),
            )
            .await
            .map_err(Arc::new)
        });

        Self { store, chain }
    }

    /// Queue recording of a finished test behind everything queued so far
    pub fn record(&mut self, test: TestCase, result: SharedTestResult) {
        let previous = self.chain.clone();
        let store = self.store.clone();

        self.chain = spawn_link(async move {
            let session_id = previous.await?;
            recorder::record(store.as_ref(), session_id, &test, &result)
                .await
                .map_err(Arc::new)
        });
    }

    /// Wait for every queued operation; yields the session id
    pub async fn finalize(&self) -> Result<String, SharedError> {
        match self.chain.clone().await {
            Ok(session_id) => {
                info!("all results flushed for session {}", session_id);
                Ok(session_id)
            }
            Err(e) => {
                error!("{}", e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Reporter for PostgresReporter {
    fn on_test_end(&mut self, test: TestCase, result: SharedTestResult) {
        self.record(test, result);
    }

    async fn on_end(&mut self) -> Result<(), SharedError> {
        self.finalize().await.map(|_| ())
    }
}

fn spawn_link<F>(link: F) -> Chain
where
    F: Future<Output = Result<String, SharedError>> + Send + 'static,
{
    let handle = tokio::spawn(link);
    async move {
        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(Arc::new(ReporterError::TaskAborted(e))),
        }
    }
    .boxed()
    .shared()
}

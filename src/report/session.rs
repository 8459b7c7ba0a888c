use log::{debug, info};

use crate::error::ReporterError;
use crate::store::{NewSession, ResultStore};
use crate::utils::config::ReporterOptions;
use crate::utils::git::CommitResolver;
use crate::utils::marker::SessionMarker;

/// Create the session row for this run and publish its id.
///
/// Any failure aborts: the marker is only written once a non-empty id came
/// back from the store.
pub async fn bootstrap(
    options: &ReporterOptions,
    store: &dyn ResultStore,
    resolver: &dyn CommitResolver,
    marker: &dyn SessionMarker,
) -> Result<String, ReporterError> {
    let commit_id = match options.explicit_commit_id() {
        Some(commit) => commit.to_string(),
        None => resolver.resolve().await?,
    };
    debug!("creating test session for commit {}", commit_id);

    let session = NewSession {
        commit_id,
        environment: options.environment.clone(),
        metadata: options.metadata.clone(),
    };

    let session_id = store
        .insert_session(&session)
        .await
        .map_err(ReporterError::bootstrap)?
        .filter(|id| !id.is_empty())
        .ok_or_else(ReporterError::empty_session_id)?;

    marker
        .write(&session_id)
        .await
        .map_err(ReporterError::bootstrap)?;

    info!(
        "test session {} started (commit {}, environment {})",
        session_id,
        session.commit_id,
        session.environment.as_deref().unwrap_or("-")
    );
    Ok(session_id)
}

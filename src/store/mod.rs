pub mod migrations;
pub mod postgres;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::report::types::{TestReport, TestStatus};

pub use postgres::PgResultStore;

/// Row inserted into `test_sessions`
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub commit_id: String,
    pub environment: Option<String>,
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Row upserted into `test_results`, keyed by `(session_id, test_name)`
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub session_id: String,
    pub test_name: String,
    /// Interval literal, e.g. `"2500 milliseconds"`
    pub duration: String,
    pub status: TestStatus,
    pub report: TestReport,
}

/// Datastore backing the reporter
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert a session and return its generated id, if the store returned one
    async fn insert_session(&self, session: &NewSession) -> Result<Option<String>, StoreError>;

    /// Insert a result, replacing every non-key field on conflict
    async fn upsert_result(&self, row: &ResultRow) -> Result<(), StoreError>;
}

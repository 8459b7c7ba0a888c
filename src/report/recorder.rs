use log::{debug, warn};

use super::naming::{build_report, is_experimental, normalize_test_name};
use super::types::{format_millis, SharedTestResult, TestCase, TestStatus};
use crate::error::ReporterError;
use crate::store::{ResultRow, ResultStore};

/// Upsert one test outcome into the session and return the session id.
///
/// A failing experimental test is persisted as it ran, then reported back to
/// the runner as skipped so it does not fail the run.
pub async fn record(
    store: &dyn ResultStore,
    session_id: String,
    test: &TestCase,
    result: &SharedTestResult,
) -> Result<String, ReporterError> {
    let test_name = normalize_test_name(&test.title_path);

    // Snapshot under the lock, never hold it across the store call
    let row = {
        let result = result.read().await;
        ResultRow {
            session_id,
            test_name: test_name.clone(),
            duration: format_millis(result.duration),
            status: result.status,
            report: build_report(&test_name, test, &result),
        }
    };

    if let Err(source) = store.upsert_result(&row).await {
        return Err(ReporterError::ResultRecording {
            session_id: row.session_id,
            test_name,
            status: row.status,
            source,
        });
    }
    debug!("recorded {} as {} ({})", test_name, row.status, row.duration);

    if row.status != TestStatus::Passed && is_experimental(test) {
        warn!(
            "experimental test {} {}, reporting it as skipped",
            test_name, row.status
        );
        result.write().await.status = TestStatus::Skipped;
    }

    Ok(row.session_id)
}

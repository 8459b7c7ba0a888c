use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;

use super::{NewSession, ResultRow, ResultStore};
use crate::error::StoreError;

/// PostgreSQL-backed store sharing one pool between bootstrap and result writes
#[derive(Clone)]
pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    /// Build a pool that connects on first use
    pub fn connect_lazy(connection_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(connection_url)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn insert_session(&self, session: &NewSession) -> Result<Option<String>, StoreError> {
        let row: Option<(uuid::Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO test_sessions (commit_id, environment, meta)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&session.commit_id)
        .bind(&session.environment)
        .bind(session.metadata.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id,)| id.to_string()))
    }

    async fn upsert_result(&self, row: &ResultRow) -> Result<(), StoreError> {
        let session_id: uuid::Uuid = row
            .session_id
            .parse()
            .map_err(|_| StoreError::InvalidSessionId(row.session_id.clone()))?;

        sqlx::query(
            r#"
            INSERT INTO test_results (test_session_id, test_name, duration, status, report)
            VALUES ($1, $2, $3::interval, $4, $5)
            ON CONFLICT (test_session_id, test_name) DO UPDATE SET
                duration = excluded.duration,
                status = excluded.status,
                report = excluded.report,
                updated_at = now()
            "#,
        )
        .bind(session_id)
        .bind(&row.test_name)
        .bind(&row.duration)
        .bind(row.status.as_str())
        .bind(Json(&row.report))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::{TestReport, TestStatus};
    use crate::store::migrations::run_migrations;
    use crate::utils::config::DATABASE_URL_ENV;
    use std::path::Path;

    fn report(test_name: &str, trace: &str) -> TestReport {
        TestReport {
            test_name: test_name.to_string(),
            otel_trace_id: trace.to_string(),
            errors: vec![],
            screenshots: vec![],
            video: None,
        }
    }

    // Needs a disposable database: DATABASE_URL=postgres://... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_upsert_replaces_row_in_postgres() {
        let Ok(url) = std::env::var(DATABASE_URL_ENV) else {
            return;
        };
        let pool = PgPoolOptions::new().max_connections(1).connect(&url).await.unwrap();
        run_migrations(&pool, &Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
            .await
            .unwrap();
        let store = PgResultStore::from_pool(pool);

        let session_id = store
            .insert_session(&NewSession {
                commit_id: "9fceb02".to_string(),
                environment: Some("ci".to_string()),
                metadata: None,
            })
            .await
            .unwrap()
            .unwrap();

        let mut row = ResultRow {
            session_id: session_id.clone(),
            test_name: "Checkout / completes purchase".to_string(),
            duration: "2500 milliseconds".to_string(),
            status: TestStatus::Failed,
            report: report("Checkout / completes purchase", "first"),
        };
        store.upsert_result(&row).await.unwrap();

        row.duration = "1234.5 milliseconds".to_string();
        row.status = TestStatus::Passed;
        row.report = report("Checkout / completes purchase", "second");
        store.upsert_result(&row).await.unwrap();

        let session: uuid::Uuid = session_id.parse().unwrap();
        let rows: Vec<(String, i64, Json<TestReport>)> = sqlx::query_as(
            r#"
            SELECT status,
                   (extract(epoch FROM duration) * 1000000)::bigint,
                   report
            FROM test_results
            WHERE test_session_id = $1
            "#,
        )
        .bind(session)
        .fetch_all(store.pool())
        .await
        .unwrap();

        assert_eq!(rows.len(), 1);
        let (status, micros, Json(stored)) = &rows[0];
        assert_eq!(status, "passed");
        assert_eq!(*micros, 1_234_500);
        assert_eq!(stored.otel_trace_id, "second");
    }
}

use log::info;
use sqlx::{Executor, PgPool};
use std::path::{Path, PathBuf};

use crate::error::{MigrationCause, ReporterError};

/// List `*.sql` files of a directory in lexical order
pub async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>, ReporterError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| ReporterError::Migration {
        file: dir.to_path_buf(),
        source: e.into(),
    })?;

    let mut files = Vec::new();
    loop {
        let entry = entries.next_entry().await.map_err(|e| ReporterError::Migration {
            file: dir.to_path_buf(),
            source: e.into(),
        })?;
        let Some(entry) = entry else { break };

        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "sql") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Apply every migration of `dir` as raw SQL, in file name order.
///
/// Not safe to run from several processes at once; call it once before the
/// runners start rather than from the reporter.
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<usize, ReporterError> {
    let files = migration_files(dir).await?;

    for file in &files {
        let sql = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| migration_error(file, e.into()))?;

        pool.execute(sql.as_str())
            .await
            .map_err(|e| migration_error(file, e.into()))?;

        info!("applied migration {}", file.display());
    }

    Ok(files.len())
}

fn migration_error(file: &Path, source: MigrationCause) -> ReporterError {
    ReporterError::Migration {
        file: file.to_path_buf(),
        source,
    }
}

//! Profile database bootstrap: file creation, pragmas and schema.

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = include_str!("schema.sql");

/// Open (creating if needed) the profile database at `db_path` and apply the schema.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    ensure_parent_dir(Path::new(db_path))?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .after_connect(|conn, _meta| Box::pin(async move { apply_pragmas(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    apply_schema(&pool).await?;

    info!("Profile database ready at {}", db_path);
    Ok(pool)
}

fn ensure_parent_dir(db_path: &Path) -> Result<(), sqlx::Error> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)
        }
        _ => Ok(()),
    }
}

/// Every statement is `IF NOT EXISTS`, so this is safe on an existing file.
async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty());
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("Profile schema applied");
    Ok(())
}

async fn apply_pragmas(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    // journal_mode answers with the mode actually in effect.
    let mode: String = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?
        .get(0);
    debug!("SQLite journal_mode: {}", mode);

    for pragma in ["PRAGMA busy_timeout = 5000", "PRAGMA synchronous = NORMAL"] {
        sqlx::query(pragma).execute(&mut *conn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn path_in(dir: &TempDir, relative: &str) -> String {
        dir.path().join(relative).to_string_lossy().to_string()
    }

    async fn kv_table_count(pool: &SqlitePool) -> i64 {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='kv_store'",
        )
        .fetch_one(pool)
        .await
        .expect("query failed");
        count
    }

    #[tokio::test]
    async fn test_creates_nested_directories_and_schema() {
        let dir = TempDir::new().unwrap();
        let db_path = path_in(&dir, "profiles/player/trail.db");

        let pool = init_db(&db_path).await.expect("init_db failed");
        assert!(Path::new(&db_path).exists());
        assert_eq!(kv_table_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_schema_reapplies_cleanly() {
        let dir = TempDir::new().unwrap();
        let pool = init_db(&path_in(&dir, "trail.db")).await.unwrap();

        apply_schema(&pool).await.expect("second schema pass failed");
        assert_eq!(kv_table_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_parent_that_is_a_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = path_in(&dir, "not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();

        let result = init_db(&format!("{}/trail.db", blocker)).await;
        assert!(matches!(result, Err(sqlx::Error::Io(_))));
    }

    #[tokio::test]
    async fn test_busy_timeout_and_journal_mode() {
        let dir = TempDir::new().unwrap();
        let pool = init_db(&path_in(&dir, "trail.db")).await.unwrap();

        let (timeout,): (i64,) = sqlx::query_as("PRAGMA busy_timeout")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(timeout, 5000);

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        // Some filesystems refuse WAL.
        assert!(matches!(mode.as_str(), "wal" | "delete"), "journal_mode {}", mode);
    }
}

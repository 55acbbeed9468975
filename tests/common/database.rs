//! Test database utilities using the real DatabaseManagerSqlx

use anyhow::Result;
use rust_bhav::database_sqlx::DatabaseManagerSqlx;
use tempfile::TempDir;

/// A database file that disappears with the test
pub struct TestDatabase {
    pub manager: DatabaseManagerSqlx,
    pub path: String,
    _dir: TempDir,
}

/// Initialize a completely fresh file-backed test database
pub async fn init_fresh_test_database() -> Result<TestDatabase> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bhav.db").to_string_lossy().to_string();
    let manager = DatabaseManagerSqlx::new(&path).await?;

    Ok(TestDatabase {
        manager,
        path,
        _dir: dir,
    })
}

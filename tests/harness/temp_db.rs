use std::path::PathBuf;

use server_manager::adapter::outbound::sqlite::{open, DbPool};
use tempfile::TempDir;

/// Migrated SQLite database in a directory removed on drop.
pub struct TempDb {
    _dir: TempDir,
    path: PathBuf,
    pool: DbPool,
}

impl TempDb {
    pub fn create(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(format!("{name}.db"));
        let pool = open(&path.to_string_lossy()).expect("open sqlite database");
        Self {
            _dir: dir,
            path,
            pool,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// A second pool on the same file, as a restarted process would open.
    pub fn reopen(&self) -> DbPool {
        open(&self.path.to_string_lossy()).expect("reopen sqlite database")
    }

    pub fn path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

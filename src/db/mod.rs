mod apps;
mod user;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use apps::{App, AppPatch, AppStore, NewApp, ReleaseOption};
pub use user::{User, UserStore};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.create_schema().await?;
        Ok(db)
    }

    /// Create the tables if they do not exist yet.
    async fn create_schema(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in [
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                password TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER)),
                updated INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER))
            )",
            "CREATE TABLE IF NOT EXISTS apps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                \"release\" TEXT NOT NULL DEFAULT '',
                path TEXT NOT NULL DEFAULT '',
                init TEXT NOT NULL DEFAULT '',
                web TEXT NOT NULL DEFAULT '',
                title TEXT NOT NULL DEFAULT '',
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_apps_name ON apps(name)",
        ] {
            sqlx::query(query).execute(&mut *tx).await?;
        }
        tx.commit().await
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the apps store.
    pub fn apps(&self) -> AppStore {
        AppStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = Database::open(":memory:").await.unwrap();
        db.create_schema().await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM apps")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }
}

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use crate::auth::{DirectoryError, UserDirectory, UserRecord};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    active: i32,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password,
            active: row.active != 0,
        }
    }
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            active: user.active,
        }
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an active user with an already hashed password. Returns the user ID.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO users (username, email, password, active) VALUES (?, ?, ?, 1)")
                .bind(username)
                .bind(email)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Enable or disable login for a user.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET active = ?, updated = CAST(strftime('%s', 'now') AS INTEGER) WHERE id = ?",
        )
        .bind(active as i32)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password, active FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, email, password, active FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserDirectory for UserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        if email.is_empty() {
            return Ok(None);
        }
        Ok(self.get_by_email(email).await?.map(UserRecord::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.get_by_id(id).await?.map(UserRecord::from))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db
            .users()
            .create("alice", "alice@example.com", "hash")
            .await
            .unwrap();

        let user = db
            .users()
            .get_by_email("ALICE@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "alice");
        assert_eq!(user.password_hash, "hash");
        assert!(user.active);

        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.users()
            .create("alice", "alice@example.com", "hash")
            .await
            .unwrap();
        let result = db.users().create("alice2", "alice@example.com", "hash").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_directory_lookup() {
        use crate::auth::UserDirectory;

        let db = Database::open(":memory:").await.unwrap();
        let users = db.users();
        let id = users.create("bob", "bob@example.com", "hash").await.unwrap();
        users.set_active(id, false).await.unwrap();

        let record = users.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.email, "bob@example.com");
        assert!(!record.active);

        assert!(users.find_by_email("").await.unwrap().is_none());
        assert!(users.find_by_email("nobody@example.com").await.unwrap().is_none());
    }
}

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct AppStore {
    pool: SqlitePool,
}

/// A catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct App {
    pub id: i64,
    pub name: String,
    pub release: String,
    pub path: String,
    pub init: String,
    pub web: String,
    pub title: String,
    /// Unix seconds
    pub created: i64,
    /// Unix seconds
    pub updated: i64,
}

/// A release value offered when editing an app. The ID is the value itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseOption {
    pub id: String,
    pub value: String,
}

/// Fields supplied when creating an app.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewApp {
    pub name: String,
    pub release: String,
    pub path: String,
    pub init: String,
    pub web: String,
    pub title: String,
}

/// Fields that may change on update. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppPatch {
    pub name: Option<String>,
    pub release: Option<String>,
    pub path: Option<String>,
    pub init: Option<String>,
    pub web: Option<String>,
    pub title: Option<String>,
    pub created: Option<i64>,
}

impl App {
    /// Apply a patch and stamp the update time.
    pub fn apply(&mut self, patch: AppPatch, now: i64) {
        let AppPatch {
            name,
            release,
            path,
            init,
            web,
            title,
            created,
        } = patch;

        for (field, value) in [
            (&mut self.name, name),
            (&mut self.release, release),
            (&mut self.path, path),
            (&mut self.init, init),
            (&mut self.web, web),
            (&mut self.title, title),
        ] {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(created) = created {
            self.created = created;
        }
        self.updated = now;
    }
}

const SELECT_APP: &str =
    "SELECT id, name, \"release\", path, init, web, title, created, updated FROM apps";

impl AppStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all apps ordered by name.
    pub async fn list(&self) -> Result<Vec<App>, sqlx::Error> {
        sqlx::query_as(&format!("{} ORDER BY name, id", SELECT_APP))
            .fetch_all(&self.pool)
            .await
    }

    /// Distinct non-empty release values in the catalogue, sorted.
    pub async fn releases(&self) -> Result<Vec<ReleaseOption>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT \"release\" FROM apps WHERE \"release\" <> '' ORDER BY \"release\"",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(value,)| ReleaseOption {
                id: value.clone(),
                value,
            })
            .collect())
    }

    /// Get an app by ID.
    pub async fn get(&self, id: i64) -> Result<Option<App>, sqlx::Error> {
        sqlx::query_as(&format!("{} WHERE id = ?", SELECT_APP))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Insert an app. Returns the new ID.
    pub async fn insert(&self, app: &NewApp, now: i64) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO apps (name, \"release\", path, init, web, title, created, updated)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&app.name)
        .bind(&app.release)
        .bind(&app.path)
        .bind(&app.init)
        .bind(&app.web)
        .bind(&app.title)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrite every column of an existing app. Returns false if it does not exist.
    pub async fn update(&self, app: &App) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE apps SET name = ?, \"release\" = ?, path = ?, init = ?, web = ?, title = ?,
                created = ?, updated = ?
             WHERE id = ?",
        )
        .bind(&app.name)
        .bind(&app.release)
        .bind(&app.path)
        .bind(&app.init)
        .bind(&app.web)
        .bind(&app.title)
        .bind(app.created)
        .bind(app.updated)
        .bind(app.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an app by ID. Returns false if it did not exist.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM apps WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

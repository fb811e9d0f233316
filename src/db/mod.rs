use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::Config;
use crate::models::{Project, Task};

/// Attempts made to bring up the schema before giving up.
const INIT_MAX_RETRIES: u32 = 3;
/// Base delay for the initialization backoff; doubles per attempt.
const INIT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Column list for task queries; `column_name` maps to `Task::column`.
const TASK_COLUMNS: &str = "id, content, color, owner, column_name, created_at, updated_at";

/// Database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(config.database_url())?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Idempotently ensure the projects and tasks tables exist.
    pub async fn create_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS projects (
                code TEXT PRIMARY KEY,
                title TEXT,
                admin_name TEXT,
                created_at TEXT,
                logo_base64 TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                project_code TEXT,
                content TEXT,
                color TEXT,
                owner TEXT,
                column_name TEXT,
                created_at TEXT,
                updated_at TEXT,
                FOREIGN KEY (project_code) REFERENCES projects(code)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert project metadata by code.
    pub async fn save_project(&self, project: &Project) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT OR REPLACE INTO projects
                (code, title, admin_name, created_at, logo_base64)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&project.code)
        .bind(&project.title)
        .bind(&project.admin_name)
        .bind(project.created_at)
        .bind(&project.logo_base64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load project metadata, or `None` when the code is unknown.
    pub async fn load_project(&self, code: &str) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT code, title, admin_name, created_at, logo_base64
             FROM projects WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }

    /// Atomically replace the entire task set for a project.
    ///
    /// Not a merge: callers pass the complete desired task list, existing
    /// rows for the code are deleted first. Concurrent writers race at this
    /// whole-project granularity and the later write wins.
    pub async fn save_tasks(&self, project_code: &str, tasks: &[Task]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tasks WHERE project_code = ?")
            .bind(project_code)
            .execute(&mut *tx)
            .await?;

        for task in tasks {
            sqlx::query(
                "INSERT INTO tasks
                    (id, project_code, content, color, owner, column_name, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(task.id)
            .bind(project_code)
            .bind(&task.content)
            .bind(&task.color)
            .bind(&task.owner)
            .bind(task.column)
            .bind(task.created_at)
            .bind(task.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Load every task for a project; no ordering is guaranteed.
    pub async fn load_tasks(&self, project_code: &str) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE project_code = ?");
        sqlx::query_as::<_, Task>(&query)
            .bind(project_code)
            .fetch_all(&self.pool)
            .await
    }
}

/// Initialize the database connection pool and schema.
///
/// Transient failures are retried with exponential backoff plus random
/// jitter; exhausting the retries is fatal and the application must not
/// proceed.
pub async fn init(config: &Config) -> Result<Database> {
    let mut delay = INIT_RETRY_DELAY;

    for attempt in 1..=INIT_MAX_RETRIES {
        let result = match Database::new(config).await {
            Ok(db) => db.create_tables().await.map(|_| db).map_err(Into::into),
            Err(e) => Err(e),
        };

        match result {
            Ok(db) => return Ok(db),
            Err(e) if attempt < INIT_MAX_RETRIES => {
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..1000));
                tracing::warn!(
                    attempt,
                    error = %e,
                    retry_in = ?(delay + jitter),
                    "database initialization failed, retrying"
                );
                tokio::time::sleep(delay + jitter).await;
                delay *= 2;
            }
            Err(e) => {
                return Err(e).context("failed to initialize database after retries");
            }
        }
    }

    unreachable!("retry loop either returns or errors on the last attempt")
}

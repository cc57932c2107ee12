use crate::types::{AppError, NewUser, Result, User};
use chrono::Utc;
use libsql::{Builder, Connection, Database, Row};
use uuid::Uuid;

/// libsql-backed store for accounts and catalog documents.
///
/// A single connection is opened at construction and shared; libsql
/// connections are cheap to clone and serialise statements internally. All
/// writes are single statements, so concurrent requests never interleave
/// inside a transaction.
pub struct TursoClient {
    _db: Database,
    conn: Connection,
}

pub(crate) fn db_err(e: libsql::Error) -> AppError {
    AppError::Database(e.to_string())
}

impl TursoClient {
    /// Ephemeral in-process database (tests, local experiments).
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    /// File-backed SQLite database; parent directories are created.
    pub async fn new_local(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        AppError::Database(format!("Failed to create {}: {}", parent.display(), e))
                    })?;
                }
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {}: {}", path, e)))?;

        Self::from_database(db).await
    }

    /// Remote libsql/Turso database.
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self { _db: db, conn };
        client.initialize_schema().await?;

        Ok(client)
    }

    pub fn connection(&self) -> Result<Connection> {
        Ok(self.conn.clone())
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                phone TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                image TEXT,
                tag TEXT NOT NULL DEFAULT '[]'
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create articles table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                image TEXT
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create categories table: {}", e)))?;

        // image/category/tag are JSON arrays of strings
        conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                image TEXT NOT NULL DEFAULT '[]',
                category TEXT NOT NULL DEFAULT '[]',
                tag TEXT NOT NULL DEFAULT '[]',
                hot INTEGER NOT NULL DEFAULT 0,
                is_new INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create products table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS image_sliders (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                image TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create image_sliders table: {}", e)))?;

        Ok(())
    }

    // User operations

    /// Creates the first and only account, as an admin.
    ///
    /// The emptiness check and the insert are one statement, so two racing
    /// registrations cannot both succeed.
    pub async fn bootstrap_admin(&self, new_user: NewUser) -> Result<User> {
        let conn = self.connection()?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();

        let inserted = conn
            .execute(
                "INSERT INTO users (id, name, email, phone, password_hash, is_admin, created_at)
                 SELECT ?, ?, ?, ?, ?, 1, ?
                 WHERE NOT EXISTS (SELECT 1 FROM users)",
                (
                    id.as_str(),
                    new_user.name.as_str(),
                    new_user.email.as_str(),
                    new_user.phone.as_str(),
                    new_user.password_hash.as_str(),
                    now,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create user: {}", e)))?;

        if inserted == 0 {
            return Err(AppError::Conflict("Admin already exists".to_string()));
        }

        Ok(User {
            id,
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            is_admin: true,
        })
    }

    pub async fn user_count(&self) -> Result<u64> {
        let conn = self.connection()?;

        let mut rows = conn
            .query("SELECT COUNT(*) FROM users", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count users: {}", e)))?;

        let count: i64 = match rows.next().await.map_err(db_err)? {
            Some(row) => row.get(0).map_err(db_err)?,
            None => 0,
        };

        Ok(count.max(0) as u64)
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.find_user("id", id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user("email", email).await
    }

    async fn find_user(&self, column: &'static str, value: &str) -> Result<Option<User>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                &format!(
                    "SELECT id, name, email, phone, password_hash, is_admin
                     FROM users WHERE {} = ?",
                    column
                ),
                [value],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

fn user_from_row(row: &Row) -> Result<User> {
    Ok(User {
        id: row.get(0).map_err(db_err)?,
        name: row.get(1).map_err(db_err)?,
        email: row.get(2).map_err(db_err)?,
        phone: row.get(3).map_err(db_err)?,
        password_hash: row.get(4).map_err(db_err)?,
        is_admin: row.get::<i64>(5).map_err(db_err)? != 0,
    })
}

//! # Database Infrastructure
//!
//! This crate provides a unified interface for initializing and sharing a
//! [SQLite](https://sqlite.org) connection pool (through [`sqlx`]) across the workspace.
//!
//! ## Key Features
//! - **File or memory**: `sqlite://cape.db` and `sqlite::memory:` URLs are both supported.
//!   In-memory databases are pinned to a single long-lived connection so the data survives.
//! - **Resilient Connectivity**: Built-in retry logic for health checks during startup.
//! - **Migrations**: Slices register versioned scripts that are applied once and checksummed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cape_database::{Database, DatabaseError, Migration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder()
//!         .url("sqlite::memory:")
//!         .migration(Migration::new("demo", "0001", "CREATE TABLE demo (id INTEGER PRIMARY KEY);"))
//!         .init()
//!         .await?;
//!
//!     db.health().await?;
//!     Ok(())
//! }
//! ```

mod error;
mod migrations;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use migrations::{AppliedMigration, Migration, MigrationReport};

use migrations::MigrationRunner;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, trace, warn};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const HEALTH_ATTEMPTS: u32 = 3;

/// Inner state of the [`Database`] wrapper.
#[derive(Debug)]
pub struct DatabaseInner {
    pool: SqlitePool,
    url: String,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        debug!(url = %self.url, "SQLite pool handle dropped");
    }
}

/// `SQLite` pool wrapper that provides cheap cloning and contextual error handling.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Creates a new [`DatabaseBuilder`].
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// The URL the pool was opened with.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Checks out a connection for read-only work.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, DatabaseError> {
        self.inner.pool.acquire().await.context("Acquiring connection")
    }

    /// Starts a transaction. Dropping it without `commit` rolls it back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, DatabaseError> {
        self.inner.pool.begin().await.context("Starting transaction")
    }

    /// Runs a trivial query against the pool.
    pub async fn health(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.inner.pool).await.context("Health check")?;
        Ok(())
    }
}

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.inner.pool
    }
}

/// A fluent builder for configuring and opening the `SQLite` pool.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    url: Option<String>,
    max_connections: Option<u32>,
    migrations: Vec<Migration>,
}

impl DatabaseBuilder {
    /// Creates a new [`DatabaseBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Caps the pool size. Ignored for in-memory databases.
    pub const fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// Registers a single migration.
    pub fn migration(mut self, migration: Migration) -> Self {
        self.migrations.push(migration);
        self
    }

    /// Registers multiple migrations at once, preserving their order.
    pub fn migrations<I>(mut self, migrations: I) -> Self
    where
        I: IntoIterator<Item = Migration>,
    {
        self.migrations.extend(migrations);
        self
    }

    /// Consumes the builder and opens the pool.
    ///
    /// # Process
    /// 1. **Validation**: Ensures a URL was provided and parses it.
    /// 2. **Pool**: Opens the pool, creating the database file when missing and
    ///    enabling foreign key enforcement on every connection.
    /// 3. **Resilience**: Performs up to 3 health checks. If the first check fails,
    ///    it retries with exponential backoff (starting at 500ms).
    /// 4. **Migrations**: Applies every registered migration that has not run yet.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if the URL is missing or malformed.
    /// * [`DatabaseError::Connection`] if the pool cannot be opened or stays unhealthy.
    /// * [`DatabaseError::Migration`] / [`DatabaseError::Sql`] if a migration fails.
    #[instrument(skip(self), fields(url = self.url))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let url = self.url.ok_or(DatabaseError::Validation {
            message: "URL is required".into(),
            context: None,
        })?;

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DatabaseError::Validation {
                message: e.to_string().into(),
                context: Some("Parsing database URL".into()),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if is_in_memory(&url) {
            // Every connection to `:memory:` opens a fresh database, so keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS).max(1))
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            DatabaseError::Connection {
                message: e.to_string().into(),
                context: Some("Opening pool".into()),
            }
        })?;

        let db = Database { inner: Arc::new(DatabaseInner { pool, url }) };

        let mut delay = Duration::from_millis(500);
        for attempt in 1..=HEALTH_ATTEMPTS {
            match db.health().await {
                Ok(()) => break,
                Err(error) if attempt == HEALTH_ATTEMPTS => {
                    return Err(DatabaseError::Connection {
                        message: format!("Unhealthy after retries: {error}").into(),
                        context: Some(db.inner.url.clone().into()),
                    });
                },
                Err(error) => {
                    warn!(attempt, ?delay, %error, "Database not ready, retrying...");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                },
            }
        }
        info!("SQLite connection established");

        info!("Applying database migrations...");
        let migration_report = MigrationRunner::new(&db).run(&self.migrations).await?;
        for skipped in migration_report.skipped {
            trace!(slice = skipped.slice, version = skipped.version, "Skipping migration");
        }
        for applied in migration_report.applied {
            info!(slice = applied.slice, version = applied.version, "Applied migration");
        }
        info!("Database migrations applied successfully");

        Ok(db)
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_are_detected() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:heroes?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://cape.db"));
    }
}

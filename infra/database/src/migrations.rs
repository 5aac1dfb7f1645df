use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

const BOOKKEEPING: &str = "CREATE TABLE IF NOT EXISTS _cape_migrations (
    slice      TEXT NOT NULL,
    version    TEXT NOT NULL,
    checksum   TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (slice, version)
)";

/// A versioned SQL script owned by a feature slice.
///
/// Scripts are applied in the order they are registered and recorded together
/// with a SHA-256 checksum. Editing an applied script aborts startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub slice: &'static str,
    pub version: &'static str,
    pub script: &'static str,
}

impl Migration {
    #[must_use]
    pub const fn new(slice: &'static str, version: &'static str, script: &'static str) -> Self {
        Self { slice, version, script }
    }

    /// Hex-encoded SHA-256 of the script.
    #[must_use]
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.script.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn key(&self) -> String {
        format!("{}:{}", self.slice, self.version)
    }

    fn to_applied(self) -> AppliedMigration {
        AppliedMigration {
            slice: self.slice.to_owned(),
            version: self.version.to_owned(),
            checksum: self.checksum(),
        }
    }
}

/// Outcome of a migration run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    pub skipped: Vec<AppliedMigration>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AppliedMigration {
    pub slice: String,
    pub version: String,
    pub checksum: String,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MigrationRunner<'a> {
    #[must_use]
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) async fn run(&self, migrations: &[Migration]) -> Result<MigrationReport, DatabaseError> {
        sqlx::raw_sql(BOOKKEEPING)
            .execute(self.pool)
            .await
            .context("Preparing migrations table")?;

        let mut report = MigrationReport::default();
        let applied_migrations = self.get_migrations_map().await?;

        for migration in migrations {
            if let Some(applied) = applied_migrations.get(&migration.key()) {
                ensure_checksum_match(migration, &applied.checksum)?;
                report.skipped.push(migration.to_applied());
                continue;
            }

            self.apply_migration(migration).await?;
            report.applied.push(migration.to_applied());
        }

        Ok(report)
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), DatabaseError> {
        let failed_at = format!("SQL execution failed at {}", migration.key());
        let mut tx = self.pool.begin().await.context("Starting migration transaction")?;

        sqlx::raw_sql(migration.script).execute(&mut *tx).await.context(failed_at)?;

        sqlx::query("INSERT INTO _cape_migrations (slice, version, checksum) VALUES (?, ?, ?)")
            .bind(migration.slice)
            .bind(migration.version)
            .bind(migration.checksum())
            .execute(&mut *tx)
            .await
            .context("Recording migration")?;

        tx.commit().await.context("Committing migration")?;
        Ok(())
    }

    async fn get_migrations_map(
        &self,
    ) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        let entries = sqlx::query_as::<_, AppliedMigration>(
            "SELECT slice, version, checksum FROM _cape_migrations",
        )
        .fetch_all(self.pool)
        .await
        .context("Loading applied migrations")?;

        Ok(entries
            .into_iter()
            .map(|entry| (format!("{}:{}", entry.slice, entry.version), entry))
            .collect())
    }
}

fn ensure_checksum_match(migration: &Migration, existing: &str) -> Result<(), DatabaseError> {
    let checksum = migration.checksum();
    if existing != checksum {
        return Err(DatabaseError::Migration {
            message: format!(
                "Checksum mismatch for {} (expected {existing}, got {checksum})",
                migration.key()
            )
            .into(),
            context: Some("Migration already applied with different checksum".into()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_stable_hex_sha256() {
        let migration = Migration::new("heroes", "0001", "SELECT 1;");

        let checksum = migration.checksum();

        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, Migration::new("other", "9999", "SELECT 1;").checksum());
        assert_ne!(checksum, Migration::new("heroes", "0001", "SELECT 2;").checksum());
    }

    #[test]
    fn mismatched_checksum_is_rejected() {
        let migration = Migration::new("heroes", "0001", "SELECT 1;");

        let err = ensure_checksum_match(&migration, "deadbeef").unwrap_err();

        assert!(matches!(err, DatabaseError::Migration { .. }));
        assert!(err.to_string().contains("heroes:0001"));
    }
}

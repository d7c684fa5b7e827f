//! SqliteBackend - Embedded File Storage
//!
//! TigerStyle: One file, WAL journal, schema created on init.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS tally_kills (
//!     killer_uuid TEXT NOT NULL,
//!     victim_uuid TEXT NOT NULL,
//!     weapon TEXT NOT NULL,
//!     date INTEGER NOT NULL,
//!     victim_name TEXT,
//!     killer_name TEXT,
//!     PRIMARY KEY (killer_uuid, victim_uuid, weapon, date)
//! );
//! CREATE INDEX IF NOT EXISTS idx_tally_kills_victim ON tally_kills(victim_uuid);
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use uuid::Uuid;

use super::backend::{assert_query_limit, KillStore, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::kill::{DateHolder, PlayerKill};
use super::sql::{count_to_usize, parse_uuid, timeout_from_secs};
use crate::config::SqliteSettings;

/// Backend name used in diagnostics.
const BACKEND_NAME: &str = "SQLite";

/// SQLite serializes writers; more connections only add lock contention.
const SQLITE_POOL_CONNECTIONS_COUNT: u32 = 4;

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS tally_kills (
        killer_uuid TEXT NOT NULL,
        victim_uuid TEXT NOT NULL,
        weapon TEXT NOT NULL,
        date INTEGER NOT NULL,
        victim_name TEXT,
        killer_name TEXT,
        PRIMARY KEY (killer_uuid, victim_uuid, weapon, date)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tally_kills_victim ON tally_kills(victim_uuid)",
];

// =============================================================================
// SqliteBackend
// =============================================================================

/// SQLite storage backend.
pub struct SqliteBackend {
    settings: SqliteSettings,
    pool: Option<SqlitePool>,
}

impl SqliteBackend {
    /// Create an uninitialized backend. Nothing is opened until `init`.
    #[must_use]
    pub fn new(settings: SqliteSettings) -> Self {
        Self {
            settings,
            pool: None,
        }
    }

    /// Database file this backend opens.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.settings.file
    }

    fn pool(&self) -> StorageResult<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| StorageError::not_initialized(BACKEND_NAME))
    }

    async fn open(&self) -> StorageResult<SqlitePool> {
        let path: PathBuf = self.settings.file.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::connection(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let timeout = timeout_from_secs(self.settings.connect_timeout_secs);
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(timeout);

        SqlitePoolOptions::new()
            .max_connections(SQLITE_POOL_CONNECTIONS_COUNT)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                StorageError::connection(format!("failed to open {}: {e}", path.display()))
            })
    }
}

async fn init_schema(pool: &SqlitePool) -> StorageResult<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StorageError::migration(format!("failed to create schema: {e}")))?;
    }
    Ok(())
}

/// Parse a database row into a PlayerKill.
fn row_to_kill(row: &SqliteRow) -> StorageResult<PlayerKill> {
    let victim: String = row
        .try_get("victim_uuid")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let weapon: String = row
        .try_get("weapon")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let date: i64 = row
        .try_get("date")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let victim_name: Option<String> = row
        .try_get("victim_name")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let killer_name: Option<String> = row
        .try_get("killer_name")
        .map_err(|e| StorageError::internal(e.to_string()))?;

    PlayerKill::from_stored(
        parse_uuid("victim_uuid", &victim)?,
        weapon,
        date,
        victim_name,
        killer_name,
    )
}

fn rows_to_kills(rows: &[SqliteRow], limit: usize) -> StorageResult<Vec<PlayerKill>> {
    let kills = rows.iter().map(row_to_kill).collect::<StorageResult<Vec<_>>>()?;

    // Postcondition
    assert!(
        kills.len() <= limit,
        "result count {} exceeds limit {}",
        kills.len(),
        limit
    );
    Ok(kills)
}

// =============================================================================
// StorageBackend Implementation
// =============================================================================

#[async_trait]
impl KillStore for SqliteBackend {
    async fn store_kill(&self, killer: Uuid, kill: &PlayerKill) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tally_kills (killer_uuid, victim_uuid, weapon, date, victim_name, killer_name)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (killer_uuid, victim_uuid, weapon, date) DO UPDATE SET
                victim_name = excluded.victim_name,
                killer_name = excluded.killer_name
            "#,
        )
        .bind(killer.to_string())
        .bind(kill.victim().to_string())
        .bind(kill.weapon())
        .bind(kill.date())
        .bind(kill.victim_name())
        .bind(kill.killer_name())
        .execute(self.pool()?)
        .await
        .map_err(|e| StorageError::write(format!("failed to store kill: {e}")))?;

        Ok(())
    }

    async fn player_kills(&self, killer: Uuid, limit: usize) -> StorageResult<Vec<PlayerKill>> {
        assert_query_limit(limit);

        let rows = sqlx::query(
            r#"
            SELECT victim_uuid, weapon, date, victim_name, killer_name FROM tally_kills
            WHERE killer_uuid = ?1
            ORDER BY date DESC
            LIMIT ?2
            "#,
        )
        .bind(killer.to_string())
        .bind(limit as i64)
        .fetch_all(self.pool()?)
        .await
        .map_err(|e| StorageError::read(format!("failed to list kills: {e}")))?;

        rows_to_kills(&rows, limit)
    }

    async fn player_deaths(&self, victim: Uuid, limit: usize) -> StorageResult<Vec<PlayerKill>> {
        assert_query_limit(limit);

        let rows = sqlx::query(
            r#"
            SELECT victim_uuid, weapon, date, victim_name, killer_name FROM tally_kills
            WHERE victim_uuid = ?1
            ORDER BY date DESC
            LIMIT ?2
            "#,
        )
        .bind(victim.to_string())
        .bind(limit as i64)
        .fetch_all(self.pool()?)
        .await
        .map_err(|e| StorageError::read(format!("failed to list deaths: {e}")))?;

        rows_to_kills(&rows, limit)
    }

    async fn kill_count(&self, killer: Option<Uuid>) -> StorageResult<usize> {
        let pool = self.pool()?;
        let count: i64 = match killer {
            Some(killer) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM tally_kills WHERE killer_uuid = ?1")
                    .bind(killer.to_string())
                    .fetch_one(pool)
                    .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM tally_kills")
                    .fetch_one(pool)
                    .await
            }
        }
        .map_err(|e| StorageError::read(format!("failed to count kills: {e}")))?;

        count_to_usize(count)
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn init(&mut self) -> StorageResult<()> {
        // Precondition
        assert!(self.pool.is_none(), "init called twice on {BACKEND_NAME}");

        let pool = self.open().await?;
        if let Err(e) = init_schema(&pool).await {
            pool.close().await;
            return Err(e);
        }

        tracing::info!(path = %self.settings.file.display(), "SQLite database ready");
        self.pool = Some(pool);
        Ok(())
    }

    async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            tracing::info!("SQLite connections closed");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! MySqlBackend - Client/Server Storage
//!
//! TigerStyle: Connection pooling, explicit schema, bounded connect time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      MySqlBackend                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pool: sqlx::MySqlPool (connection pooling)                  │
//! │  Table: tally_kills (killer, victim, weapon, date, names)    │
//! │  Index: PK prefix on killer, btree on victim                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS tally_kills (
//!     killer_uuid CHAR(36) NOT NULL,
//!     victim_uuid CHAR(36) NOT NULL,
//!     weapon VARCHAR(64) NOT NULL,
//!     date BIGINT NOT NULL,
//!     victim_name VARCHAR(36) NULL,
//!     killer_name VARCHAR(36) NULL,
//!     PRIMARY KEY (killer_uuid, victim_uuid, weapon, date),
//!     INDEX idx_tally_kills_victim (victim_uuid)
//! ) CHARACTER SET utf8mb4;
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use uuid::Uuid;

use super::backend::{assert_query_limit, KillStore, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::kill::{DateHolder, PlayerKill};
use super::sql::{count_to_usize, parse_uuid, timeout_from_secs};
use crate::config::MySqlSettings;
use crate::constants::POOL_CONNECTIONS_COUNT_MAX;

/// Backend name used in diagnostics.
const BACKEND_NAME: &str = "MySQL";

const SCHEMA_STATEMENTS: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS tally_kills (
        killer_uuid CHAR(36) NOT NULL,
        victim_uuid CHAR(36) NOT NULL,
        weapon VARCHAR(64) NOT NULL,
        date BIGINT NOT NULL,
        victim_name VARCHAR(36) NULL,
        killer_name VARCHAR(36) NULL,
        PRIMARY KEY (killer_uuid, victim_uuid, weapon, date),
        INDEX idx_tally_kills_victim (victim_uuid)
    ) CHARACTER SET utf8mb4
    "#];

// =============================================================================
// MySqlBackend
// =============================================================================

/// MySQL storage backend.
pub struct MySqlBackend {
    settings: MySqlSettings,
    pool: Option<MySqlPool>,
}

impl MySqlBackend {
    /// Create an uninitialized backend. No connection is made until `init`.
    #[must_use]
    pub fn new(settings: MySqlSettings) -> Self {
        Self {
            settings,
            pool: None,
        }
    }

    fn pool(&self) -> StorageResult<&MySqlPool> {
        self.pool
            .as_ref()
            .ok_or_else(|| StorageError::not_initialized(BACKEND_NAME))
    }

    /// Build connect options from settings.
    ///
    /// Launch options are parsed as the query part of a `mysql://` URL;
    /// credentials are set separately so they never need URL escaping.
    fn connect_options(&self) -> StorageResult<MySqlConnectOptions> {
        let settings = &self.settings;
        if settings.host.trim().is_empty() {
            return Err(StorageError::config("mysql host is empty"));
        }
        if settings.database.trim().is_empty() {
            return Err(StorageError::config("mysql database is empty"));
        }
        let launch_options = settings.launch_options.trim();
        if !launch_options.is_empty() && !launch_options.starts_with('?') {
            return Err(StorageError::config(format!(
                "launch options must start with '?': {launch_options}"
            )));
        }

        let url = format!(
            "mysql://{}:{}/{}{}",
            settings.host.trim(),
            settings.port,
            settings.database.trim(),
            launch_options
        );
        let options = MySqlConnectOptions::from_str(&url)
            .map_err(|e| StorageError::config(format!("invalid mysql settings: {e}")))?;

        let mut options = options.username(&settings.user);
        if !settings.password.is_empty() {
            options = options.password(&settings.password);
        }
        Ok(options)
    }
}

async fn init_schema(pool: &MySqlPool) -> StorageResult<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StorageError::migration(format!("failed to create schema: {e}")))?;
    }
    Ok(())
}

/// Parse a database row into a PlayerKill.
fn row_to_kill(row: &MySqlRow) -> StorageResult<PlayerKill> {
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

// =============================================================================
// StorageBackend Implementation
// =============================================================================

#[async_trait]
impl KillStore for MySqlBackend {
    async fn store_kill(&self, killer: Uuid, kill: &PlayerKill) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tally_kills (killer_uuid, victim_uuid, weapon, date, victim_name, killer_name)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                victim_name = VALUES(victim_name),
                killer_name = VALUES(killer_name)
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
            WHERE killer_uuid = ?
            ORDER BY date DESC
            LIMIT ?
            "#,
        )
        .bind(killer.to_string())
        .bind(limit as i64)
        .fetch_all(self.pool()?)
        .await
        .map_err(|e| StorageError::read(format!("failed to list kills: {e}")))?;

        rows.iter().map(row_to_kill).collect()
    }

    async fn player_deaths(&self, victim: Uuid, limit: usize) -> StorageResult<Vec<PlayerKill>> {
        assert_query_limit(limit);

        let rows = sqlx::query(
            r#"
            SELECT victim_uuid, weapon, date, victim_name, killer_name FROM tally_kills
            WHERE victim_uuid = ?
            ORDER BY date DESC
            LIMIT ?
            "#,
        )
        .bind(victim.to_string())
        .bind(limit as i64)
        .fetch_all(self.pool()?)
        .await
        .map_err(|e| StorageError::read(format!("failed to list deaths: {e}")))?;

        rows.iter().map(row_to_kill).collect()
    }

    async fn kill_count(&self, killer: Option<Uuid>) -> StorageResult<usize> {
        let pool = self.pool()?;
        let count: i64 = match killer {
            Some(killer) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM tally_kills WHERE killer_uuid = ?")
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
impl StorageBackend for MySqlBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn init(&mut self) -> StorageResult<()> {
        // Precondition
        assert!(self.pool.is_none(), "init called twice on {BACKEND_NAME}");

        let options = self.connect_options()?;
        let pool = MySqlPoolOptions::new()
            .max_connections(self.settings.max_connections.clamp(1, POOL_CONNECTIONS_COUNT_MAX))
            .acquire_timeout(timeout_from_secs(self.settings.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| {
                StorageError::connection(format!(
                    "failed to connect to {}:{}: {e}",
                    self.settings.host, self.settings.port
                ))
            })?;

        if let Err(e) = init_schema(&pool).await {
            pool.close().await;
            return Err(e);
        }

        tracing::info!(
            host = %self.settings.host,
            port = self.settings.port,
            database = %self.settings.database,
            "MySQL database ready"
        );
        self.pool = Some(pool);
        Ok(())
    }

    async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            tracing::info!("MySQL connections closed");
        }
    }
}

// =============================================================================
// Tests (live tests require running MySQL)
// =============================================================================

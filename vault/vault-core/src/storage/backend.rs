//! StorageBackend - The Backend Contract
//!
//! TigerStyle: Lifecycle and data access are separate traits. Collaborators
//! only ever see [`KillStore`]; the resolver is the only caller of the
//! lifecycle half.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::StorageResult;
use super::kill::PlayerKill;

/// Read/write operations on kill records.
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait KillStore: Send + Sync {
    /// Store a kill owned by `killer`.
    ///
    /// Kills are keyed by (killer, victim, weapon, date). Storing an equal
    /// kill again refreshes its display names and adds no row.
    async fn store_kill(&self, killer: Uuid, kill: &PlayerKill) -> StorageResult<()>;

    /// Kills made by `killer`, newest first.
    ///
    /// `limit` must be in `1..=KILLS_QUERY_LIMIT_MAX`.
    async fn player_kills(&self, killer: Uuid, limit: usize) -> StorageResult<Vec<PlayerKill>>;

    /// Kills suffered by `victim`, newest first.
    ///
    /// `limit` must be in `1..=KILLS_QUERY_LIMIT_MAX`.
    async fn player_deaths(&self, victim: Uuid, limit: usize) -> StorageResult<Vec<PlayerKill>>;

    /// Number of stored kills, optionally restricted to one killer.
    async fn kill_count(&self, killer: Option<Uuid>) -> StorageResult<usize>;
}

/// A storage implementation that can be registered and resolved.
#[async_trait]
pub trait StorageBackend: KillStore {
    /// Human readable backend name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Prepare the underlying storage.
    ///
    /// Called at most once per instance. On error, anything opened during the
    /// call must already be released when this returns.
    async fn init(&mut self) -> StorageResult<()>;

    /// Release connections and handles. Safe after a failed or partial init.
    async fn shutdown(&self);
}

/// Shared precondition for every query limit.
///
/// # Panics
/// Panics if `limit` is zero or exceeds `KILLS_QUERY_LIMIT_MAX`.
pub(crate) fn assert_query_limit(limit: usize) {
    assert!(limit > 0, "limit must be positive");
    assert!(
        limit <= crate::constants::KILLS_QUERY_LIMIT_MAX,
        "limit {} exceeds max {}",
        limit,
        crate::constants::KILLS_QUERY_LIMIT_MAX
    );
}

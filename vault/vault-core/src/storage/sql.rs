//! Helpers shared by the SQL backends.

use std::time::Duration;

use uuid::Uuid;

use super::error::{StorageError, StorageResult};

/// Parse a UUID column stored as text.
pub(crate) fn parse_uuid(column: &str, raw: &str) -> StorageResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| StorageError::internal(format!("invalid uuid in {column}: {raw:?}: {e}")))
}

/// Convert a `COUNT(*)` result.
pub(crate) fn count_to_usize(count: i64) -> StorageResult<usize> {
    usize::try_from(count).map_err(|_| StorageError::internal(format!("invalid row count: {count}")))
}

/// Timeout from a config value, never zero.
pub(crate) fn timeout_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

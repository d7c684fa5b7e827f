//! StorageError - Backend Failures
//!
//! TigerStyle: One error type for every backend, with constructor helpers so
//! call sites stay on one line.

/// Errors raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Underlying storage could not be reached (driver, host, credentials).
    #[error("connection failed: {0}")]
    Connection(String),

    /// Schema creation or upgrade failed.
    #[error("schema migration failed: {0}")]
    Migration(String),

    /// Backend settings are unusable.
    #[error("invalid backend configuration: {0}")]
    Config(String),

    /// A read failed.
    #[error("read failed: {0}")]
    Read(String),

    /// A write failed.
    #[error("write failed: {0}")]
    Write(String),

    /// Unexpected data or driver state.
    #[error("internal storage error: {0}")]
    Internal(String),

    /// Operation issued before `init` succeeded.
    #[error("backend {backend} is not initialized")]
    NotInitialized {
        /// Backend name
        backend: String,
    },

    /// Operation issued after the store was shut down.
    #[error("backend {backend} is shut down")]
    Closed {
        /// Backend name
        backend: String,
    },

    /// Failure produced by the simulation fault injector.
    #[error("injected fault: {0}")]
    FaultInjected(String),
}

impl StorageError {
    /// Connection failure.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Migration failure.
    pub fn migration(msg: impl Into<String>) -> Self {
        Self::Migration(msg.into())
    }

    /// Configuration failure.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Read failure.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Write failure.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Internal failure.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Not-initialized failure for the named backend.
    pub fn not_initialized(backend: impl Into<String>) -> Self {
        Self::NotInitialized {
            backend: backend.into(),
        }
    }

    /// Closed failure for the named backend.
    pub fn closed(backend: impl Into<String>) -> Self {
        Self::Closed {
            backend: backend.into(),
        }
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

//! Storage - Backend Contract and Implementations
//!
//! TigerStyle: Abstract storage with simulation-first testing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │           KillStore (read/write, handed to callers)          │
//! │           StorageBackend: KillStore (+ init/shutdown)        │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑                     ↑                     ↑
//!          │                     │                     │
//! ┌────────┴────────┐   ┌────────┴────────┐   ┌────────┴────────┐
//! │SimStorageBackend│   │  SqliteBackend  │   │  MySqlBackend   │
//! │   (testing)     │   │   (embedded)    │   │ (client/server) │
//! └─────────────────┘   └─────────────────┘   └─────────────────┘
//! ```

mod backend;
mod error;
mod kill;
mod sim;

#[cfg(any(feature = "sqlite", feature = "mysql"))]
mod sql;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "mysql")]
mod mysql;

pub use backend::{KillStore, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use kill::{DateHolder, PlayerKill};
pub use sim::{SimProbe, SimStorageBackend};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

#[cfg(feature = "mysql")]
pub use mysql::MySqlBackend;

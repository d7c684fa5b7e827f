//! Vault Core - Storage Backend Resolution with DST
//!
//! TigerStyle storage layer for kill analytics: several candidate databases
//! are registered, configuration picks one, and exactly that one is
//! initialized. There is no fallback.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  StorageConfig.db_type      "sqlite"        │
//! ├─────────────────────────────────────────────┤
//! │  Platform::candidates()  →  BackendRegistry │
//! │                              mysql, sqlite  │
//! ├─────────────────────────────────────────────┤
//! │  BackendResolver::resolve() → ActiveStore   │
//! ├─────────────────────────────────────────────┤
//! │  DST: SimStorageBackend + fault injection   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use vault_core::{BackendRegistry, BackendResolver, KillStore, PlayerKill, SimStorageBackend};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = BackendRegistry::new()
//!     .with("memory", SimStorageBackend::new("memory"))
//!     .unwrap();
//!
//! let mut resolver = BackendResolver::new(registry);
//! let store = resolver.resolve(" Memory ").await.unwrap();
//!
//! let killer = uuid::Uuid::new_v4();
//! let kill = PlayerKill::new(uuid::Uuid::new_v4(), "DIAMOND_SWORD", 1_700_000_000_000);
//! store.store_kill(killer, &kill).await.unwrap();
//! assert_eq!(store.kill_count(Some(killer)).await.unwrap(), 1);
//!
//! store.shutdown().await;
//! # });
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod dst;
pub mod error;
pub mod platform;
pub mod registry;
pub mod resolver;
pub mod storage;

// Re-export common types
pub use config::{MySqlSettings, SqliteSettings, StorageConfig};
pub use constants::*;
pub use error::ResolveError;
pub use platform::{Platform, UnknownPlatform};
pub use registry::{BackendDescriptor, BackendRegistry, BackendState, SelectorKey};
pub use resolver::{ActiveStore, BackendResolver, ResolverState};
pub use storage::{
    DateHolder, KillStore, PlayerKill, SimProbe, SimStorageBackend, StorageBackend,
    StorageError, StorageResult,
};

#[cfg(feature = "mysql")]
pub use storage::MySqlBackend;
#[cfg(feature = "sqlite")]
pub use storage::SqliteBackend;

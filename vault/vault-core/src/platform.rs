//! Platform Candidate Lists
//!
//! Each host platform gets a factory that builds its candidate registry.
//! The resolver itself is the same everywhere.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::error::ResolveError;
use crate::registry::BackendRegistry;

#[cfg(feature = "mysql")]
use crate::constants::SELECTOR_KEY_MYSQL;
#[cfg(feature = "sqlite")]
use crate::constants::SELECTOR_KEY_SQLITE;
#[cfg(feature = "mysql")]
use crate::storage::MySqlBackend;
#[cfg(feature = "sqlite")]
use crate::storage::SqliteBackend;

/// Host the plugin runs inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// A single game server: MySQL or embedded SQLite
    GameServer,
    /// A proxy in front of several game servers: MySQL only, since an
    /// embedded file cannot be shared between servers
    Proxy,
}

impl Platform {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GameServer => "game_server",
            Self::Proxy => "proxy",
        }
    }

    /// Build the candidate registry for this platform.
    ///
    /// Backends are created but not initialized; nothing is opened here.
    ///
    /// # Errors
    /// Only on a registration error, which would be a bug in this list.
    pub fn candidates(self, config: &StorageConfig) -> Result<BackendRegistry, ResolveError> {
        match self {
            Self::GameServer => game_server_candidates(config),
            Self::Proxy => proxy_candidates(config),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform name that matches no [`Platform`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}' (known: game_server, proxy)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    /// Case-insensitive; `-` and `_` are interchangeable, `server` is an alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "game_server" | "server" => Ok(Self::GameServer),
            "proxy" => Ok(Self::Proxy),
            _ => Err(UnknownPlatform(s.trim().to_string())),
        }
    }
}

/// Candidates for a game server: `mysql`, then `sqlite`.
///
/// # Errors
/// Only on a registration error.
#[allow(unused_variables, unused_mut)]
pub fn game_server_candidates(config: &StorageConfig) -> Result<BackendRegistry, ResolveError> {
    let mut registry = BackendRegistry::new();

    #[cfg(feature = "mysql")]
    registry.register(SELECTOR_KEY_MYSQL, MySqlBackend::new(config.mysql.clone()))?;

    #[cfg(feature = "sqlite")]
    registry.register(SELECTOR_KEY_SQLITE, SqliteBackend::new(config.sqlite.clone()))?;

    Ok(registry)
}

/// Candidates for a proxy: `mysql` only.
///
/// # Errors
/// Only on a registration error.
#[allow(unused_variables, unused_mut)]
pub fn proxy_candidates(config: &StorageConfig) -> Result<BackendRegistry, ResolveError> {
    let mut registry = BackendRegistry::new();

    #[cfg(feature = "mysql")]
    registry.register(SELECTOR_KEY_MYSQL, MySqlBackend::new(config.mysql.clone()))?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse() {
        assert_eq!("proxy".parse::<Platform>(), Ok(Platform::Proxy));
        assert_eq!("Game-Server".parse::<Platform>(), Ok(Platform::GameServer));
        assert_eq!(" server ".parse::<Platform>(), Ok(Platform::GameServer));
        assert_eq!(
            " lobby ".parse::<Platform>(),
            Err(UnknownPlatform("lobby".to_string()))
        );
    }

    #[test]
    fn test_platform_display_round_trips() {
        for platform in [Platform::GameServer, Platform::Proxy] {
            assert_eq!(platform.to_string().parse::<Platform>(), Ok(platform));
        }
    }

    #[cfg(all(feature = "mysql", feature = "sqlite"))]
    #[test]
    fn test_game_server_order() {
        let registry = Platform::GameServer
            .candidates(&StorageConfig::default())
            .unwrap();

        let keys: Vec<&str> = registry.keys().collect();
        assert_eq!(keys, vec!["mysql", "sqlite"]);

        let names: Vec<&str> = registry.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["MySQL", "SQLite"]);
    }

    #[test]
    fn test_proxy_has_no_sqlite() {
        let registry = Platform::Proxy.candidates(&StorageConfig::default()).unwrap();

        assert!(registry.lookup("sqlite").is_err());
        assert!(registry.keys().all(|k| k != "sqlite"));
    }
}

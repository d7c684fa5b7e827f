//! Storage Configuration
//!
//! TigerStyle: Every setting has a default, so an empty config file is a
//! valid config.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONNECT_TIMEOUT_SECS_DEFAULT, MYSQL_DATABASE_DEFAULT, MYSQL_HOST_DEFAULT,
    MYSQL_PORT_DEFAULT, MYSQL_USER_DEFAULT, POOL_CONNECTIONS_COUNT_DEFAULT,
    SELECTOR_KEY_DEFAULT, SQLITE_FILE_NAME_DEFAULT,
};

/// Which backend to activate and how to reach each candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Selector key of the backend to activate (case-insensitive, trimmed)
    pub db_type: String,
    /// Embedded SQLite settings
    pub sqlite: SqliteSettings,
    /// MySQL settings
    pub mysql: MySqlSettings,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_type: SELECTOR_KEY_DEFAULT.to_string(),
            sqlite: SqliteSettings::default(),
            mysql: MySqlSettings::default(),
        }
    }
}

/// Settings for the embedded SQLite backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteSettings {
    /// Database file; relative paths are resolved against the data directory
    pub file: PathBuf,
    /// Bound on waiting for the file lock and for pool connections
    pub connect_timeout_secs: u64,
}

impl SqliteSettings {
    /// Anchor a relative `file` at `base`. Absolute paths are left alone.
    pub fn resolve_against(&mut self, base: &Path) {
        if self.file.is_relative() {
            self.file = base.join(&self.file);
        }
    }
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from(SQLITE_FILE_NAME_DEFAULT),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS_DEFAULT,
        }
    }
}

/// Settings for the MySQL backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MySqlSettings {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Login user
    pub user: String,
    /// Login password
    pub password: String,
    /// Database (schema) name
    pub database: String,
    /// Extra connection parameters as a URL query string, e.g. `?ssl-mode=disabled`
    pub launch_options: String,
    /// Pool size
    pub max_connections: u32,
    /// Bound on how long `init` waits for a connection
    pub connect_timeout_secs: u64,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            host: MYSQL_HOST_DEFAULT.to_string(),
            port: MYSQL_PORT_DEFAULT,
            user: MYSQL_USER_DEFAULT.to_string(),
            password: String::new(),
            database: MYSQL_DATABASE_DEFAULT.to_string(),
            launch_options: String::new(),
            max_connections: POOL_CONNECTIONS_COUNT_DEFAULT,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS_DEFAULT,
        }
    }
}

impl fmt::Debug for MySqlSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("launch_options", &self.launch_options)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

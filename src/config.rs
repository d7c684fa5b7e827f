//! Configuration Loading
//!
//! TigerStyle: Layered, explicit precedence. CLI > environment > file > defaults.
//!
//! The config file is JSON and entirely optional. A missing file yields the
//! defaults; a malformed one is an error rather than a silent fallback.

use std::path::{Path, PathBuf};

use thiserror::Error;
use vault_core::{Platform, StorageConfig, UnknownPlatform};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Config file name inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Selector override
pub const ENV_DB_TYPE: &str = "TALLY_DB_TYPE";

/// SQLite file override
pub const ENV_SQLITE_FILE: &str = "TALLY_SQLITE_FILE";

/// MySQL host override
pub const ENV_MYSQL_HOST: &str = "TALLY_MYSQL_HOST";

/// MySQL port override
pub const ENV_MYSQL_PORT: &str = "TALLY_MYSQL_PORT";

/// MySQL user override
pub const ENV_MYSQL_USER: &str = "TALLY_MYSQL_USER";

/// MySQL password override
pub const ENV_MYSQL_PASSWORD: &str = "TALLY_MYSQL_PASSWORD";

/// MySQL database override
pub const ENV_MYSQL_DATABASE: &str = "TALLY_MYSQL_DATABASE";

// =============================================================================
// Errors
// =============================================================================

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the expected shape
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Environment variable holds an unusable value
    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// Unknown platform name
    #[error(transparent)]
    UnknownPlatform(#[from] UnknownPlatform),
}

// =============================================================================
// Overrides
// =============================================================================

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--db-type`
    pub db_type: Option<String>,
}

/// Fully resolved application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host platform, which picks the candidate list
    pub platform: Platform,
    /// Storage settings after all layers were applied
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load settings for `data_dir`.
    ///
    /// `config_path` defaults to `<data_dir>/config.json`. Environment
    /// variables are read through `env` so callers decide where they come from.
    ///
    /// # Errors
    /// Returns an error if the config file is unreadable or malformed, an
    /// environment override does not parse, or the platform is unknown.
    pub fn load<F>(
        data_dir: &Path,
        config_path: Option<&Path>,
        platform: &str,
        cli: &CliOverrides,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let platform: Platform = platform.parse()?;

        let config_path =
            config_path.map_or_else(|| data_dir.join(CONFIG_FILE_NAME), Path::to_path_buf);
        let mut storage = read_file(&config_path)?;
        apply_env(&mut storage, env)?;
        apply_cli(&mut storage, cli);
        storage.sqlite.resolve_against(data_dir);

        Ok(Self {
            platform,
            storage,
        })
    }
}

/// Read the JSON config file. A missing file yields the defaults.
///
/// # Errors
/// Returns `Read` on IO failure other than not-found, `Parse` on bad JSON.
pub fn read_file(path: &Path) -> Result<StorageConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(StorageConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Apply `TALLY_*` environment overrides.
///
/// # Errors
/// Returns `InvalidEnv` if the port is not a valid `u16`.
pub fn apply_env<F>(config: &mut StorageConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env(ENV_DB_TYPE) {
        config.db_type = value;
    }
    if let Some(value) = env(ENV_SQLITE_FILE) {
        config.sqlite.file = PathBuf::from(value);
    }
    if let Some(value) = env(ENV_MYSQL_HOST) {
        config.mysql.host = value;
    }
    if let Some(value) = env(ENV_MYSQL_PORT) {
        config.mysql.port = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            var: ENV_MYSQL_PORT,
            value,
        })?;
    }
    if let Some(value) = env(ENV_MYSQL_USER) {
        config.mysql.user = value;
    }
    if let Some(value) = env(ENV_MYSQL_PASSWORD) {
        config.mysql.password = value;
    }
    if let Some(value) = env(ENV_MYSQL_DATABASE) {
        config.mysql.database = value;
    }
    Ok(())
}

fn apply_cli(config: &mut StorageConfig, cli: &CliOverrides) {
    if let Some(db_type) = &cli.db_type {
        config.db_type.clone_from(db_type);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config =
            AppConfig::load(dir.path(), None, "game_server", &CliOverrides::default(), no_env)
                .unwrap();

        assert_eq!(config.platform, Platform::GameServer);
        assert_eq!(config.storage.db_type, "sqlite");
        assert_eq!(config.storage.sqlite.file, dir.path().join("database.db"));
    }

    #[test]
    fn test_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "db_type": "mysql", "mysql": { "host": "file-host", "user": "file-user" } }"#,
        )
        .unwrap();

        let env = env_from(&[(ENV_DB_TYPE, "env-type"), (ENV_MYSQL_HOST, "env-host")]);
        let cli = CliOverrides {
            db_type: Some("cli-type".to_string()),
        };

        let config = AppConfig::load(dir.path(), None, "proxy", &cli, env).unwrap();

        assert_eq!(config.storage.db_type, "cli-type");
        assert_eq!(config.storage.mysql.host, "env-host");
        assert_eq!(config.storage.mysql.user, "file-user");
        assert_eq!(config.storage.mysql.port, 3306);
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elsewhere.json");
        std::fs::write(&path, r#"{ "sqlite": { "file": "/var/lib/kills.db" } }"#).unwrap();

        let config = AppConfig::load(
            dir.path(),
            Some(&path),
            "game_server",
            &CliOverrides::default(),
            no_env,
        )
        .unwrap();

        assert_eq!(config.storage.sqlite.file, PathBuf::from("/var/lib/kills.db"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{ db_type: ").unwrap();

        let result =
            AppConfig::load(dir.path(), None, "game_server", &CliOverrides::default(), no_env);

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_bad_port_is_error() {
        let mut config = StorageConfig::default();

        let result = apply_env(&mut config, env_from(&[(ENV_MYSQL_PORT, "33o6")]));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { var: ENV_MYSQL_PORT, .. })
        ));
    }

    #[test]
    fn test_env_sqlite_file_relative_to_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_from(&[(ENV_SQLITE_FILE, "kills.db"), (ENV_MYSQL_PORT, " 3307 ")]);

        let config =
            AppConfig::load(dir.path(), None, "server", &CliOverrides::default(), env).unwrap();

        assert_eq!(config.storage.sqlite.file, dir.path().join("kills.db"));
        assert_eq!(config.storage.mysql.port, 3307);
    }

    #[test]
    fn test_unknown_platform() {
        let dir = tempfile::tempdir().unwrap();

        let result = AppConfig::load(dir.path(), None, "lobby", &CliOverrides::default(), no_env);

        match result {
            Err(ConfigError::UnknownPlatform(UnknownPlatform(name))) => assert_eq!(name, "lobby"),
            other => panic!("expected UnknownPlatform, got {other:?}"),
        }
    }
}

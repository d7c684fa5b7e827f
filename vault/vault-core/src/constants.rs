//! TigerStyle Constants
//!
//! Every limit has a unit suffix and lives here, so the numbers that bound
//! the system can be reviewed in one place.

// =============================================================================
// Record Limits
// =============================================================================

/// Maximum weapon/cause token length in bytes
pub const WEAPON_BYTES_MAX: usize = 64;

/// Maximum player display name length in bytes
pub const PLAYER_NAME_BYTES_MAX: usize = 36;

/// Maximum rows returned by a single kill query
pub const KILLS_QUERY_LIMIT_MAX: usize = 1000;

// =============================================================================
// Selector Keys
// =============================================================================

/// Maximum selector key length in bytes (after normalization)
pub const SELECTOR_KEY_BYTES_MAX: usize = 32;

/// Selector key of the embedded SQLite backend
pub const SELECTOR_KEY_SQLITE: &str = "sqlite";

/// Selector key of the MySQL backend
pub const SELECTOR_KEY_MYSQL: &str = "mysql";

/// Selector key used when nothing is configured
pub const SELECTOR_KEY_DEFAULT: &str = SELECTOR_KEY_SQLITE;

// =============================================================================
// Backend Defaults
// =============================================================================

/// Default SQLite database file name (relative to the data directory)
pub const SQLITE_FILE_NAME_DEFAULT: &str = "database.db";

/// Default MySQL host
pub const MYSQL_HOST_DEFAULT: &str = "localhost";

/// Default MySQL port
pub const MYSQL_PORT_DEFAULT: u16 = 3306;

/// Default MySQL database name
pub const MYSQL_DATABASE_DEFAULT: &str = "tally";

/// Default MySQL user
pub const MYSQL_USER_DEFAULT: &str = "root";

/// Default pool size for client/server backends
pub const POOL_CONNECTIONS_COUNT_DEFAULT: u32 = 8;

/// Hard ceiling on pool size
pub const POOL_CONNECTIONS_COUNT_MAX: u32 = 64;

/// Default bound on how long `init` may wait for a connection
pub const CONNECT_TIMEOUT_SECS_DEFAULT: u64 = 10;

// =============================================================================
// DST
// =============================================================================

/// Environment variable that pins the simulation seed
pub const DST_SEED_ENV_VAR: &str = "DST_SEED";

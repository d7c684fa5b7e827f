//! Tally - Kill Analytics Storage
//!
//! Operator binary for the kill-analytics storage core. Each invocation
//! resolves the configured database, runs one command against it, and
//! shuts the database down again.
//!
//! Features:
//! - One configured backend, no fallback
//! - SQLite for a single game server, MySQL for a network behind a proxy
//! - Layered configuration: CLI > environment > JSON file > defaults

pub mod bootstrap;
pub mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;
use vault_core::{
    ActiveStore, DateHolder, KillStore, PlayerKill, KILLS_QUERY_LIMIT_MAX,
    PLAYER_NAME_BYTES_MAX, WEAPON_BYTES_MAX,
};

use crate::bootstrap::StorageBootstrap;
use crate::config::{AppConfig, CliOverrides};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Application name
pub const APP_NAME: &str = "tally";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default data directory
pub const DATA_DIR_DEFAULT: &str = "~/.tally";

/// Default number of records listed by `kills` and `deaths`
pub const LIST_LIMIT_DEFAULT: usize = 20;

// =============================================================================
// CLI
// =============================================================================

/// Tally - Kill Analytics Storage
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(about = "Resolve the configured kill database and query it")]
#[command(version)]
struct Cli {
    /// Data directory for the config file and the SQLite database
    #[arg(long, default_value = DATA_DIR_DEFAULT)]
    data_dir: String,

    /// Config file (default: <data-dir>/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database type override (e.g. sqlite, mysql)
    #[arg(long)]
    db_type: Option<String>,

    /// Host platform: game_server or proxy
    #[arg(long, default_value = "game_server")]
    platform: String,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the configured backend and print every candidate's state
    Check,

    /// Store one kill
    Record {
        /// Killer UUID
        #[arg(long)]
        killer: Uuid,

        /// Victim UUID
        #[arg(long)]
        victim: Uuid,

        /// Weapon (material name)
        #[arg(long)]
        weapon: String,

        /// Epoch milliseconds (default: now)
        #[arg(long)]
        date: Option<i64>,

        /// Victim display name
        #[arg(long)]
        victim_name: Option<String>,

        /// Killer display name
        #[arg(long, requires = "victim_name")]
        killer_name: Option<String>,
    },

    /// List kills made by a player, newest first
    Kills {
        /// Killer UUID
        player: Uuid,

        /// Maximum records
        #[arg(long, default_value_t = LIST_LIMIT_DEFAULT)]
        limit: usize,

        /// Print records as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// List deaths of a player, newest first
    Deaths {
        /// Victim UUID
        player: Uuid,

        /// Maximum records
        #[arg(long, default_value_t = LIST_LIMIT_DEFAULT)]
        limit: usize,

        /// Print records as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Count stored kills
    Count {
        /// Only kills by this player
        #[arg(long)]
        killer: Option<Uuid>,
    },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "info,sqlx=warn",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Tally v{}", APP_VERSION);

    // Expand data directory
    let data_dir = PathBuf::from(shellexpand::tilde(&cli.data_dir).to_string());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    tracing::info!("Data directory: {}", data_dir.display());

    let overrides = CliOverrides {
        db_type: cli.db_type.clone(),
    };
    let config = AppConfig::load(
        &data_dir,
        cli.config.as_deref(),
        &cli.platform,
        &overrides,
        |name| std::env::var(name).ok(),
    )?;
    tracing::debug!(?config, "configuration loaded");

    let mut bootstrap = StorageBootstrap::new(config.platform, &config.storage)?;
    let store = match bootstrap.start(&config.storage.db_type).await {
        Ok(store) => store,
        Err(err) => {
            if matches!(cli.command, Command::Check) {
                print_descriptors(&bootstrap);
            }
            return Err(err).context("storage is unavailable");
        }
    };

    let result = run(&cli.command, &store, &bootstrap).await;
    bootstrap.teardown().await;
    result
}

async fn run(
    command: &Command,
    store: &ActiveStore,
    bootstrap: &StorageBootstrap,
) -> anyhow::Result<()> {
    match command {
        Command::Check => {
            print_descriptors(bootstrap);
            println!("active: {} ({})", store.key(), store.backend_name());
        }

        Command::Record {
            killer,
            victim,
            weapon,
            date,
            victim_name,
            killer_name,
        } => {
            let date = date.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
            let kill = build_kill(
                *victim,
                weapon,
                date,
                victim_name.as_deref(),
                killer_name.as_deref(),
            )?;
            store
                .store_kill(*killer, &kill)
                .await
                .context("failed to store kill")?;
            println!("stored {kill:?}");
        }

        Command::Kills {
            player,
            limit,
            json,
        } => {
            let kills = store
                .player_kills(*player, check_limit(*limit)?)
                .await
                .context("failed to read kills")?;
            print_kills(&kills, *json)?;
        }

        Command::Deaths {
            player,
            limit,
            json,
        } => {
            let deaths = store
                .player_deaths(*player, check_limit(*limit)?)
                .await
                .context("failed to read deaths")?;
            print_kills(&deaths, *json)?;
        }

        Command::Count { killer } => {
            let count = store
                .kill_count(*killer)
                .await
                .context("failed to count kills")?;
            println!("{count}");
        }
    }

    Ok(())
}

/// Build a kill from operator input, rejecting what the constructors would
/// refuse.
fn build_kill(
    victim: Uuid,
    weapon: &str,
    date: i64,
    victim_name: Option<&str>,
    killer_name: Option<&str>,
) -> anyhow::Result<PlayerKill> {
    let weapon = weapon.trim();
    anyhow::ensure!(!weapon.is_empty(), "weapon cannot be empty");
    anyhow::ensure!(
        weapon.len() <= WEAPON_BYTES_MAX,
        "weapon exceeds {WEAPON_BYTES_MAX} bytes"
    );
    for name in [victim_name, killer_name].into_iter().flatten() {
        anyhow::ensure!(
            name.len() <= PLAYER_NAME_BYTES_MAX,
            "player name '{name}' exceeds {PLAYER_NAME_BYTES_MAX} bytes"
        );
    }

    let kill = match (victim_name, killer_name) {
        (Some(victim_name), Some(killer_name)) => {
            PlayerKill::with_names(victim, weapon, date, victim_name, killer_name)
        }
        (Some(victim_name), None) => PlayerKill::with_victim_name(victim, weapon, date, victim_name),
        (None, None) => PlayerKill::new(victim, weapon, date),
        (None, Some(_)) => anyhow::bail!("--killer-name requires --victim-name"),
    };
    Ok(kill)
}

fn check_limit(limit: usize) -> anyhow::Result<usize> {
    anyhow::ensure!(
        (1..=KILLS_QUERY_LIMIT_MAX).contains(&limit),
        "limit must be between 1 and {KILLS_QUERY_LIMIT_MAX}"
    );
    Ok(limit)
}

fn print_descriptors(bootstrap: &StorageBootstrap) {
    println!("platform: {}", bootstrap.platform());
    for descriptor in bootstrap.descriptors() {
        println!(
            "  {:>2}  {:<8} {:<8} {}",
            descriptor.ordinal, descriptor.key, descriptor.name, descriptor.state
        );
    }
}

fn print_kills(kills: &[PlayerKill], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(kills)?);
        return Ok(());
    }
    for kill in kills {
        println!("{}", format_kill(kill));
    }
    Ok(())
}

fn format_kill(kill: &PlayerKill) -> String {
    let when = chrono::DateTime::from_timestamp_millis(kill.date())
        .map_or_else(|| kill.date().to_string(), |dt| dt.to_rfc3339());
    let names = match (kill.victim_name(), kill.killer_name()) {
        (Some(victim), Some(killer)) if kill.is_self_kill() => format!("{victim} (self: {killer})"),
        (Some(victim), Some(killer)) => format!("{killer} -> {victim}"),
        (Some(victim), None) => victim.to_string(),
        _ => String::new(),
    };
    format!("{when}  {}  {:<16} {names}", kill.victim(), kill.weapon())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_kill_picks_constructor() {
        let victim = Uuid::new_v4();

        let bare = build_kill(victim, " BOW ", 5, None, None).unwrap();
        assert_eq!(bare.weapon(), "BOW");
        assert_eq!(bare.victim_name(), None);

        let named = build_kill(victim, "BOW", 5, Some("Steve"), Some("Steve")).unwrap();
        assert!(named.is_self_kill());
        assert_eq!(bare, named);
    }

    #[test]
    fn test_build_kill_rejects_bad_input() {
        let victim = Uuid::new_v4();

        assert!(build_kill(victim, "  ", 5, None, None).is_err());
        assert!(build_kill(victim, &"X".repeat(WEAPON_BYTES_MAX + 1), 5, None, None).is_err());
        assert!(build_kill(victim, "BOW", 5, None, Some("Alex")).is_err());

        let long_name = "n".repeat(PLAYER_NAME_BYTES_MAX + 1);
        assert!(build_kill(victim, "BOW", 5, Some(&long_name), None).is_err());
    }

    #[test]
    fn test_check_limit() {
        assert!(check_limit(0).is_err());
        assert_eq!(check_limit(1).unwrap(), 1);
        assert_eq!(check_limit(KILLS_QUERY_LIMIT_MAX).unwrap(), KILLS_QUERY_LIMIT_MAX);
        assert!(check_limit(KILLS_QUERY_LIMIT_MAX + 1).is_err());
    }

    #[test]
    fn test_format_kill() {
        let victim = Uuid::new_v4();
        let kill = PlayerKill::with_names(victim, "BOW", 0, "Steve", "Alex");

        let line = format_kill(&kill);

        assert!(line.starts_with("1970-01-01T00:00:00+00:00"));
        assert!(line.contains(&victim.to_string()));
        assert!(line.ends_with("Alex -> Steve"));
    }

    #[test]
    fn test_kill_json_shape() {
        let victim = Uuid::new_v4();
        let kills = vec![
            PlayerKill::with_names(victim, "BOW", 42, "Steve", "Alex"),
            PlayerKill::new(victim, "TNT", 7),
        ];

        let value = serde_json::to_value(&kills).unwrap();

        assert_eq!(value[0]["victim"], victim.to_string());
        assert_eq!(value[0]["weapon"], "BOW");
        assert_eq!(value[0]["date"], 42);
        assert_eq!(value[0]["victim_name"], "Steve");
        assert_eq!(value[0]["killer_name"], "Alex");
        assert!(value[1]["victim_name"].is_null());
    }

    #[test]
    fn test_cli_killer_name_requires_victim_name() {
        let victim = Uuid::new_v4().to_string();
        let killer = Uuid::new_v4().to_string();

        let result = Cli::try_parse_from([
            APP_NAME,
            "record",
            "--killer",
            &killer,
            "--victim",
            &victim,
            "--weapon",
            "BOW",
            "--killer-name",
            "Alex",
        ]);

        assert!(result.is_err());
    }
}

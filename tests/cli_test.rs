//! Drives the `tally` binary end to end against a temporary data directory.

use std::path::Path;
use std::process::{Command, Output};

use uuid::Uuid;

const ENV_OVERRIDES: [&str; 7] = [
    "TALLY_DB_TYPE",
    "TALLY_SQLITE_FILE",
    "TALLY_MYSQL_HOST",
    "TALLY_MYSQL_PORT",
    "TALLY_MYSQL_USER",
    "TALLY_MYSQL_PASSWORD",
    "TALLY_MYSQL_DATABASE",
];

/// Run the binary with the data directory as working directory, so no
/// stray `.env` or `TALLY_*` variable leaks in.
fn tally(data_dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tally"));
    command
        .current_dir(data_dir)
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env("RUST_LOG", "warn");
    for var in ENV_OVERRIDES {
        command.env_remove(var);
    }
    command.output().expect("failed to run tally")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[cfg(feature = "sqlite")]
#[test]
fn test_check_resolves_default_sqlite() {
    let dir = tempfile::tempdir().unwrap();

    let output = tally(dir.path(), &["check"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("active: sqlite (SQLite)"));
    assert!(dir.path().join("database.db").exists());
}

#[test]
fn test_unknown_db_type_aborts() {
    let dir = tempfile::tempdir().unwrap();

    let output = tally(dir.path(), &["--db-type", "postgres", "check"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown database type 'postgres'"));
    assert!(!dir.path().join("database.db").exists());
}

#[cfg(feature = "sqlite")]
#[test]
fn test_record_then_query() {
    let dir = tempfile::tempdir().unwrap();
    let killer = Uuid::new_v4().to_string();
    let victim = Uuid::new_v4().to_string();

    for (weapon, date) in [("BOW", "1000"), ("IRON_SWORD", "2000")] {
        let output = tally(
            dir.path(),
            &[
                "record",
                "--killer",
                &killer,
                "--victim",
                &victim,
                "--weapon",
                weapon,
                "--date",
                date,
                "--victim-name",
                "Steve",
                "--killer-name",
                "Alex",
            ],
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));
    }

    let count = tally(dir.path(), &["count", "--killer", &killer]);
    assert_eq!(stdout(&count).trim(), "2");

    let kills = tally(dir.path(), &["kills", &killer]);
    let lines: Vec<String> = stdout(&kills).lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("IRON_SWORD"));
    assert!(lines[1].contains("BOW"));

    let deaths = tally(dir.path(), &["deaths", &victim, "--limit", "1"]);
    assert_eq!(stdout(&deaths).lines().count(), 1);

    let json = tally(dir.path(), &["kills", &killer, "--json"]);
    assert!(json.status.success(), "stderr: {}", stderr(&json));
    let records: serde_json::Value = serde_json::from_str(&stdout(&json)).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["weapon"], "IRON_SWORD");
    assert_eq!(records[0]["date"], 2000);
    assert_eq!(records[1]["victim"], victim.as_str());
    assert_eq!(records[1]["killer_name"], "Alex");
}

#[cfg(feature = "sqlite")]
#[test]
fn test_config_file_selects_backend() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{ "db_type": " SQLite ", "sqlite": { "file": "kills.db" } }"#,
    )
    .unwrap();

    let output = tally(dir.path(), &["check"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("kills.db").exists());
    assert!(!dir.path().join("database.db").exists());
}

#[cfg(feature = "mysql")]
#[test]
fn test_proxy_has_no_sqlite() {
    let dir = tempfile::tempdir().unwrap();

    let output = tally(dir.path(), &["--platform", "proxy", "check"]);

    assert!(!output.status.success());
    assert!(stdout(&output).contains("platform: proxy"));
    assert!(stderr(&output).contains("known: mysql"));
    assert!(!dir.path().join("database.db").exists());
}

mod categorize;
mod config;
mod db;
mod import;
mod models;
mod renewal;
mod run;
mod session;
mod summary;
mod ui;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::Paths;
use crate::session::UserContext;

fn main() -> Result<()> {
    let paths = Paths::resolve()?;
    let config = config::load(&paths.config_file)?;
    init_logging(&paths, &config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (global, args) = split_global_args(args)?;
    let token = global.token.or_else(|| std::env::var("SUBTRACK_TOKEN").ok());
    let user = UserContext::resolve(
        global.user.as_deref(),
        token.as_deref(),
        config.user.as_deref(),
    )?;

    let db_path = paths.database(&config);
    let mut db = db::Database::open(&db_path)?;
    tracing::info!(user = %user.user_id, db = %db_path.display(), "starting");

    if args.is_empty() {
        run::as_tui(&mut db, user, &config)
    } else {
        run::as_cli(&args, &mut db, &user, &config)
    }
}

/// Logs go to a file so they never draw over the TUI.
fn init_logging(paths: &Paths, config: &config::Config) -> Result<()> {
    let log_path = paths.log_file();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    let filter = std::env::var("SUBTRACK_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct GlobalArgs {
    user: Option<String>,
    token: Option<String>,
}

/// Pull `--user <id>` and `--token <jwt>` out from before the command.
fn split_global_args(args: Vec<String>) -> Result<(GlobalArgs, Vec<String>)> {
    let mut global = GlobalArgs::default();
    let mut iter = args.into_iter().peekable();
    while let Some(flag) = iter.next_if(|a| a == "--user" || a == "--token") {
        let value = iter
            .next()
            .with_context(|| format!("Missing value for {flag}"))?;
        if flag == "--user" {
            global.user = Some(value);
        } else {
            global.token = Some(value);
        }
    }
    Ok((global, iter.collect()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_global_args_before_command() {
        let (global, rest) =
            split_global_args(strings(&["--user", "u1", "--token", "t", "list", "--status", "active"]))
                .unwrap();
        assert_eq!(global.user.as_deref(), Some("u1"));
        assert_eq!(global.token.as_deref(), Some("t"));
        assert_eq!(rest, strings(&["list", "--status", "active"]));
    }

    #[test]
    fn test_no_global_args() {
        let (global, rest) = split_global_args(strings(&["summary"])).unwrap();
        assert_eq!(global, GlobalArgs::default());
        assert_eq!(rest, strings(&["summary"]));

        let (_, rest) = split_global_args(Vec::new()).unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn test_global_flag_needs_value() {
        assert!(split_global_args(strings(&["--user"])).is_err());
    }
}

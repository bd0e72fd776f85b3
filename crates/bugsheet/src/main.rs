use std::env;
use std::path::PathBuf;

use anyhow::Result;
use bugsheet_core::config::{BugsheetConfig, load_config};
use bugsheet_core::pipeline::{RunOptions, run};
use clap::Parser;

const DEFAULT_CONFIG_FILE: &str = "bugsheet.toml";

#[derive(Debug, Parser)]
#[command(
    name = "bugsheet",
    version,
    about = "Scrape bug counts from tracker query pages into spreadsheet worksheets"
)]
struct Cli {
    #[arg(long, value_name = "PATH", help = "Config file (default: bugsheet.toml)")]
    config: Option<PathBuf>,
    #[arg(short = 'u', long, help = "Tracker instance username (basic auth)")]
    username: Option<String>,
    #[arg(long, value_name = "PASS", help = "Tracker instance password (basic auth)")]
    service_password: Option<String>,
    #[arg(short = 'e', long, help = "Account email for tracker and spreadsheet logins")]
    email: Option<String>,
    #[arg(long, value_name = "PASS", help = "Tracker account password")]
    tracker_password: Option<String>,
    #[arg(long, value_name = "PASS", help = "Spreadsheet service password")]
    sheets_password: Option<String>,
    #[arg(
        short = 's',
        long = "spreadsheet",
        value_name = "TITLE",
        help = "Spreadsheet title to update (repeatable; default from config)"
    )]
    spreadsheets: Vec<String>,
    #[arg(
        short = 'w',
        long = "worksheet",
        value_name = "NAME",
        help = "Worksheet to process (repeatable; default: all configured)"
    )]
    worksheets: Vec<String>,
    #[arg(
        short = 'c',
        long = "column",
        value_name = "LABEL",
        help = "Column label to include (repeatable; default: all)"
    )]
    columns: Vec<String>,
    #[arg(long, help = "Print extracted values only, skip the spreadsheet upload")]
    terminal_only: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config_path = resolve_config_path(&cli);
    let mut config = load_config(&config_path)?;
    apply_overrides(&mut config, &cli);

    let options = RunOptions {
        spreadsheets: cli.spreadsheets,
        worksheets: cli.worksheets,
        columns: cli.columns,
        terminal_only: cli.terminal_only,
    };

    run(&config, &options)?;
    Ok(())
}

fn resolve_config_path(cli: &Cli) -> PathBuf {
    if let Some(path) = &cli.config {
        return path.clone();
    }
    if let Ok(value) = env::var("BUGSHEET_CONFIG") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// CLI flags win over config-file values (environment overrides are applied
/// later, inside the config accessors).
fn apply_overrides(config: &mut BugsheetConfig, cli: &Cli) {
    if let Some(username) = &cli.username {
        config.tracker.username = Some(username.clone());
    }
    if let Some(service_password) = &cli.service_password {
        config.tracker.service_password = Some(service_password.clone());
    }
    if let Some(email) = &cli.email {
        config.tracker.email = Some(email.clone());
    }
    if let Some(tracker_password) = &cli.tracker_password {
        config.tracker.password = Some(tracker_password.clone());
    }
    if let Some(sheets_password) = &cli.sheets_password {
        config.sheets.password = Some(sheets_password.clone());
    }
}

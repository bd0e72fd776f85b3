use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCE_NAME: &str = "bugsheet/0.1";

/// Column label -> tracker query URL.
pub type ColumnMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct BugsheetConfig {
    #[serde(default)]
    pub tracker: TrackerSection,
    #[serde(default)]
    pub sheets: SheetsSection,
    /// Worksheet name -> (column label -> query URL).
    #[serde(default)]
    pub worksheets: BTreeMap<String, ColumnMap>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct TrackerSection {
    pub login_url: Option<String>,
    pub username: Option<String>,
    /// Password protecting the tracker instance itself (HTTP basic auth),
    /// distinct from the per-account login password.
    pub service_password: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SheetsSection {
    pub base_url: Option<String>,
    pub password: Option<String>,
    /// Default spreadsheet title used when none is given on the CLI.
    pub spreadsheet: Option<String>,
}

impl BugsheetConfig {
    /// Resolve the tracker login URL: env BUGSHEET_LOGIN_URL > config.
    pub fn login_url(&self) -> Option<String> {
        env_or(&self.tracker.login_url, "BUGSHEET_LOGIN_URL")
    }

    pub fn username(&self) -> Option<String> {
        env_or(&self.tracker.username, "BUGSHEET_USERNAME")
    }

    pub fn service_password(&self) -> Option<String> {
        env_or(&self.tracker.service_password, "BUGSHEET_SERVICE_PASSWORD")
    }

    pub fn email(&self) -> Option<String> {
        env_or(&self.tracker.email, "BUGSHEET_EMAIL")
    }

    pub fn tracker_password(&self) -> Option<String> {
        env_or(&self.tracker.password, "BUGSHEET_TRACKER_PASSWORD")
    }

    pub fn sheets_base_url(&self) -> Option<String> {
        env_or(&self.sheets.base_url, "BUGSHEET_SHEETS_URL")
    }

    pub fn sheets_password(&self) -> Option<String> {
        env_or(&self.sheets.password, "BUGSHEET_SHEETS_PASSWORD")
    }

    pub fn default_spreadsheet(&self) -> Option<String> {
        env_or(&self.sheets.spreadsheet, "BUGSHEET_SPREADSHEET")
    }
}

fn env_or(config_value: &Option<String>, key: &str) -> Option<String> {
    if let Ok(value) = env::var(key) {
        let trimmed = value.trim().to_string();
        if !trimmed.is_empty() {
            return Some(trimmed);
        }
    }
    config_value.clone()
}

/// Load and parse a BugsheetConfig from a TOML file. Returns default if the
/// file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<BugsheetConfig> {
    if !config_path.exists() {
        return Ok(BugsheetConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: BugsheetConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

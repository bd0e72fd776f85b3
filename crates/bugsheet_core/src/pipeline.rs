use anyhow::{Context, Result, bail};

use crate::config::BugsheetConfig;
use crate::extract::{ExtractOptions, extract_with_source};
use crate::sheets::{SheetsApi, SheetsHttpClient, UploadReport, upload_with_api};
use crate::tracker::{QueryPageSource, TrackerSession};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Spreadsheet titles to update; empty means the configured default.
    pub spreadsheets: Vec<String>,
    /// Worksheet names to process; empty means every configured worksheet.
    pub worksheets: Vec<String>,
    /// Column labels to keep; empty means no filtering.
    pub columns: Vec<String>,
    /// Print extracted values only, skip all spreadsheet-service calls.
    pub terminal_only: bool,
}

/// One full run: tracker login, extraction, then upload unless terminal-only
/// mode is set. Returns the upload report, or `None` when the upload stage
/// was skipped. No state survives between runs.
pub fn run(config: &BugsheetConfig, options: &RunOptions) -> Result<Option<UploadReport>> {
    let login_url = require(config.login_url(), "tracker login URL")?;
    let username = require(config.username(), "tracker username")?;
    let service_password = require(config.service_password(), "tracker service password")?;
    let email = require(config.email(), "account email")?;
    let tracker_password = require(config.tracker_password(), "tracker account password")?;

    let mut session = TrackerSession::login(
        &login_url,
        &username,
        &service_password,
        &email,
        &tracker_password,
    )?;

    let extract_options = ExtractOptions {
        worksheets: options.worksheets.clone(),
        columns: options.columns.clone(),
    };
    let data = extract_with_source(config, &extract_options, &mut session)?;

    if options.terminal_only {
        return Ok(None);
    }

    let base_url = require(config.sheets_base_url(), "spreadsheet service URL")?;
    let sheets_password = require(config.sheets_password(), "spreadsheet service password")?;
    let titles = spreadsheet_titles(config, options)?;

    let mut api = SheetsHttpClient::new(&base_url)?;
    let report = upload_with_api(&data, &titles, (&email, &sheets_password), &mut api)?;
    Ok(Some(report))
}

/// Same sequencing as `run`, generic over the two remote seams.
pub fn run_with_components<S: QueryPageSource, A: SheetsApi>(
    config: &BugsheetConfig,
    options: &RunOptions,
    source: &mut S,
    sheets: &mut A,
    credentials: (&str, &str),
) -> Result<Option<UploadReport>> {
    let extract_options = ExtractOptions {
        worksheets: options.worksheets.clone(),
        columns: options.columns.clone(),
    };
    let data = extract_with_source(config, &extract_options, source)?;

    if options.terminal_only {
        return Ok(None);
    }

    let titles = spreadsheet_titles(config, options)?;
    let report = upload_with_api(&data, &titles, credentials, sheets)?;
    Ok(Some(report))
}

fn spreadsheet_titles(config: &BugsheetConfig, options: &RunOptions) -> Result<Vec<String>> {
    if !options.spreadsheets.is_empty() {
        return Ok(options.spreadsheets.clone());
    }
    match config.default_spreadsheet() {
        Some(title) => Ok(vec![title]),
        None => bail!("no spreadsheet title given and none configured"),
    }
}

fn require(value: Option<String>, what: &str) -> Result<String> {
    value.with_context(|| {
        format!("missing {what} (set it in the config file or BUGSHEET_* environment)")
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{RunOptions, run_with_components};
    use crate::config::BugsheetConfig;
    use crate::error::{BugsheetError, Result};
    use crate::extract::ExtractedRow;
    use crate::sheets::{SheetsApi, SpreadsheetHandle, WorksheetHandle};
    use crate::tracker::QueryPageSource;

    #[derive(Default)]
    struct MockSource {
        pages: BTreeMap<String, String>,
    }

    impl QueryPageSource for MockSource {
        fn fetch_page(&mut self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| BugsheetError::fetch(url, "connection refused"))
        }
    }

    #[derive(Default)]
    struct MockSheets {
        spreadsheets: Vec<SpreadsheetHandle>,
        worksheets: BTreeMap<String, Vec<WorksheetHandle>>,
        inserted: Vec<String>,
        request_count: usize,
    }

    impl SheetsApi for MockSheets {
        fn login(&mut self, _email: &str, _password: &str) -> Result<()> {
            self.request_count += 1;
            Ok(())
        }

        fn find_spreadsheet(&mut self, title: &str) -> Result<Option<SpreadsheetHandle>> {
            self.request_count += 1;
            Ok(self
                .spreadsheets
                .iter()
                .find(|entry| entry.title == title)
                .cloned())
        }

        fn list_worksheets(&mut self, spreadsheet_id: &str) -> Result<Vec<WorksheetHandle>> {
            self.request_count += 1;
            Ok(self
                .worksheets
                .get(spreadsheet_id)
                .cloned()
                .unwrap_or_default())
        }

        fn insert_row(
            &mut self,
            _spreadsheet_id: &str,
            worksheet: &WorksheetHandle,
            _row: &ExtractedRow,
        ) -> Result<()> {
            self.request_count += 1;
            self.inserted.push(worksheet.title.clone());
            Ok(())
        }
    }

    fn config_with_triage() -> BugsheetConfig {
        let mut config = BugsheetConfig::default();
        let mut columns = BTreeMap::new();
        columns.insert("Open".to_string(), "https://b/open".to_string());
        config.worksheets.insert("Triage".to_string(), columns);
        config.sheets.spreadsheet = Some("Bug Counts".to_string());
        config
    }

    fn source_with_pages() -> MockSource {
        let mut source = MockSource::default();
        source.pages.insert(
            "https://b/open".to_string(),
            "<span class=\"bz_result_count\">3 hits</span>".to_string(),
        );
        source
    }

    #[test]
    fn terminal_only_makes_no_spreadsheet_calls() {
        let config = config_with_triage();
        let mut source = source_with_pages();
        let mut sheets = MockSheets::default();

        let report = run_with_components(
            &config,
            &RunOptions {
                terminal_only: true,
                ..Default::default()
            },
            &mut source,
            &mut sheets,
            ("dev@example.org", "secret"),
        )
        .expect("run");

        assert!(report.is_none());
        assert_eq!(sheets.request_count, 0);
    }

    #[test]
    fn full_run_extracts_and_uploads() {
        let config = config_with_triage();
        let mut source = source_with_pages();
        let mut sheets = MockSheets::default();
        sheets.spreadsheets.push(SpreadsheetHandle {
            id: "sp1".to_string(),
            title: "Bug Counts".to_string(),
        });
        sheets.worksheets.insert(
            "sp1".to_string(),
            vec![WorksheetHandle {
                id: "w1".to_string(),
                title: "Triage".to_string(),
            }],
        );

        let report = run_with_components(
            &config,
            &RunOptions::default(),
            &mut source,
            &mut sheets,
            ("dev@example.org", "secret"),
        )
        .expect("run")
        .expect("upload report");

        assert_eq!(report.spreadsheets_updated, 1);
        assert_eq!(report.rows_inserted, 1);
        assert_eq!(sheets.inserted, vec!["Triage"]);
    }

    #[test]
    fn spreadsheet_titles_default_to_configured_title() {
        let config = config_with_triage();
        let mut source = source_with_pages();
        let mut sheets = MockSheets::default();

        // Default title "Bug Counts" is looked up and missing remotely.
        let error = run_with_components(
            &config,
            &RunOptions::default(),
            &mut source,
            &mut sheets,
            ("dev@example.org", "secret"),
        )
        .expect_err("must fail");

        let lookup = error.downcast::<BugsheetError>().expect("stage error");
        match lookup {
            BugsheetError::Lookup { title } => assert_eq!(title, "Bug Counts"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_default_spreadsheet_is_fatal_before_any_upload_call() {
        let mut config = config_with_triage();
        config.sheets.spreadsheet = None;
        let mut source = source_with_pages();
        let mut sheets = MockSheets::default();

        let error = run_with_components(
            &config,
            &RunOptions::default(),
            &mut source,
            &mut sheets,
            ("dev@example.org", "secret"),
        )
        .expect_err("must fail");

        assert!(error.to_string().contains("no spreadsheet title"));
        assert_eq!(sheets.request_count, 0);
    }
}

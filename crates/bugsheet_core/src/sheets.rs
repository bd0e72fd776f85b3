use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::DEFAULT_SOURCE_NAME;
use crate::error::{BugsheetError, Result};
use crate::extract::{ExtractedRow, WorksheetData};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const SHEETS_SERVICE: &str = "spreadsheet service";

/// Remote spreadsheet resolved by title lookup. Re-resolved every run,
/// never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetHandle {
    pub id: String,
    pub title: String,
}

/// A named tab within a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetHandle {
    pub id: String,
    pub title: String,
}

/// Spreadsheet service operations the upload stage needs.
pub trait SheetsApi {
    fn login(&mut self, email: &str, password: &str) -> Result<()>;
    /// First spreadsheet whose title matches exactly, if any.
    fn find_spreadsheet(&mut self, title: &str) -> Result<Option<SpreadsheetHandle>>;
    fn list_worksheets(&mut self, spreadsheet_id: &str) -> Result<Vec<WorksheetHandle>>;
    fn insert_row(
        &mut self,
        spreadsheet_id: &str,
        worksheet: &WorksheetHandle,
        row: &ExtractedRow,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub spreadsheets_updated: usize,
    pub rows_inserted: usize,
}

/// Authenticate and append one row per remote worksheet whose title matches
/// a key of `data`. Remote worksheets without data are left untouched; data
/// keys with no remote match are silently dropped. A title with zero
/// matches is fatal; the service is never asked to create anything.
pub fn upload_with_api<A: SheetsApi>(
    data: &WorksheetData,
    titles: &[String],
    credentials: (&str, &str),
    api: &mut A,
) -> Result<UploadReport> {
    let (email, password) = credentials;
    api.login(email, password)?;

    let mut report = UploadReport::default();
    for title in titles {
        let spreadsheet = api
            .find_spreadsheet(title)?
            .ok_or_else(|| BugsheetError::Lookup {
                title: title.clone(),
            })?;

        for worksheet in api.list_worksheets(&spreadsheet.id)? {
            let Some(row) = data.get(&worksheet.title) else {
                continue;
            };
            api.insert_row(&spreadsheet.id, &worksheet, row)?;
            report.rows_inserted += 1;
        }

        println!("\nSpreadsheet {title} Updated");
        report.spreadsheets_updated += 1;
    }
    Ok(report)
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetsResponse {
    #[serde(default)]
    spreadsheets: Vec<SpreadsheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetEntry {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct WorksheetsResponse {
    #[serde(default)]
    worksheets: Vec<WorksheetEntry>,
}

#[derive(Debug, Deserialize)]
struct WorksheetEntry {
    id: String,
    title: String,
}

/// Blocking JSON client for the spreadsheet service: token login, exact
/// title lookup, worksheet enumeration, row insert.
pub struct SheetsHttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl SheetsHttpClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|error| BugsheetError::auth(SHEETS_SERVICE, error.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| BugsheetError::auth(SHEETS_SERVICE, "not logged in".to_string()))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let token = self.token()?;
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .map_err(|error| BugsheetError::fetch(url.as_str(), error))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BugsheetError::fetch(url.as_str(), format!("HTTP {status}")));
        }
        response
            .json()
            .map_err(|error| BugsheetError::parse(url.as_str(), error.to_string()))
    }
}

impl SheetsApi for SheetsHttpClient {
    fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let url = format!("{}/auth", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("email", email),
                ("password", password),
                ("source", DEFAULT_SOURCE_NAME),
            ])
            .send()
            .map_err(|error| BugsheetError::auth(SHEETS_SERVICE, error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BugsheetError::auth(
                SHEETS_SERVICE,
                format!("login request returned HTTP {status}"),
            ));
        }
        let payload: AuthResponse = response
            .json()
            .map_err(|error| BugsheetError::auth(SHEETS_SERVICE, error.to_string()))?;
        self.token = Some(payload.token);
        Ok(())
    }

    fn find_spreadsheet(&mut self, title: &str) -> Result<Option<SpreadsheetHandle>> {
        let payload: SpreadsheetsResponse = self.get_json(
            "/spreadsheets",
            &[("title", title), ("title_exact", "true")],
        )?;
        // First entry of the feed, matching the service's exact-title query.
        Ok(payload
            .spreadsheets
            .into_iter()
            .next()
            .map(|entry| SpreadsheetHandle {
                id: entry.id,
                title: entry.title,
            }))
    }

    fn list_worksheets(&mut self, spreadsheet_id: &str) -> Result<Vec<WorksheetHandle>> {
        let payload: WorksheetsResponse =
            self.get_json(&format!("/spreadsheets/{spreadsheet_id}/worksheets"), &[])?;
        Ok(payload
            .worksheets
            .into_iter()
            .map(|entry| WorksheetHandle {
                id: entry.id,
                title: entry.title,
            })
            .collect())
    }

    fn insert_row(
        &mut self,
        spreadsheet_id: &str,
        worksheet: &WorksheetHandle,
        row: &ExtractedRow,
    ) -> Result<()> {
        let url = format!(
            "{}/spreadsheets/{spreadsheet_id}/worksheets/{}/rows",
            self.base_url, worksheet.id
        );
        let token = self.token()?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(row)
            .send()
            .map_err(|error| BugsheetError::upload(worksheet.title.as_str(), error))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BugsheetError::upload(
                worksheet.title.as_str(),
                format!("HTTP {status}"),
            ));
        }
        Ok(())
    }
}

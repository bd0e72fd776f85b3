use std::collections::BTreeMap;

use chrono::Local;

use crate::config::BugsheetConfig;
use crate::error::{BugsheetError, Result};
use crate::html::parse_result_count;
use crate::tracker::QueryPageSource;

pub const DATE_KEY: &str = "date";
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Normalized column key -> extracted value, plus the fixed `date` field.
pub type ExtractedRow = BTreeMap<String, String>;

/// Worksheet name -> its extracted row. Fully populated before the upload
/// stage starts and never mutated afterward.
pub type WorksheetData = BTreeMap<String, ExtractedRow>;

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Worksheet names to process; empty means every configured worksheet.
    pub worksheets: Vec<String>,
    /// Column labels to keep; empty means no filtering. Labels that match
    /// nothing in configuration are ignored.
    pub columns: Vec<String>,
}

/// Lowercase with spaces removed, the column-name form the spreadsheet
/// service accepts. Idempotent.
pub fn normalize_label(label: &str) -> String {
    label.to_lowercase().replace(' ', "")
}

/// Fetch every configured query page through `source` and accumulate one row
/// per worksheet. Progress lines on stdout are the observable contract of
/// terminal-only mode, not incidental logging.
pub fn extract_with_source<S: QueryPageSource>(
    config: &BugsheetConfig,
    options: &ExtractOptions,
    source: &mut S,
) -> Result<WorksheetData> {
    let worksheet_names: Vec<String> = if options.worksheets.is_empty() {
        config.worksheets.keys().cloned().collect()
    } else {
        options.worksheets.clone()
    };

    let mut worksheet_data = WorksheetData::new();
    for name in &worksheet_names {
        let columns = config.worksheets.get(name).ok_or_else(|| {
            BugsheetError::config(format!("worksheet not present in configuration: {name}"))
        })?;

        println!("\n...Worksheet: {name}...");
        // Captured per worksheet: a run spanning midnight records different
        // dates across worksheets.
        let date = Local::now().format(DATE_FORMAT).to_string();
        println!("Date: {date}");

        let mut row = ExtractedRow::new();
        row.insert(DATE_KEY.to_string(), date);

        // BTreeMap iteration gives the ascending label order the console
        // output relies on; the row itself is keyed, so order-independent.
        for (label, url) in columns {
            if !options.columns.is_empty() && !options.columns.iter().any(|c| c == label) {
                continue;
            }
            let page = source.fetch_page(url)?;
            let value = parse_result_count(&page, url)?;
            println!("{label}: {value}");
            row.insert(normalize_label(label), value);
        }

        worksheet_data.insert(name.clone(), row);
    }
    Ok(worksheet_data)
}

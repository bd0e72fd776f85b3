use thiserror::Error;

/// Stage-level failures. None of these are caught internally: the first
/// error at any stage aborts the whole run.
#[derive(Debug, Error)]
pub enum BugsheetError {
    #[error("authentication to {service} failed: {reason}")]
    Auth { service: &'static str, reason: String },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to parse {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("spreadsheet not found: {title}")]
    Lookup { title: String },

    #[error("row insert failed for worksheet {worksheet}: {reason}")]
    Upload { worksheet: String, reason: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

pub type Result<T> = std::result::Result<T, BugsheetError>;

impl BugsheetError {
    pub fn auth(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Auth {
            service,
            reason: reason.into(),
        }
    }

    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn upload(worksheet: impl Into<String>, reason: impl ToString) -> Self {
        Self::Upload {
            worksheet: worksheet.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

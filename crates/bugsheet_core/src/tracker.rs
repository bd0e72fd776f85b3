use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{BugsheetError, Result};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const TRACKER_SERVICE: &str = "tracker";

/// Seam between the extractor and the authenticated tracker session.
pub trait QueryPageSource {
    fn fetch_page(&mut self, url: &str) -> Result<String>;
}

/// Cookie-bearing session against the bug tracker. Created once per run and
/// reused for every query page fetch.
#[derive(Debug)]
pub struct TrackerSession {
    client: Client,
    username: String,
    service_password: String,
}

impl TrackerSession {
    /// Authenticate against the tracker: HTTP basic auth with the instance
    /// credentials plus the form-encoded account login, in one request
    /// through the cookie-store client. The login response body is drained
    /// before the session is handed out.
    pub fn login(
        login_url: &str,
        username: &str,
        service_password: &str,
        email: &str,
        password: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .cookie_store(true)
            .build()
            .map_err(|error| BugsheetError::auth(TRACKER_SERVICE, error.to_string()))?;

        let response = client
            .post(login_url)
            .basic_auth(username, Some(service_password))
            .form(&[("Bugzilla_login", email), ("Bugzilla_password", password)])
            .send()
            .map_err(|error| BugsheetError::auth(TRACKER_SERVICE, error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BugsheetError::auth(
                TRACKER_SERVICE,
                format!("login request returned HTTP {status}"),
            ));
        }
        response
            .text()
            .map_err(|error| BugsheetError::auth(TRACKER_SERVICE, error.to_string()))?;

        Ok(Self {
            client,
            username: username.to_string(),
            service_password: service_password.to_string(),
        })
    }
}

impl QueryPageSource for TrackerSession {
    fn fetch_page(&mut self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.service_password))
            .send()
            .map_err(|error| BugsheetError::fetch(url, error))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BugsheetError::fetch(url, format!("HTTP {status}")));
        }
        response
            .text()
            .map_err(|error| BugsheetError::fetch(url, error))
    }
}

use crate::config::AccountConfig;
use crate::error::OvoError;
use reqwest::Client as HttpClient;
use std::time::Duration;

/// Per-request ceiling so a hung provider call cannot block a scan forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Base URLs for the two OVO hosts. Overridable so tests can point at a
/// local mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Host serving the login endpoint
    pub auth_base: String,
    /// Host serving supply points and readings
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_base: "https://my.ovoenergy.com".to_string(),
            api_base: "https://smartpaymapi.ovoenergy.com".to_string(),
        }
    }
}

/// Cookie-session client for the OVO API.
///
/// The underlying reqwest client holds the session cookie jar and is created
/// exactly once for the process lifetime; session affinity depends on it
/// never being rebuilt between calls.
pub struct OvoClient {
    http_client: HttpClient,
    credentials: AccountConfig,
    endpoints: Endpoints,
    logged_in: bool,
}

impl OvoClient {
    pub fn new(credentials: AccountConfig, endpoints: Endpoints) -> Result<Self, OvoError> {
        let http_client = HttpClient::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http_client,
            credentials,
            endpoints,
            logged_in: false,
        })
    }

    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn account_number(&self) -> &str {
        &self.credentials.account_number
    }

    pub(crate) fn api_base(&self) -> &str {
        &self.endpoints.api_base
    }

    /// Authenticates against the OVO login endpoint. On success the session
    /// cookie lands in the jar and the logged-in flag is set; on a non-200
    /// response the flag stays false and the status and body are surfaced.
    pub async fn login(&mut self) -> Result<(), OvoError> {
        tracing::info!("attempting to log in");
        let url = format!("{}/api/v2/auth/login", self.endpoints.auth_base);
        let response = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({
                "username": self.credentials.username,
                "password": self.credentials.password,
                "rememberMe": false,
                "refreshTokenType": "",
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OvoError::AuthRejected {
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!("successfully logged in");
        self.logged_in = true;
        Ok(())
    }

    /// GETs an API path and returns the body text. A 401/403 clears the
    /// logged-in flag and surfaces as `SessionExpired` so the scan loop can
    /// re-authenticate before its next attempt.
    pub(crate) async fn get(&mut self, url: &str) -> Result<String, OvoError> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let err = OvoError::from_status(status, body);
            if err.is_session_expired() {
                self.logged_in = false;
            }
            return Err(err);
        }
        Ok(body)
    }
}

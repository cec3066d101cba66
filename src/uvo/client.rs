use crate::config::{AccountConfig, ClientConfig};
use crate::error::{Result, UvoError};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::vehicle::{Vehicle, VehicleClient};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};

use super::types::{LoginRequest, VehicleListResponse};
use super::{LOGIN_PATH, SESSION_HEADER, VEHICLE_LIST_PATH};

const CLIENT_USER_AGENT: &str = concat!("kia-uvo/", env!("CARGO_PKG_VERSION"));

/// UVO API client holding one authenticated session
pub struct UvoHttpClient {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
    session_id: Option<String>,
    logger: StructuredLogger,
}

impl UvoHttpClient {
    /// Create a client for one account; no network traffic happens here
    pub fn new(client: &ClientConfig, account: &AccountConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(client.timeout_seconds.max(1)))
            .build()?;
        let logger = get_logger_with_context(LogContext::new("uvo").with_account(&account.name));
        Ok(Self {
            base_url: client.base_url.trim_end_matches('/').to_string(),
            username: account.username.clone(),
            password: account.password.clone(),
            http,
            session_id: None,
            logger,
        })
    }

    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn status_error(what: &str, status: StatusCode) -> UvoError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        UvoError::auth(format!("{} rejected: {}", what, status))
    } else {
        UvoError::api(format!("{} failed: {}", what, status))
    }
}

#[async_trait::async_trait]
impl VehicleClient for UvoHttpClient {
    async fn login(&mut self) -> Result<()> {
        self.session_id = None;
        let resp = self
            .http
            .post(self.url(LOGIN_PATH))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .json(&LoginRequest {
                user_id: &self.username,
                password: &self.password,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error("Login", resp.status()));
        }

        let sid = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| UvoError::auth("Login response carried no session id"))?;

        self.session_id = Some(sid.to_string());
        self.logger.debug("Login succeeded");
        Ok(())
    }

    async fn fetch_state(&mut self) -> Result<Vec<Vehicle>> {
        let sid = self
            .session_id
            .as_deref()
            .ok_or_else(|| UvoError::auth("No session; login first"))?;

        let resp = self
            .http
            .get(self.url(VEHICLE_LIST_PATH))
            .header(SESSION_HEADER, sid)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error("Vehicle list", resp.status()));
        }

        let body: VehicleListResponse = resp.json().await?;
        let vehicles = body.payload.vehicle_summary;
        self.logger
            .debug(&format!("Fetched {} vehicle(s)", vehicles.len()));
        Ok(vehicles)
    }
}

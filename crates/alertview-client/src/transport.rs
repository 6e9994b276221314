//! Transport to the remote alert store.
//!
//! [`AlertTransport`] is the seam between the dashboard and the network.
//! [`HttpTransport`] talks to the real server with reqwest; tests use
//! [`crate::mock::MockTransport`].
//!
//! ## Example
//!
//! ```no_run
//! use alertview_client::{AlertTransport, HttpTransport, token_source_from_config};
//! use alertview_core::AlertViewConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AlertViewConfig::default();
//! let tokens = token_source_from_config(&config.server);
//! let transport = HttpTransport::from_config(&config.server, tokens)?;
//!
//! let alerts = transport.list_alerts().await?;
//! println!("{} alerts", alerts.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use alertview_core::{Alert, AlertId, AlertViewError, ServerConfig};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use tokio::time::Duration;
use tracing::debug;

use crate::api_types::{ApiAlert, UnreadCountResponse};
use crate::error::{Result, TransportError};
use crate::token::TokenSource;

const LIST_PATH: &str = "/alerts/";
const UNREAD_COUNT_PATH: &str = "/alerts/unread-count/";
const MARK_ALL_READ_PATH: &str = "/alerts/mark-all-read/";

/// Path of the mark-one endpoint for `id`.
pub fn mark_read_path(id: AlertId) -> String {
    format!("/alerts/{}/mark-read/", id)
}

/// Read and mutation calls against the remote alert store.
///
/// Implementations never panic across this boundary; every failure is a
/// [`TransportError`].
#[async_trait]
pub trait AlertTransport: Send + Sync {
    /// Fetch the full alert list, in server order (newest first).
    async fn list_alerts(&self) -> Result<Vec<Alert>>;

    /// Fetch the authoritative unread count without the list.
    async fn fetch_unread_count(&self) -> Result<usize>;

    /// Mark one alert read. Repeating it for a read alert is not an error.
    async fn mark_read(&self, id: AlertId) -> Result<()>;

    /// Mark every unread alert read server-side.
    async fn mark_all_read(&self) -> Result<()>;

    /// Transport name for logging.
    fn name(&self) -> &str;
}

/// HTTP transport using reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    csrf_header: String,
    csrf_cookie: String,
    tokens: Arc<dyn TokenSource>,
}

impl HttpTransport {
    /// Create a transport from the server config.
    pub fn from_config(
        config: &ServerConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> alertview_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AlertViewError::config_validation(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            csrf_header: config.csrf_header.clone(),
            csrf_cookie: config.csrf_cookie.clone(),
            tokens,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue a GET and return the body of a successful response.
    async fn get_body(&self, path: &str) -> Result<String> {
        debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(path, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(path, e))?;

        if !status.is_success() {
            return Err(TransportError::from_http_status(path, status.as_u16(), &body));
        }
        Ok(body)
    }

    /// Issue a token-bearing POST; any 2xx counts as success.
    async fn post(&self, path: &str) -> Result<()> {
        let mut request = self
            .client
            .post(self.url(path))
            .header("accept", "application/json");

        match self.tokens.current_token() {
            Some(token) => {
                request = request
                    .header(self.csrf_header.as_str(), token.as_str())
                    .header(COOKIE, format!("{}={}", self.csrf_cookie, token));
            }
            None => debug!(path, "no anti-forgery token available"),
        }

        debug!(path, "POST");
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_http_status(path, status.as_u16(), &body));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertTransport for HttpTransport {
    async fn list_alerts(&self) -> Result<Vec<Alert>> {
        let body = self.get_body(LIST_PATH).await?;
        let items: Vec<ApiAlert> = serde_json::from_str(&body)
            .map_err(|e| TransportError::decode(LIST_PATH, e.to_string()))?;

        items
            .into_iter()
            .map(|item| {
                item.into_alert()
                    .map_err(|message| TransportError::decode(LIST_PATH, message))
            })
            .collect()
    }

    async fn fetch_unread_count(&self) -> Result<usize> {
        let body = self.get_body(UNREAD_COUNT_PATH).await?;
        let parsed: UnreadCountResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::decode(UNREAD_COUNT_PATH, e.to_string()))?;

        usize::try_from(parsed.count).map_err(|_| {
            TransportError::decode(
                UNREAD_COUNT_PATH,
                format!("negative unread count {}", parsed.count),
            )
        })
    }

    async fn mark_read(&self, id: AlertId) -> Result<()> {
        self.post(&mark_read_path(id)).await
    }

    async fn mark_all_read(&self) -> Result<()> {
        self.post(MARK_ALL_READ_PATH).await
    }

    fn name(&self) -> &str {
        "http"
    }
}

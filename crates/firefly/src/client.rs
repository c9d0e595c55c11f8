//! HTTP client for the Firefly III API.

use std::time::Duration;

use async_trait::async_trait;
use banksync_core::errors::{Error, Result};
use banksync_core::{LedgerAccount, LedgerClient, LedgerResponse, TransactionPayload};
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::models::{ApiAccountsResponse, ApiErrorResponse};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const API_PATH: &str = "/api/v1";
const ACCOUNTS_PATH: &str = "/accounts";
const TRANSACTIONS_PATH: &str = "/transactions";

/// Safety limit on account list pagination.
const MAX_ACCOUNT_PAGES: u32 = 100;

/// HTTP client for a Firefly III instance.
///
/// # Example
///
/// ```ignore
/// let client = FireflyApiClient::new("https://firefly.example.com", "pat", Duration::from_secs(30))?;
/// let accounts = client.list_accounts().await?;
/// ```
#[derive(Debug, Clone)]
pub struct FireflyApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl FireflyApiClient {
    /// Create a new client.
    ///
    /// * `base_url` - instance URL; `/api/v1` is appended unless already present
    /// * `access_token` - personal access token, sent as a bearer token
    /// * `timeout` - budget for each HTTP call
    pub fn new(base_url: &str, access_token: &str, timeout: Duration) -> Result<Self> {
        let mut auth_header = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|e| Error::Unexpected(format!("Invalid access token format: {}", e)))?;
        auth_header.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.api+json"));
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_accounts_page(&self, page: u32) -> Result<ApiAccountsResponse> {
        let url = format!("{}{}?page={}", self.base_url, ACCOUNTS_PATH, page);
        debug!("[FireflyApi] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::LedgerApiUnavailable(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::LedgerApiUnavailable(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|err| err.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(Error::LedgerApiUnavailable(format!(
                "Request to URL {} failed with status code {}: {}",
                url,
                status.as_u16(),
                detail
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::LedgerApiUnavailable(format!("Failed to parse account list: {}", e))
        })
    }
}

#[async_trait]
impl LedgerClient for FireflyApiClient {
    /// Fetch every page of the account list.
    async fn list_accounts(&self) -> Result<Vec<LedgerAccount>> {
        let mut accounts = Vec::new();
        let mut page = 1;

        loop {
            let response = self.fetch_accounts_page(page).await?;
            let has_next = response.has_next_page();
            accounts.extend(response.into_accounts());

            if !has_next || page >= MAX_ACCOUNT_PAGES {
                break;
            }
            page += 1;
        }

        info!("[FireflyApi] Fetched {} accounts", accounts.len());
        Ok(accounts)
    }

    async fn store_transaction(&self, payload: &TransactionPayload) -> Result<LedgerResponse> {
        let url = format!("{}{}", self.base_url, TRANSACTIONS_PATH);
        debug!("[FireflyApi] POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::LedgerApiUnavailable(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::LedgerApiUnavailable(format!("Failed to read response: {}", e)))?;

        Ok(LedgerResponse::new(status, body))
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with(API_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, API_PATH)
    }
}

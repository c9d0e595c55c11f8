//! Monobank personal webhook registration.
//!
//! The webhook URL is only accepted by Monobank once it answers a GET with
//! 200, so registration first polls the listener through its public URL.

use std::time::Duration;

use anyhow::{bail, Context};
use rand::Rng;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Serialize;

/// Default base URL of the Monobank open API.
pub const DEFAULT_MONOBANK_API_URL: &str = "https://api.monobank.ua";

const WEBHOOK_ENDPOINT: &str = "/personal/webhook";
const TOKEN_HEADER: &str = "X-Token";

const WEBHOOK_PATH_LEN: usize = 33;
const WEBHOOK_PATH_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const REACHABILITY_INTERVAL: Duration = Duration::from_secs(2);
pub const REACHABILITY_ATTEMPTS: u32 = 30;

/// Random, hard to guess path the listener serves notifications on.
pub fn generate_webhook_path() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..WEBHOOK_PATH_LEN)
        .map(|_| WEBHOOK_PATH_ALPHABET[rng.gen_range(0..WEBHOOK_PATH_ALPHABET.len())] as char)
        .collect();
    format!("/{}", suffix)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetWebhookRequest<'a> {
    web_hook_url: &'a str,
}

#[derive(Debug, Clone)]
pub struct MonobankApiClient {
    client: reqwest::Client,
    base_url: String,
    token: HeaderValue,
}

impl MonobankApiClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut token = HeaderValue::from_str(token).context("Invalid Monobank token format")?;
        token.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to initialize HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Point the personal webhook at `webhook_url`.
    pub async fn set_webhook(&self, webhook_url: &str) -> anyhow::Result<()> {
        let url = format!("{}{}", self.base_url, WEBHOOK_ENDPOINT);
        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, self.token.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&SetWebhookRequest {
                web_hook_url: webhook_url,
            })
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "Monobank rejected the webhook, status code: {} {}",
                status.as_u16(),
                body
            );
        }
        Ok(())
    }

    /// Poll `url` until it answers 200. Returns false once `attempts` are spent.
    pub async fn wait_until_reachable(&self, url: &str, interval: Duration, attempts: u32) -> bool {
        for attempt in 1..=attempts {
            match self.client.get(url).send().await {
                Ok(response) if response.status() == reqwest::StatusCode::OK => return true,
                Ok(response) => tracing::debug!(
                    "Webhook URL answered {} (attempt {}/{})",
                    response.status(),
                    attempt,
                    attempts
                ),
                Err(e) => tracing::debug!(
                    "Webhook URL not reachable yet (attempt {}/{}): {}",
                    attempt,
                    attempts,
                    e
                ),
            }
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }
        false
    }

    /// Wait for the listener to be reachable, then register it.
    pub async fn register_webhook(
        &self,
        webhook_url: &str,
        interval: Duration,
        attempts: u32,
    ) -> anyhow::Result<()> {
        if !self.wait_until_reachable(webhook_url, interval, attempts).await {
            bail!(
                "Webhook URL {} was not reachable after {} attempts",
                webhook_url,
                attempts
            );
        }
        self.set_webhook(webhook_url).await?;
        tracing::info!("Registered Monobank webhook {}", webhook_url);
        Ok(())
    }
}

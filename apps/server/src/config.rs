use std::{net::SocketAddr, time::Duration};

use banksync_core::constants::{
    DEFAULT_MAPPING_NAMESPACE, DEFAULT_MAX_IN_FLIGHT, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_TOLERATED_STATUS,
};
use banksync_core::{PipelineConfig, SubmitterOptions};
use thiserror::Error;

use crate::monobank::DEFAULT_MONOBANK_API_URL;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Externally reachable base URL of this service, without the webhook path
    pub public_host: String,
    pub monobank_api_url: String,
    pub monobank_token: String,
    pub register_webhook: bool,
    pub ledger_url: String,
    pub ledger_token: String,
    pub request_timeout: Duration,
    pub queue_capacity: usize,
    pub max_in_flight: usize,
    pub dedup_capacity: usize,
    pub account_cache_ttl: Duration,
    pub tolerated_status: Option<u16>,
    pub mapping_namespace: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let listen_addr = parse_listen_addr(
            &get("LISTEN_ADDRESS").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        )?;

        let public_host = match get("BANKSYNC_PUBLIC_HOST").or_else(|| get("FBSHost")) {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => return Err(ConfigError::Missing("BANKSYNC_PUBLIC_HOST")),
        };

        let tolerated_status = match get("BANKSYNC_TOLERATED_STATUS") {
            None => Some(DEFAULT_TOLERATED_STATUS),
            Some(v) if v.eq_ignore_ascii_case("none") => None,
            Some(v) => Some(parse_number::<u16>("BANKSYNC_TOLERATED_STATUS", &v)?),
        };

        let log_format = match get("BANKSYNC_LOG_FORMAT") {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            None => LogFormat::Text,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    key: "BANKSYNC_LOG_FORMAT",
                    value: v,
                    reason: "expected 'text' or 'json'".to_string(),
                })
            }
        };

        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            get(key).map_or(Ok(default), |v| parse_number(key, &v))
        };

        let queue_capacity = number("BANKSYNC_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY as u64)?;
        let max_in_flight = number("BANKSYNC_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT as u64)?;
        for (key, value) in [
            ("BANKSYNC_QUEUE_CAPACITY", queue_capacity),
            ("BANKSYNC_MAX_IN_FLIGHT", max_in_flight),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    value: value.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        Ok(Self {
            listen_addr,
            public_host,
            monobank_api_url: get("MONOBANK_API_URL")
                .unwrap_or_else(|| DEFAULT_MONOBANK_API_URL.to_string()),
            monobank_token: required("MONOBANK_API_TOKEN")?,
            register_webhook: match get("BANKSYNC_REGISTER_WEBHOOK") {
                Some(v) => parse_bool("BANKSYNC_REGISTER_WEBHOOK", &v)?,
                None => true,
            },
            ledger_url: required("FFI_URL")?,
            ledger_token: required("FFI_TOKEN")?,
            request_timeout: Duration::from_millis(number(
                "BANKSYNC_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )?),
            queue_capacity: queue_capacity as usize,
            max_in_flight: max_in_flight as usize,
            dedup_capacity: number("BANKSYNC_DEDUP_CAPACITY", 0)? as usize,
            account_cache_ttl: Duration::from_secs(number("BANKSYNC_ACCOUNT_CACHE_TTL_SECS", 0)?),
            tolerated_status,
            mapping_namespace: get("BANKSYNC_MAPPING_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_MAPPING_NAMESPACE.to_string()),
            log_format,
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            queue_capacity: self.queue_capacity,
            max_in_flight: self.max_in_flight,
            dedup_capacity: self.dedup_capacity,
        }
    }

    pub fn submitter_options(&self) -> SubmitterOptions {
        SubmitterOptions {
            tolerated_status: self.tolerated_status,
            ..SubmitterOptions::default()
        }
    }
}

/// Accepts a full socket address or the bare `:port` form.
fn parse_listen_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    let candidate = if value.starts_with(':') {
        format!("0.0.0.0{}", value)
    } else {
        value.to_string()
    };
    candidate.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
        key: "LISTEN_ADDRESS",
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

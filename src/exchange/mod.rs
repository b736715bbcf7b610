//! Exchange-rate API client
//!
//! Talks to an exchangerate-api.com style endpoint:
//! `GET {base}/{api_key}/latest/{FROM}` returning `conversion_rates`.

pub mod conversion;

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::currency::Currency;

/// Default rate API base URL (the API key and path are appended)
pub const DEFAULT_API_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// Default timeout for a single rate request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum RateError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate API returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Rate API reported an error: {0}")]
    Api(String),

    #[error("No rate for {to} in {from} response")]
    MissingRate { from: String, to: String },

    #[error("Asked for {expected} rates, got {got}")]
    BaseMismatch { expected: String, got: String },

    #[error("No API key configured (set FXCARD_API_KEY or api_key in config.toml)")]
    MissingApiKey,
}

/// Body of a `latest/{FROM}` response. Only `conversion_rates` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRates {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(rename = "error-type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub base_code: Option<String>,
    #[serde(default)]
    pub time_last_update_utc: Option<String>,
    #[serde(default)]
    pub conversion_rates: HashMap<String, f64>,
}

/// A single from -> to rate
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub rate: f64,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RateClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RateClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn latest_url(&self, api_key: &str, from: Currency) -> String {
        format!("{}/{}/latest/{}", self.base_url, api_key, from.code())
    }

    /// Fetch every rate for `from`
    pub async fn latest(&self, from: Currency) -> Result<LatestRates, RateError> {
        let api_key = self.api_key.as_deref().ok_or(RateError::MissingApiKey)?;

        tracing::debug!("Requesting rates for {}", from);
        let response = self.client.get(self.latest_url(api_key, from)).send().await?;

        let status = response.status();
        tracing::debug!("Rate API response status: {}", status);
        if !status.is_success() {
            return Err(RateError::Status(status));
        }

        let body: LatestRates = response.json().await?;
        if body.result.as_deref() == Some("error") {
            return Err(RateError::Api(
                body.error_type.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        // Rates quoted against another base would give a wrong conversion
        if let Some(base) = body.base_code.as_deref() {
            if !base.eq_ignore_ascii_case(from.code()) {
                return Err(RateError::BaseMismatch {
                    expected: from.code().to_string(),
                    got: base.to_string(),
                });
            }
        }

        Ok(body)
    }

    /// Fetch the rate for a single pair
    pub async fn quote(&self, from: Currency, to: Currency) -> Result<Quote, RateError> {
        let body = self.latest(from).await?;

        let rate = body
            .conversion_rates
            .get(to.code())
            .copied()
            .ok_or_else(|| RateError::MissingRate {
                from: from.code().to_string(),
                to: to.code().to_string(),
            })?;

        Ok(Quote {
            rate,
            last_updated: body.time_last_update_utc,
        })
    }
}

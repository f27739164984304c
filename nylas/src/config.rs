// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use crate::client::NylasClient;
use crate::error::Error;
use crate::http::HttpClient;
use crate::rate_limit::RateObserver;

/// Endpoint base of the US region.
pub const US_BASE_URL: &str = "https://api.us.nylas.com";

/// Endpoint base of the EU region.
pub const EU_BASE_URL: &str = "https://api.eu.nylas.com";

/// Data-residency region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// United States.
    #[default]
    Us,
    /// European Union.
    Eu,
}

impl Region {
    /// Endpoint base for this region.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Us => US_BASE_URL,
            Self::Eu => EU_BASE_URL,
        }
    }
}

/// Client configuration, suitable for loading from a configuration file.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ClientConfig {
    /// API key sent as the bearer credential.
    pub api_key: String,
    /// Endpoint base; overrides `region` when set.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Region used when no explicit `base_url` is given.
    #[serde(default)]
    pub region: Region,
    /// Per-attempt timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff in milliseconds.
    #[serde(default = "default_retry_wait")]
    pub retry_wait_ms: u64,
}

const fn default_timeout() -> u64 {
    90
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_retry_wait() -> u64 {
    500
}

pub(crate) fn default_user_agent() -> String {
    concat!("nylas-rust/", env!("CARGO_PKG_VERSION")).to_string()
}

impl From<ClientConfig> for ClientBuilder {
    fn from(config: ClientConfig) -> Self {
        let builder = Self::default()
            .api_key(config.api_key)
            .region(config.region)
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_retries(config.max_retries)
            .retry_wait(Duration::from_millis(config.retry_wait_ms));

        match config.base_url {
            Some(url) => builder.base_url(url),
            None => builder,
        }
    }
}

/// Builder for [`NylasClient`].
///
/// Setters are applied in order; the last one touching the endpoint base
/// (`base_url` or `region`) wins.
///
/// ```ignore
/// use std::time::Duration;
/// use nylas::{NylasClient, Region};
///
/// let client = NylasClient::builder()
///     .api_key("nyk_v0_...")
///     .region(Region::Eu)
///     .max_retries(3)
///     .retry_wait(Duration::from_millis(250))
///     .build()?;
/// # Ok::<(), nylas::Error>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: String,
    http: Option<reqwest::Client>,
    timeout: Duration,
    max_retries: u32,
    retry_wait: Duration,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: US_BASE_URL.to_string(),
            http: None,
            timeout: Duration::from_secs(default_timeout()),
            max_retries: default_max_retries(),
            retry_wait: Duration::from_millis(default_retry_wait()),
        }
    }
}

impl ClientBuilder {
    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the endpoint base. Trailing slashes are stripped.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Selects the endpoint base of a region.
    pub fn region(mut self, region: Region) -> Self {
        self.base_url = region.base_url().to_string();
        self
    }

    /// Replaces the HTTP executor.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Sets the deadline applied to each attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many times a failed attempt is retried; 0 disables retry.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial backoff interval.
    pub fn retry_wait(mut self, retry_wait: Duration) -> Self {
        self.retry_wait = retry_wait;
        self
    }

    /// Validates the options and creates the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if no API key was set, and
    /// [`Error::Config`] for an invalid endpoint base, a zero retry wait, or
    /// if the HTTP executor cannot be created.
    pub fn build(self) -> Result<NylasClient, Error> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or(Error::MissingCredential)?;

        if self.retry_wait.is_zero() {
            return Err(Error::Config("retry wait must be positive".to_string()));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL `{}`: {e}", self.base_url)))?;

        let http = match self.http {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .user_agent(default_user_agent())
                .build()
                .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?,
        };

        Ok(NylasClient::from_http(HttpClient {
            client: http,
            base_url: self.base_url,
            api_key,
            timeout: self.timeout,
            max_retries: self.max_retries,
            retry_wait: self.retry_wait,
            rate: RateObserver::default(),
        }))
    }
}

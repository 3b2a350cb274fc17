//! Backend client configuration.
//!
//! # Environment Variables
//!
//! [`BackendConfig::from_env`] reads:
//!
//! - `CHARGEFLOW_BASE_URL` - API base URL (default: [`SANDBOX_BASE_URL`])
//! - `CHARGEFLOW_PUBLIC_KEY` - Merchant public key sent on token issuance
//! - `CHARGEFLOW_TIMEOUT_SECS` - Per-request timeout in whole seconds

use std::time::Duration;

use reqwest::Client;
use reqwest::header::HeaderMap;
use url::Url;

use crate::constants::{ENV_BASE_URL, ENV_PUBLIC_KEY, ENV_TIMEOUT_SECS, SANDBOX_BASE_URL};
use crate::error::ConfigError;

/// Settings for an [`HttpWalletBackend`](crate::HttpWalletBackend).
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// API base URL, always ending with `/`.
    pub base_url: Url,
    /// Merchant public key sent on token issuance.
    pub public_key: Option<String>,
    /// Per-request timeout. No timeout when `None`.
    pub timeout: Option<Duration>,
    /// Extra headers sent with every request.
    pub headers: HeaderMap,
    /// Shared HTTP client. A default client is created when `None`.
    pub http_client: Option<Client>,
}

impl BackendConfig {
    /// Creates a config for the given base URL.
    ///
    /// A trailing slash is added to the base URL's path if missing, so that
    /// endpoint paths are joined below it.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            public_key: None,
            timeout: None,
            headers: HeaderMap::new(),
            http_client: None,
        }
    }

    /// Sets the merchant public key.
    #[must_use]
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Sets a timeout for every request.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches custom headers to every request.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Uses the given HTTP client instead of creating one.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Loads the config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the config from an arbitrary variable source.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let base_url = var(ENV_BASE_URL).unwrap_or_else(|| SANDBOX_BASE_URL.to_owned());
        let base_url = Url::parse(&base_url).map_err(|source| ConfigError::UrlParse {
            context: "Failed to parse base url",
            source,
        })?;
        let mut config = Self::new(base_url);

        if let Some(public_key) = var(ENV_PUBLIC_KEY) {
            config = config.with_public_key(public_key);
        }
        if let Some(value) = var(ENV_TIMEOUT_SECS) {
            let secs: u64 = value
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout { value: value.clone() })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

impl TryFrom<&str> for BackendConfig {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let url = Url::parse(value).map_err(|source| ConfigError::UrlParse {
            context: "Failed to parse base url",
            source,
        })?;
        Ok(Self::new(url))
    }
}

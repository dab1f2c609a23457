//! Client configuration.
//!
//! Provides [`ClientConfig`], the endpoint and API coordinates a client signs
//! and sends against. Values are loaded from environment variables or set
//! through the typed builder.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{Tc3Error, Tc3Result};
use crate::types::Region;

/// Configuration for one signed API family.
///
/// # Examples
///
/// ```
/// use tc3_core::ClientConfig;
///
/// let config = ClientConfig::default();
/// assert_eq!(config.endpoint, "aiart.tencentcloudapi.com");
/// assert_eq!(config.endpoint_url(), "https://aiart.tencentcloudapi.com/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// API host, also the signed `host` header.
    #[builder(default = String::from("aiart.tencentcloudapi.com"))]
    pub endpoint: String,

    /// URL scheme, `https` or `http`.
    #[builder(default = String::from("https"))]
    pub scheme: String,

    /// Service name used in the credential scope.
    #[builder(default = String::from("aiart"))]
    pub service: String,

    /// Region sent in `X-TC-Region`.
    #[builder(default)]
    pub region: Region,

    /// API version sent in `X-TC-Version`.
    #[builder(default = String::from("2022-12-29"))]
    pub version: String,

    /// Per-request timeout in seconds.
    #[builder(default = 300)]
    pub timeout_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `TC3_ENDPOINT` | `aiart.tencentcloudapi.com` |
    /// | `TC3_SCHEME` | `https` |
    /// | `TC3_SERVICE` | `aiart` |
    /// | `TC3_REGION` | `ap-guangzhou` |
    /// | `TC3_VERSION` | `2022-12-29` |
    /// | `TC3_TIMEOUT_SECS` | `300` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("TC3_ENDPOINT") {
            config.endpoint = v;
        }
        if let Ok(v) = std::env::var("TC3_SCHEME") {
            config.scheme = v;
        }
        if let Ok(v) = std::env::var("TC3_SERVICE") {
            config.service = v;
        }
        if let Ok(v) = std::env::var("TC3_REGION") {
            config.region = Region::new(v);
        }
        if let Ok(v) = std::env::var("TC3_VERSION") {
            config.version = v;
        }
        if let Ok(v) = std::env::var("TC3_TIMEOUT_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Check the settings a client cannot work without.
    ///
    /// # Errors
    ///
    /// Returns [`Tc3Error::Config`] for an empty endpoint, service or version,
    /// an unknown scheme, or a zero timeout.
    pub fn validate(&self) -> Tc3Result<()> {
        if self.endpoint.is_empty() {
            return Err(Tc3Error::Config("endpoint must not be empty".to_owned()));
        }
        if self.service.is_empty() {
            return Err(Tc3Error::Config("service must not be empty".to_owned()));
        }
        if self.version.is_empty() {
            return Err(Tc3Error::Config("version must not be empty".to_owned()));
        }
        if self.scheme != "https" && self.scheme != "http" {
            return Err(Tc3Error::Config(format!(
                "unsupported scheme: {}",
                self.scheme
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Tc3Error::Config("timeout must be positive".to_owned()));
        }
        Ok(())
    }

    /// The URL requests are posted to, `<scheme>://<endpoint>/`.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("{}://{}/", self.scheme, self.endpoint)
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

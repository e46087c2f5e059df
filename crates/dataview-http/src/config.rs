//! Service configuration.
//!
//! Loaded from TOML or JSON:
//!
//! ```toml
//! base_url = "https://api.example.com/v1/"
//! accept_json = true
//!
//! [default_headers]
//! X-Client = "dataview"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors from loading or validating a [`ServiceConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported base url scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
}

/// Where a service sends its requests and what it adds to all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base every filter path is resolved against.
    pub base_url: String,

    /// Headers sent with every request. A filter header of the same name
    /// wins.
    pub default_headers: BTreeMap<String, String>,

    /// Send `Accept: application/json` unless the filter sets `Accept`.
    /// Default: false
    pub accept_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_owned(),
            default_headers: BTreeMap::new(),
            accept_json: false,
        }
    }
}

impl ServiceConfig {
    /// Config for `base_url` with nothing else set.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// The parsed base URL. Only `http` and `https` are accepted.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_owned())),
        }
    }
}

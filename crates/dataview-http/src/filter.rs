//! Declarative request descriptions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Header names the services set themselves.
pub mod header {
    /// `Content-Type`
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// `Accept`
    pub const ACCEPT: &str = "Accept";
    /// `Authorization`
    pub const AUTHORIZATION: &str = "Authorization";
}

/// Media types used by the body encoders.
pub mod mime {
    /// JSON payloads.
    pub const JSON: &str = "application/json";
    /// URL-encoded forms.
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    /// Opaque uploads.
    pub const OCTET_STREAM: &str = "application/octet-stream";

    /// `multipart/form-data` with the given boundary.
    #[must_use]
    pub fn multipart_form_data(boundary: &str) -> String {
        format!("multipart/form-data; boundary={boundary}")
    }
}

/// HTTP request method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to request: path relative to the service base URL, method,
/// query parameters, headers and an optional body.
///
/// Parameters and headers are kept sorted, so two filters built with the
/// same entries in any order have the same [`identifier`](Self::identifier).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpDataFilter {
    pub path: String,
    pub method: HttpMethod,
    pub request_params: BTreeMap<String, String>,
    pub header_params: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl HttpDataFilter {
    /// A `GET` of `path` with nothing else set.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Add a query parameter, replacing any previous value.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_params.insert(key.into(), value.into());
        self
    }

    /// Add a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Fingerprint used to share identical in-flight requests.
    ///
    /// `path|METHOD|params|headers`, where params and headers are each
    /// form-encoded in key order. Escaping keeps every key and value apart,
    /// so two filters share an identifier only when they differ at most in
    /// their body.
    #[must_use]
    pub fn identifier(&self) -> String {
        let mut id = String::with_capacity(self.path.len() + 16);
        id.push_str(&self.path);
        id.push('|');
        id.push_str(self.method.as_str());
        for entries in [&self.request_params, &self.header_params] {
            let mut encoded = form_urlencoded::Serializer::new(String::new());
            for (key, value) in entries {
                encoded.append_pair(key, value);
            }
            id.push('|');
            id.push_str(&encoded.finish());
        }
        id
    }
}

//! Body encoders.
//!
//! Each constructor builds a complete [`HttpDataFilter`] and sets the
//! matching `Content-Type` header, overriding one passed in `headers`.
//!
//! | Constructor | Method | Body |
//! |-------------|--------|------|
//! | [`json`](HttpDataFilter::json) | `POST` | serialized value |
//! | [`form`](HttpDataFilter::form) | `POST` | `k=v&k2=v2`, none if the form is empty |
//! | [`multipart`](HttpDataFilter::multipart) | always `POST` | file part, then one part per field |

use std::collections::BTreeMap;

use serde::Serialize;
use ulid::Ulid;
use url::form_urlencoded;

use crate::filter::{HttpDataFilter, HttpMethod, header, mime};

/// Errors from body encoding.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("failed to encode JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// A file to upload in a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Form field name, also used as the file name.
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Upload {
    /// An `application/octet-stream` upload.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime::OCTET_STREAM.to_owned(),
            data,
        }
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

impl HttpDataFilter {
    /// A `POST` of `value` as JSON.
    pub fn json<T: Serialize + ?Sized>(
        path: impl Into<String>,
        value: &T,
    ) -> Result<Self, BodyError> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(path)
            .with_method(HttpMethod::Post)
            .with_header(header::CONTENT_TYPE, mime::JSON)
            .with_body(body))
    }

    /// A `POST` of `form` URL-encoded.
    ///
    /// Empty values are written as a bare key.
    pub fn form<K, V>(path: impl Into<String>, form: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let filter = Self::new(path).with_method(HttpMethod::Post);
        match encode_form(form) {
            Some(body) => filter
                .with_header(header::CONTENT_TYPE, mime::FORM_URLENCODED)
                .with_body(body.into_bytes()),
            None => filter,
        }
    }

    /// A `multipart/form-data` upload of `upload` followed by `fields`.
    ///
    /// The fields travel in the body; the filter carries no query
    /// parameters.
    pub fn multipart(
        path: impl Into<String>,
        upload: &Upload,
        fields: &BTreeMap<String, String>,
    ) -> Self {
        let boundary = format!("Boundary-{}", Ulid::new());
        let body = encode_multipart(&boundary, upload, fields);
        Self::new(path)
            .with_method(HttpMethod::Post)
            .with_header(header::CONTENT_TYPE, mime::multipart_form_data(&boundary))
            .with_body(body)
    }
}

fn encode_form<K, V>(form: impl IntoIterator<Item = (K, V)>) -> Option<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut parts = Vec::new();
    for (key, value) in form {
        let key: String = form_urlencoded::byte_serialize(key.as_ref().as_bytes()).collect();
        let value = value.as_ref();
        if value.is_empty() {
            parts.push(key);
        } else {
            let value: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
            parts.push(format!("{key}={value}"));
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("&"))
    }
}

pub(crate) fn encode_multipart(
    boundary: &str,
    upload: &Upload,
    fields: &BTreeMap<String, String>,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(upload.data.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{0}\"; filename=\"{0}\"\r\n",
            upload.name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", upload.mime_type).as_bytes());
    body.extend_from_slice(&upload.data);
    body.extend_from_slice(b"\r\n");

    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

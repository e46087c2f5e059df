//! Turning a filter into a concrete request.

use std::collections::BTreeMap;

use url::Url;
use url::form_urlencoded;

use crate::filter::{HttpDataFilter, HttpMethod};

/// A fully resolved request, ready for a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// Errors from request building.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The base URL cannot have path segments appended (e.g. `mailto:`).
    #[error("base url {0} cannot take a path")]
    CannotBeABase(Url),
}

/// Resolve `filter` against `base`.
///
/// The filter path is appended segment by segment to the base path. The
/// query is the filter parameters followed by any query written in the
/// path; when both are empty the base query is kept. Headers and body are
/// copied verbatim.
pub fn build_request(base: &Url, filter: &HttpDataFilter) -> Result<HttpRequest, RequestError> {
    let (path, embedded_query) = match filter.path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (filter.path.as_str(), None),
    };

    let mut url = base.clone();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if !segments.is_empty() {
        let mut base_segments = url
            .path_segments_mut()
            .map_err(|()| RequestError::CannotBeABase(base.clone()))?;
        base_segments.pop_if_empty().extend(segments);
    }

    let mut query: Vec<(String, String)> = filter
        .request_params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if let Some(embedded) = embedded_query {
        query.extend(form_urlencoded::parse(embedded.as_bytes()).into_owned());
    }
    if !query.is_empty() {
        url.query_pairs_mut().clear().extend_pairs(query);
    }

    Ok(HttpRequest {
        method: filter.method,
        url,
        headers: filter.header_params.clone(),
        body: filter.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::header;

    fn base() -> Url {
        Url::parse("https://api.example.com/v1/").unwrap()
    }

    #[test]
    fn path_is_appended_to_base_path() {
        let request = build_request(&base(), &HttpDataFilter::new("users/42")).unwrap();
        assert_eq!(request.url.as_str(), "https://api.example.com/v1/users/42");

        let bare = Url::parse("https://api.example.com/v1").unwrap();
        let request = build_request(&bare, &HttpDataFilter::new("/users")).unwrap();
        assert_eq!(request.url.as_str(), "https://api.example.com/v1/users");
    }

    #[test]
    fn params_then_embedded_query() {
        let filter = HttpDataFilter::new("/search?q=rust+lang").with_param("page", "2");
        let request = build_request(&base(), &filter).unwrap();
        assert_eq!(
            request.url.as_str(),
            "https://api.example.com/v1/search?page=2&q=rust+lang"
        );
    }

    #[test]
    fn empty_path_keeps_base() {
        let request = build_request(&base(), &HttpDataFilter::new("")).unwrap();
        assert_eq!(request.url, base());
    }

    #[test]
    fn headers_method_and_body_carry_over() {
        let filter = HttpDataFilter::new("/items")
            .with_method(HttpMethod::Put)
            .with_header(header::ACCEPT, "text/plain")
            .with_body(b"x".to_vec());
        let request = build_request(&base(), &filter).unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.headers, filter.header_params);
        assert_eq!(request.body.as_deref(), Some(&b"x"[..]));
    }

    #[test]
    fn non_hierarchical_base_is_rejected() {
        let base = Url::parse("mailto:team@example.com").unwrap();
        let err = build_request(&base, &HttpDataFilter::new("/x")).unwrap_err();
        assert!(matches!(err, RequestError::CannotBeABase(_)));
    }
}

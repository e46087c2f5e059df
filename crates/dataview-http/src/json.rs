//! Services that decode JSON bodies.

use std::fmt;
use std::marker::PhantomData;

use dataview_core::DataError;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::filter::{HttpDataFilter, header, mime};
use crate::service::{HttpService, Service};
use crate::transport::HttpResponse;

/// A decoded body together with the response it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub response: HttpResponse,
}

fn accept_json(mut filter: HttpDataFilter) -> HttpDataFilter {
    filter
        .header_params
        .insert(header::ACCEPT.to_owned(), mime::JSON.to_owned());
    filter
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<Decoded<T>, DataError> {
    match serde_json::from_slice(&response.body) {
        Ok(value) => Ok(Decoded { value, response }),
        Err(error) => {
            tracing::debug!(%error, status = response.status, "response body is not the expected JSON");
            Err(DataError::decode(error))
        }
    }
}

/// Asks for JSON and parses the body into a [`serde_json::Value`].
#[derive(Debug, Clone)]
pub struct JsonService {
    http: HttpService,
}

impl JsonService {
    pub fn new(http: HttpService) -> Self {
        Self { http }
    }

    #[must_use]
    pub fn http(&self) -> &HttpService {
        &self.http
    }
}

impl Service for JsonService {
    type Output = Decoded<serde_json::Value>;

    fn request(&self, filter: HttpDataFilter) -> BoxFuture<'static, Result<Self::Output, DataError>> {
        let response = self.http.send(accept_json(filter));
        async move { decode(response.await?) }.boxed()
    }
}

/// Asks for JSON and deserializes the body into `T`.
pub struct DecodableService<T> {
    http: HttpService,
    _target: PhantomData<fn() -> T>,
}

impl<T> DecodableService<T> {
    pub fn new(http: HttpService) -> Self {
        Self {
            http,
            _target: PhantomData,
        }
    }
}

impl<T> Clone for DecodableService<T> {
    fn clone(&self) -> Self {
        Self::new(self.http.clone())
    }
}

impl<T> fmt::Debug for DecodableService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodableService")
            .field("target", &std::any::type_name::<T>())
            .field("http", &self.http)
            .finish()
    }
}

impl<T: DeserializeOwned + Send + 'static> Service for DecodableService<T> {
    type Output = Decoded<T>;

    fn request(&self, filter: HttpDataFilter) -> BoxFuture<'static, Result<Self::Output, DataError>> {
        let response = self.http.send(accept_json(filter));
        async move { decode(response.await?) }.boxed()
    }
}

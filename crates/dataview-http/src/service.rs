//! The raw HTTP service.
//!
//! # Invariants
//!
//! 1. Requests with the same [`identifier`](HttpDataFilter::identifier),
//!    after default headers are applied, share one in-flight exchange.
//! 2. Every failed exchange is published once to the service's
//!    [`ErrorFeed`], whatever the number of waiting callers.
//! 3. Nothing is retried or memoized: a request issued after the previous
//!    one finished starts a new exchange.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use dataview_core::{DataError, ErrorCause};
use dataview_runtime::{RequestCache, RequestHandle};
use futures::FutureExt;
use futures::channel::mpsc;
use futures::future::BoxFuture;
use url::Url;

use crate::config::{ConfigError, ServiceConfig};
use crate::filter::{HttpDataFilter, header, mime};
use crate::request::build_request;
use crate::transport::{HttpResponse, Transport, classify};

/// Anything that answers a filter with a value.
pub trait Service: Send + Sync {
    type Output: Send + 'static;

    fn request(&self, filter: HttpDataFilter) -> BoxFuture<'static, Result<Self::Output, DataError>>;
}

// ---------------------------------------------------------------------------
// ErrorFeed
// ---------------------------------------------------------------------------

static GLOBAL_FEED: OnceLock<ErrorFeed> = OnceLock::new();

/// Broadcast of request failures to any number of listeners.
///
/// Listeners receive failures published after they subscribed. A listener
/// whose receiver was dropped is forgotten on the next publish.
#[derive(Clone, Default)]
pub struct ErrorFeed {
    listeners: Arc<Mutex<Vec<mpsc::UnboundedSender<DataError>>>>,
}

impl ErrorFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide feed services publish to by default.
    pub fn global() -> &'static ErrorFeed {
        GLOBAL_FEED.get_or_init(ErrorFeed::new)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<DataError>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DataError> {
        let (tx, rx) = mpsc::unbounded();
        self.lock().push(tx);
        rx
    }

    pub fn publish(&self, error: &DataError) {
        self.lock()
            .retain(|listener| listener.unbounded_send(error.clone()).is_ok());
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }
}

impl fmt::Debug for ErrorFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorFeed")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// HttpService
// ---------------------------------------------------------------------------

/// Sends filters through a [`Transport`], sharing identical in-flight
/// requests.
#[derive(Clone)]
pub struct HttpService {
    base_url: Url,
    default_headers: Arc<BTreeMap<String, String>>,
    transport: Arc<dyn Transport>,
    cache: RequestCache<HttpResponse, DataError>,
    errors: ErrorFeed,
}

impl HttpService {
    /// A service for `base_url` publishing to [`ErrorFeed::global`].
    pub fn new(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url,
            default_headers: Arc::new(BTreeMap::new()),
            transport,
            cache: RequestCache::new(),
            errors: ErrorFeed::global().clone(),
        }
    }

    /// A service built from validated configuration.
    pub fn from_config(
        config: &ServiceConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        let mut headers = config.default_headers.clone();
        if config.accept_json {
            headers
                .entry(header::ACCEPT.to_owned())
                .or_insert_with(|| mime::JSON.to_owned());
        }
        let mut service = Self::new(config.parsed_base_url()?, transport);
        service.default_headers = Arc::new(headers);
        Ok(service)
    }

    /// Publish failures to `errors` instead of the global feed.
    #[must_use]
    pub fn with_error_feed(mut self, errors: ErrorFeed) -> Self {
        self.errors = errors;
        self
    }

    /// Share in-flight requests through `cache`, e.g. one built with
    /// [`RequestCache::with_spawner`] so abandoned requests still finish.
    #[must_use]
    pub fn with_request_cache(mut self, cache: RequestCache<HttpResponse, DataError>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn errors(&self) -> &ErrorFeed {
        &self.errors
    }

    /// Failures of every request issued through this service from now on.
    pub fn subscribe_errors(&self) -> mpsc::UnboundedReceiver<DataError> {
        self.errors.subscribe()
    }

    /// Number of distinct exchanges in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.cache.len()
    }

    fn prepare(&self, mut filter: HttpDataFilter) -> HttpDataFilter {
        for (name, value) in self.default_headers.iter() {
            filter
                .header_params
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        filter
    }

    /// Send `filter`, or join the identical request already in flight.
    ///
    /// A new exchange is handed to the transport before this returns.
    pub fn send(&self, filter: HttpDataFilter) -> RequestHandle<HttpResponse, DataError> {
        let filter = self.prepare(filter);
        let key = filter.identifier();
        let base = self.base_url.clone();
        let transport = Arc::clone(&self.transport);
        let errors = self.errors.clone();

        self.cache.get_or_start(&key, move || {
            let exchange = build_request(&base, &filter).map(|request| {
                tracing::debug!(method = %request.method, url = %request.url, "sending request");
                transport.execute(request)
            });
            async move {
                let outcome = match exchange {
                    Ok(exchange) => classify(exchange.await),
                    Err(error) => Err(DataError::TransportFailure(ErrorCause::new(error))),
                };
                if let Err(error) = &outcome {
                    tracing::warn!(%error, path = %filter.path, "request failed");
                    errors.publish(error);
                }
                outcome
            }
        })
    }
}

impl Service for HttpService {
    type Output = HttpResponse;

    fn request(&self, filter: HttpDataFilter) -> BoxFuture<'static, Result<HttpResponse, DataError>> {
        self.send(filter).boxed()
    }
}

impl fmt::Debug for HttpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpService")
            .field("base_url", &self.base_url.as_str())
            .field("default_headers", &self.default_headers)
            .field("in_flight", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpRequest;
    use crate::transport::TransportError;
    use futures::StreamExt;
    use futures::executor::block_on;

    /// Answers every request with the same response and keeps the last one.
    struct Echo {
        status: u16,
        last: Mutex<Option<HttpRequest>>,
    }

    impl Transport for Echo {
        fn execute(
            &self,
            request: HttpRequest,
        ) -> BoxFuture<'static, Result<HttpResponse, TransportError>> {
            *self.last.lock().unwrap() = Some(request);
            let response = HttpResponse::new(self.status, "ok");
            async move { Ok(response) }.boxed()
        }
    }

    fn echo(status: u16) -> Arc<Echo> {
        Arc::new(Echo {
            status,
            last: Mutex::new(None),
        })
    }

    #[test]
    fn default_headers_do_not_override_filter() {
        let transport = echo(200);
        let mut config = ServiceConfig::new("https://api.example.com/");
        config.accept_json = true;
        config
            .default_headers
            .insert("X-Client".to_owned(), "dv".to_owned());
        let service = HttpService::from_config(&config, transport.clone())
            .unwrap()
            .with_error_feed(ErrorFeed::new());

        let filter = HttpDataFilter::new("/a").with_header("X-Client", "mine");
        block_on(service.send(filter)).unwrap();
        let sent = transport.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.headers["X-Client"], "mine");
        assert_eq!(sent.headers[header::ACCEPT], mime::JSON);
        assert_eq!(sent.url.as_str(), "https://api.example.com/a");
    }

    #[test]
    fn failures_are_published() {
        let feed = ErrorFeed::new();
        let service = HttpService::new(
            Url::parse("https://api.example.com/").unwrap(),
            echo(500),
        )
        .with_error_feed(feed.clone());
        let mut errors = service.subscribe_errors();

        let result = block_on(service.send(HttpDataFilter::new("/boom")));
        assert!(matches!(result, Err(DataError::InvalidStatus { code: 500, .. })));
        let published = block_on(errors.next()).unwrap();
        assert!(matches!(published, DataError::InvalidStatus { code: 500, .. }));
        assert_eq!(feed.listener_count(), 1);
    }

    #[test]
    fn dropped_listeners_are_forgotten() {
        let feed = ErrorFeed::new();
        let rx = feed.subscribe();
        drop(rx);
        feed.publish(&DataError::Unknown);
        assert_eq!(feed.listener_count(), 0);
    }
}

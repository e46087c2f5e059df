//! Request authorization.

use std::fmt;
use std::sync::Arc;

use dataview_core::{DataError, ErrorCause};
use futures::FutureExt;
use futures::future::{self, BoxFuture};

use crate::filter::{HttpDataFilter, header};
use crate::service::Service;

/// Prepares filters so the server accepts them, typically by adding
/// credentials. Failing to obtain credentials is an
/// [`DataError::AuthorizationFailure`].
pub trait AuthorizedService: Send + Sync {
    fn authorize(&self, filter: HttpDataFilter) -> BoxFuture<'static, Result<HttpDataFilter, DataError>>;
}

/// A service whose requests pass through an authorizer first.
///
/// A `401` answer is reported as [`DataError::AuthorizationFailure`].
pub struct Authorized<A, S> {
    authorizer: Arc<A>,
    service: Arc<S>,
}

impl<A, S> Authorized<A, S> {
    pub fn new(authorizer: A, service: S) -> Self {
        Self {
            authorizer: Arc::new(authorizer),
            service: Arc::new(service),
        }
    }
}

impl<A, S> Clone for Authorized<A, S> {
    fn clone(&self) -> Self {
        Self {
            authorizer: Arc::clone(&self.authorizer),
            service: Arc::clone(&self.service),
        }
    }
}

impl<A, S> Service for Authorized<A, S>
where
    A: AuthorizedService + 'static,
    S: Service + 'static,
{
    type Output = S::Output;

    fn request(&self, filter: HttpDataFilter) -> BoxFuture<'static, Result<S::Output, DataError>> {
        let authorization = self.authorizer.authorize(filter);
        let service = Arc::clone(&self.service);
        async move {
            let filter = authorization.await?;
            match service.request(filter).await {
                Err(DataError::InvalidStatus { code: 401, .. }) => Err(DataError::AuthorizationFailure(
                    ErrorCause::msg("credentials rejected (401)"),
                )),
                other => other,
            }
        }
        .boxed()
    }
}

/// Sends `Authorization: Bearer <token>` with the token current at request
/// time.
#[derive(Clone)]
pub struct BearerToken {
    token: Arc<dyn Fn() -> Option<String> + Send + Sync>,
}

impl BearerToken {
    pub fn new(token: impl Fn() -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            token: Arc::new(token),
        }
    }
}

impl AuthorizedService for BearerToken {
    fn authorize(&self, filter: HttpDataFilter) -> BoxFuture<'static, Result<HttpDataFilter, DataError>> {
        let outcome = match (self.token)() {
            Some(token) => Ok(filter.with_header(header::AUTHORIZATION, format!("Bearer {token}"))),
            None => {
                tracing::debug!(path = %filter.path, "no access token available");
                Err(DataError::AuthorizationFailure(ErrorCause::msg(
                    "no access token available",
                )))
            }
        };
        future::ready(outcome).boxed()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken").finish_non_exhaustive()
    }
}

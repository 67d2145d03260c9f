//! Correlation ids tie all log lines of one request together.
//!
//! The [`CorrelationIdMiddleware`] wraps the whole HTTP service. It takes the
//! id from the `x-correlation-id` request header (or generates a fresh
//! `req-<16 hex>` id), opens the `http_request` span carrying it, hands it
//! to the routes via the request extensions and echoes it on every response,
//! including error responses.

use crate::tools::id_generator::generate_request_id;
use crate::tools::watch::Watch;
use futures_util::future::BoxFuture;
use hyper::{Body, Request};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::task::{Context, Poll};
use tower::Service;
use tracing::Instrument;
use warp::http::{HeaderMap, HeaderValue};
use warp::reply::Response;
use warp::Filter;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// The id of one request.
///
/// A supplied header is kept as received so it can be echoed byte for byte,
/// the textual form (used for logging) replaces bytes which are not UTF-8.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorrelationId {
    value: String,
    header: Option<HeaderValue>,
}

impl CorrelationId {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        let value = correlation_id.into();
        let header = HeaderValue::from_str(&value).ok();

        CorrelationId { value, header }
    }

    pub fn generate() -> Self {
        CorrelationId::new(generate_request_id())
    }

    /// Reads the id from the request headers. Empty values count as absent.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(CORRELATION_ID_HEADER)
            .filter(|value| !value.is_empty())
            .map(|value| CorrelationId {
                value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
                header: Some(value.clone()),
            })
    }

    pub fn empty() -> Self {
        CorrelationId::default()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The value to echo, `None` if the id cannot be sent as a header.
    pub fn header_value(&self) -> Option<&HeaderValue> {
        self.header.as_ref()
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Provides the correlation id of the current request.
///
/// Behind the middleware this is the id it resolved. Otherwise the header is
/// consulted, and requests without one get an empty id.
pub fn with_correlation_id() -> impl Filter<Extract = (CorrelationId,), Error = Infallible> + Clone {
    warp::ext::optional::<CorrelationId>()
        .and(warp::header::headers_cloned())
        .map(|resolved: Option<CorrelationId>, headers: HeaderMap| {
            resolved
                .or_else(|| CorrelationId::from_headers(&headers))
                .unwrap_or_else(CorrelationId::empty)
        })
}

#[derive(Clone)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> CorrelationIdMiddleware<S> {
    pub fn new(inner: S) -> Self {
        CorrelationIdMiddleware { inner }
    }
}

impl<S> Service<Request<Body>> for CorrelationIdMiddleware<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let correlation_id =
            CorrelationId::from_headers(req.headers()).unwrap_or_else(CorrelationId::generate);
        req.extensions_mut().insert(correlation_id.clone());

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            http.method = %req.method(),
            http.url = %req.uri().path(),
            http.status_code = tracing::field::Empty,
        );

        // The readied service must be the one called, keep a fresh clone for the next request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let fut = async move {
            let watch = Watch::start();
            let mut response = inner.call(req).await?;

            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());

            match correlation_id.header_value() {
                Some(value) => {
                    response
                        .headers_mut()
                        .insert(CORRELATION_ID_HEADER, value.clone());
                }
                None => tracing::warn!("Cannot echo correlation id"),
            }

            tracing::debug!(
                status = status.as_u16(),
                duration_ms = watch.elapsed_ms(),
                "Request completed"
            );

            Ok(response)
        };

        Box::pin(fut.instrument(span))
    }
}

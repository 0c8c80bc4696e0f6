//! Correlation ids and the per-request span.
//!
//! An incoming `X-Correlation-ID` (or `X-Request-ID` from a proxy) is
//! reused when it is a UUID; otherwise a fresh one is minted. The id is put
//! in request extensions, attached to an `http_request` span that wraps the
//! rest of the stack, and echoed back in the response.

use axum::http::{HeaderMap, HeaderValue, Request};
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the correlation id.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Accepted on requests when [`CORRELATION_ID_HEADER`] is absent.
const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Layer installing correlation id tracking.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// See [`correlation_id_layer`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdService { inner }
    }
}

/// Service produced by [`CorrelationIdLayer`].
#[derive(Clone, Debug)]
pub struct CorrelationIdService<S> {
    inner: S,
}

fn incoming_id(headers: &HeaderMap) -> Option<Uuid> {
    [CORRELATION_ID_HEADER, REQUEST_ID_HEADER]
        .into_iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| Uuid::parse_str(value.trim()).ok())
}

impl<S, B> Service<Request<B>> for CorrelationIdService<S>
where
    S: Service<Request<B>, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let id = incoming_id(req.headers()).unwrap_or_else(Uuid::new_v4);
        req.extensions_mut().insert(id);

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %id,
            method = %req.method(),
            path = %req.uri().path(),
            status = tracing::field::Empty,
        );
        let response = self.inner.call(req).instrument(span.clone());

        Box::pin(async move {
            let mut response = response.await?;
            span.record("status", response.status().as_u16());

            if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                response.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}

/// Access to the id stored by [`correlation_id_layer`].
pub trait CorrelationIdExt {
    /// The request's correlation id, if the layer ran.
    fn correlation_id(&self) -> Option<Uuid>;
}

impl<B> CorrelationIdExt for Request<B> {
    fn correlation_id(&self) -> Option<Uuid> {
        self.extensions().get::<Uuid>().copied()
    }
}

use crate::dispatcher::Dispatcher;
use crate::server::IncomingRequest;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use http::HeaderMap;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// A fully built request, ready for the wire.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: http::Method,
    /// Absolute URL, or a path when the client has no base URL.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// Sends an [`OutgoingRequest`] and returns the raw response.
///
/// Implemented for [`ReqwestTransport`], [`LocalTransport`] and any
/// `Fn(OutgoingRequest) -> impl Future<Output = Result<TransportResponse, TransportError>>`.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutgoingRequest)
        -> BoxFuture<'_, Result<TransportResponse, TransportError>>;
}

impl<F, Fut> Transport for F
where
    F: Fn(OutgoingRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<TransportResponse, TransportError>> + Send + 'static,
{
    fn send(
        &self,
        request: OutgoingRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        self(request).boxed()
    }
}

/// HTTP transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: OutgoingRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        let mut builder = self
            .client
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        async move {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok(TransportResponse {
                status,
                headers,
                body,
            })
        }
        .boxed()
    }
}

/// In-process transport that hands requests straight to a [`Dispatcher`].
///
/// Scheme and host are stripped; only path and query reach the dispatcher.
#[derive(Clone)]
pub struct LocalTransport {
    dispatcher: Dispatcher,
}

impl LocalTransport {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        LocalTransport { dispatcher }
    }
}

/// Path and query of `url`; relative URLs pass through untouched.
fn local_target(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

impl Transport for LocalTransport {
    fn send(
        &self,
        request: OutgoingRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        async move {
            let target = local_target(&request.url);
            debug!(method = %request.method, target = %target, "Local dispatch");
            let mut incoming = IncomingRequest::new(request.method.as_str(), target);
            incoming.headers = request.headers;
            if let Some(body) = request.body {
                incoming.body = body;
            }
            let (parts, body) = self.dispatcher.handle(incoming).await.into_http().into_parts();
            Ok(TransportResponse {
                status: parts.status.as_u16(),
                headers: parts.headers,
                body,
            })
        }
        .boxed()
    }
}

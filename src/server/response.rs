use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::warn;

/// Maximum response headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 8;

/// Stack-allocated response header storage.
///
/// Names are `Arc<str>` since the same few (`content-type`, `x-request-id`)
/// repeat on every response.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Transport-independent response produced by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    pub status: u16,
    pub headers: HeaderVec,
    /// JSON body; `None` for HEAD responses.
    pub body: Option<Value>,
}

impl DispatchResponse {
    /// A JSON response with `content-type: application/json`.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body: Some(body),
        }
    }

    /// `{ "error": label }`
    #[must_use]
    pub fn error(status: u16, label: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": label }))
    }

    /// Get a header by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Drop the body, keeping status and headers (HEAD).
    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Serialized body bytes; empty when there is no body.
    #[must_use]
    pub fn body_bytes(&self) -> Bytes {
        match &self.body {
            Some(body) => Bytes::from(body.to_string()),
            None => Bytes::new(),
        }
    }

    /// Convert into an `http::Response` for host adapters.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let body = self.body_bytes();
        let mut response = http::Response::new(body);
        *response.status_mut() = http::StatusCode::from_u16(self.status)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().append(name, value);
                }
                _ => warn!(header_name = %name, "Skipping invalid response header"),
            }
        }
        response
    }
}

use super::HandlerError;
use crate::contract::HttpMethod;
use crate::ids::RequestId;
use crate::route::ParamMap;
use crate::router::RouteId;
use crate::server::RawHandle;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::any::Any;

/// Everything a handler receives for one request.
///
/// Params are exactly what the route's `parse` produced. Query and body have
/// already passed their schemas (when the contract declares one), so the
/// typed accessors only fail when the handler's type disagrees with the
/// contract.
pub struct RequestContext {
    pub request_id: RequestId,
    pub route_id: RouteId,
    pub method: HttpMethod,
    pub path: String,
    pub params: ParamMap,
    pub query: Value,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    pub(crate) raw: Option<RawHandle>,
}

impl RequestContext {
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Header value as a string; `None` if absent or not visible ASCII.
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Deserialize the validated query into `T`.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        T::deserialize(&self.query)
            .map_err(|e| HandlerError::bad_request(format!("Invalid query: {e}")))
    }

    /// Deserialize the validated body into `T`; a missing body is an error.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| HandlerError::bad_request("Request body required"))?;
        T::deserialize(body).map_err(|e| HandlerError::bad_request(format!("Invalid body: {e}")))
    }

    /// The host transport's request object, if it was attached as a `T`.
    #[must_use]
    pub fn raw<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.raw.as_ref().and_then(|raw| raw.downcast_ref::<T>())
    }
}

use super::transport::{OutgoingRequest, ReqwestTransport, Transport, TransportError};
use crate::contract::Contract;
use crate::route::RouteBuildError;
use crate::schema::SchemaError;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build request path: {0}")]
    Build(#[from] RouteBuildError),
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("server responded with status {status}")]
    Status { status: u16, body: Value },
    #[error("response body is not valid JSON (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("response for `{route}` failed validation")]
    ResponseValidation {
        route: String,
        #[source]
        source: SchemaError,
    },
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => warn!(header_name = %name, "Ignoring invalid header"),
    }
}

/// Settings shared by every call a [`Client`] makes.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Prefixed to built paths; empty leaves paths relative.
    pub base_url: String,
    pub default_headers: HeaderMap,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            default_headers: HeaderMap::new(),
        }
    }

    /// Add a header sent with every call. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        insert_header(&mut self.default_headers, name, value);
        self
    }
}

/// Per-call inputs: URL params, optional query and body, extra headers.
#[derive(Debug, Clone)]
pub struct CallInput {
    pub params: Value,
    pub query: Option<Value>,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl Default for CallInput {
    fn default() -> Self {
        CallInput {
            params: Value::Object(serde_json::Map::new()),
            query: None,
            body: None,
            headers: HeaderMap::new(),
        }
    }
}

impl CallInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize any value as the body.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(|e| ClientError::Encode(e.to_string()))?;
        Ok(self.body(value))
    }

    /// Per-call header; overrides a default header of the same name.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        insert_header(&mut self.headers, name, value);
        self
    }
}

fn push_pair(
    serializer: &mut url::form_urlencoded::Serializer<'_, String>,
    key: &str,
    value: &Value,
) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => {
            serializer.append_pair(key, &value.to_string());
        }
        Value::Array(items) => {
            for item in items {
                if item.is_array() {
                    serializer.append_pair(key, &item.to_string());
                } else {
                    push_pair(serializer, key, item);
                }
            }
        }
    }
}

/// Encode a query object as `application/x-www-form-urlencoded`.
///
/// Arrays become repeated keys, `null` values are skipped and nested
/// objects are sent as JSON text. `null` as a whole encodes to `""`.
pub fn build_query_string(query: &Value) -> Result<String, ClientError> {
    let map = match query {
        Value::Null => return Ok(String::new()),
        Value::Object(map) => map,
        other => {
            return Err(ClientError::Encode(format!(
                "query must be an object, got {other}"
            )))
        }
    };
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        push_pair(&mut serializer, key, value);
    }
    Ok(serializer.finish())
}

/// Prefix `path` with `base`, unless `path` is already an absolute URL.
fn join_url(base: &str, path: &str) -> String {
    if url::Url::parse(path).is_ok() {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Invokes contracts over a [`Transport`].
///
/// Outgoing query and body are sent as given; the response is checked
/// against the contract's response schema when one is declared.
#[derive(Debug, Clone)]
pub struct Client<T = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
}

impl Client<ReqwestTransport> {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::default())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Client { config, transport }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request a call would send, without sending it.
    pub fn request_for(
        &self,
        contract: &Contract,
        input: &CallInput,
    ) -> Result<OutgoingRequest, ClientError> {
        let path = contract.build_path(&input.params)?;
        let mut url = join_url(&self.config.base_url, &path);
        if let Some(query) = &input.query {
            let encoded = build_query_string(query)?;
            if !encoded.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&encoded);
            }
        }

        let mut headers = self.config.default_headers.clone();
        for name in input.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in &input.headers {
            headers.append(name.clone(), value.clone());
        }

        let body = match &input.body {
            Some(body) => {
                let bytes =
                    serde_json::to_vec(body).map_err(|e| ClientError::Encode(e.to_string()))?;
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(Bytes::from(bytes))
            }
            None => None,
        };

        Ok(OutgoingRequest {
            method: contract.method().as_http(),
            url,
            headers,
            body,
        })
    }

    /// Call `contract` and return the (validated) JSON response.
    pub async fn call(&self, contract: &Contract, input: CallInput) -> Result<Value, ClientError> {
        self.exchange(contract, input).await.map(|(_, value)| value)
    }

    /// [`Client::call`], deserializing the validated value into `R`.
    pub async fn call_as<R: DeserializeOwned>(
        &self,
        contract: &Contract,
        input: CallInput,
    ) -> Result<R, ClientError> {
        let (status, value) = self.exchange(contract, input).await?;
        R::deserialize(value).map_err(|source| ClientError::Decode { status, source })
    }

    async fn exchange(
        &self,
        contract: &Contract,
        input: CallInput,
    ) -> Result<(u16, Value), ClientError> {
        let request = self.request_for(contract, &input)?;
        let label = contract.label();
        debug!(contract = %label, method = %request.method, url = %request.url, "Client call start");

        let start = Instant::now();
        let response = self.transport.send(request).await?;
        let status = response.status;
        info!(
            contract = %label,
            status,
            latency_ms = start.elapsed().as_millis() as u64,
            "Client call complete"
        );

        if !(200..300).contains(&status) {
            let body = if response.body.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&response.body).unwrap_or_else(|_| {
                    Value::String(String::from_utf8_lossy(&response.body).into_owned())
                })
            };
            return Err(ClientError::Status { status, body });
        }

        let value = if response.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&response.body)
                .map_err(|source| ClientError::Decode { status, source })?
        };

        let value = match contract.response_schema() {
            Some(schema) => schema.validate(&value).map_err(|source| {
                warn!(contract = %label, issues = ?source.issues, "Response failed validation");
                ClientError::ResponseValidation {
                    route: label.clone(),
                    source,
                }
            })?,
            None => value,
        };
        Ok((status, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string_encoding() {
        let qs = build_query_string(&json!({
            "limit": 10,
            "tags": ["a b", "c&d"],
            "skip": null,
            "filter": {"x": 1}
        }))
        .unwrap();
        let mut pairs: Vec<&str> = qs.split('&').collect();
        pairs.sort_unstable();
        assert_eq!(
            pairs,
            vec!["filter=%7B%22x%22%3A1%7D", "limit=10", "tags=a+b", "tags=c%26d"]
        );
    }

    #[test]
    fn test_query_must_be_object() {
        assert!(matches!(
            build_query_string(&json!([1, 2])),
            Err(ClientError::Encode(_))
        ));
        assert_eq!(build_query_string(&Value::Null).unwrap(), "");
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h:1/", "/a"), "http://h:1/a");
        assert_eq!(join_url("http://h:1", "a"), "http://h:1/a");
        assert_eq!(join_url("", "/a"), "/a");
        assert_eq!(
            join_url("http://h:1", "https://tenant.example.com/x"),
            "https://tenant.example.com/x"
        );
    }
}

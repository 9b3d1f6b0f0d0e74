use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use serde_json::{Map, Number, Value};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opaque handle to the host transport's own request object.
pub type RawHandle = Arc<dyn Any + Send + Sync>;

/// Transport-independent view of an incoming request.
///
/// Host adapters fill this in from whatever their server hands them; the
/// dispatcher does the rest.
#[derive(Clone)]
pub struct IncomingRequest {
    /// Method as received; normalized case-insensitively by the dispatcher.
    pub method: String,
    /// Path with optional `?query`.
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub raw: Option<RawHandle>,
}

impl IncomingRequest {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        IncomingRequest {
            method: method.into(),
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            raw: None,
        }
    }

    /// Add a header; names or values that are not valid HTTP are dropped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => warn!(header_name = %name, "Dropping invalid request header"),
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `body` as the JSON request body.
    #[must_use]
    pub fn with_json(mut self, body: &Value) -> Self {
        self.body = Bytes::from(body.to_string());
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    /// Attach the host transport's request object for handlers that need it.
    #[must_use]
    pub fn with_raw<T: Any + Send + Sync>(mut self, raw: T) -> Self {
        self.raw = Some(Arc::new(raw));
        self
    }

    /// Path component only: query string and fragment stripped.
    #[must_use]
    pub fn path(&self) -> &str {
        let end = self.uri.find(['?', '#']).unwrap_or(self.uri.len());
        &self.uri[..end]
    }

    /// Raw query string without the leading `?`.
    #[must_use]
    pub fn query_str(&self) -> Option<&str> {
        let (_, rest) = self.uri.split_once('?')?;
        Some(rest.split('#').next().unwrap_or(rest))
    }

    /// Adapt an `http::Request`, keeping its extensions as the raw handle.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        let uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        IncomingRequest {
            method: parts.method.as_str().to_string(),
            uri,
            headers: parts.headers,
            body,
            raw: Some(Arc::new(parts.extensions)),
        }
    }
}

/// Whether `s` looks like a plain decimal number: `-?(0|[1-9][0-9]*)(\.[0-9]+)?`.
///
/// Leading zeros, exponents and signs other than `-` keep the value a string
/// so identifiers such as `007` survive intact.
fn is_numeric_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };
    let int_ok = !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && (int_part == "0" || !int_part.starts_with('0'));
    let frac_ok = frac_part.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()));
    int_ok && frac_ok
}

fn coerce_query_value(raw: String) -> Value {
    if !is_numeric_literal(&raw) {
        return Value::String(raw);
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    match raw.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(number) => Value::Number(number),
        None => Value::String(raw),
    }
}

/// Parse a raw query string into a JSON object.
///
/// Keys and values are form-decoded (`+` is a space). A key that appears
/// more than once collects its values into an array in order of appearance.
/// With `coerce_numbers`, numeric-looking values become JSON numbers.
#[must_use]
pub fn parse_query(query: &str, coerce_numbers: bool) -> Value {
    let mut object = Map::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = if coerce_numbers {
            coerce_query_value(value.into_owned())
        } else {
            Value::String(value.into_owned())
        };
        match object.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(key.into_owned(), value);
            }
        }
    }

    // R4: Query params parsed
    debug!(param_count = object.len(), "Query params parsed");
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_and_query_split() {
        let req = IncomingRequest::new("GET", "/api/projects?limit=5#top");
        assert_eq!(req.path(), "/api/projects");
        assert_eq!(req.query_str(), Some("limit=5"));

        let bare = IncomingRequest::new("GET", "/api/projects");
        assert_eq!(bare.path(), "/api/projects");
        assert_eq!(bare.query_str(), None);
    }

    #[test]
    fn test_parse_query_coerces_numbers() {
        let q = parse_query("limit=10&ratio=0.5&neg=-3&name=acme", true);
        assert_eq!(q, json!({"limit": 10, "ratio": 0.5, "neg": -3, "name": "acme"}));
    }

    #[test]
    fn test_parse_query_keeps_identifier_like_values() {
        let q = parse_query("id=007&exp=1e5&dot=1.&blank=&hex=0x10", true);
        assert_eq!(
            q,
            json!({"id": "007", "exp": "1e5", "dot": "1.", "blank": "", "hex": "0x10"})
        );
    }

    #[test]
    fn test_parse_query_without_coercion() {
        assert_eq!(parse_query("limit=10", false), json!({"limit": "10"}));
    }

    #[test]
    fn test_parse_query_repeated_keys_become_arrays() {
        let q = parse_query("tag=a&tag=b&tag=3", true);
        assert_eq!(q, json!({"tag": ["a", "b", 3]}));
    }

    #[test]
    fn test_parse_query_decodes_form_encoding() {
        let q = parse_query("q=hello+world&x=%26%3D", true);
        assert_eq!(q, json!({"q": "hello world", "x": "&="}));
    }

    #[test]
    fn test_parse_query_huge_integer_falls_back_to_float() {
        let q = parse_query("big=123456789012345678901234567890", true);
        assert!(q["big"].is_f64());
    }

    #[test]
    fn test_with_header_and_json() {
        let req = IncomingRequest::new("post", "/x")
            .with_header("X-Trace", "abc")
            .with_header("bad header", "v")
            .with_json(&json!({"a": 1}));
        assert_eq!(req.headers.get("x-trace").unwrap(), "abc");
        assert_eq!(req.headers.len(), 2);
        assert_eq!(&req.body[..], br#"{"a":1}"#);
    }

    #[test]
    fn test_from_http_request() {
        let http_req = http::Request::builder()
            .method("PATCH")
            .uri("https://example.com/api/items/4?full=true")
            .header("x-request-id", "abc")
            .body(Bytes::from_static(b"{}"))
            .unwrap();
        let req = IncomingRequest::from_http(http_req);
        assert_eq!(req.method, "PATCH");
        assert_eq!(req.uri, "/api/items/4?full=true");
        assert_eq!(req.path(), "/api/items/4");
        assert!(req.raw.is_some());
    }
}

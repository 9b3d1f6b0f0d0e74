//! # Contract Module
//!
//! A [`Contract`] bundles everything both ends of an endpoint must agree on:
//! the HTTP method, the [`Route`], and optional schemas for the query, the
//! request body and the response.
//!
//! URL params are deliberately absent from the validated set. A pattern
//! route may carry a params schema for documentation and build/parse
//! symmetry, but the dispatcher hands extracted params to handlers as plain
//! strings.
//!
//! ```rust
//! use brrtcontract::contract::Contract;
//! use brrtcontract::route::Route;
//! use brrtcontract::schema::JsonSchema;
//! use serde_json::json;
//!
//! let create_project = Contract::post(Route::exact("/api/projects"))
//!     .with_body(
//!         JsonSchema::compile(json!({
//!             "type": "object",
//!             "required": ["name"],
//!             "properties": { "name": { "type": "string", "minLength": 1, "maxLength": 255 } }
//!         }))
//!         .unwrap(),
//!     )
//!     .named("create_project");
//!
//! assert_eq!(create_project.label(), "create_project");
//! ```

use crate::route::{Route, RouteBuildError};
use crate::schema::{erase, DynSchema, Schema};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Methods a contract can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// A method string that is not one of the contract methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported contract method `{0}`")]
pub struct UnsupportedMethod(pub String);

impl HttpMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    #[must_use]
    pub fn as_http(&self) -> http::Method {
        match self {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Delete => http::Method::DELETE,
        }
    }

    /// Whether requests with this method have their body read.
    #[must_use]
    pub fn reads_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<&http::Method> for HttpMethod {
    type Error = UnsupportedMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method, route and optional query/body/response schemas for one endpoint.
///
/// Built once at startup and read-only afterwards; cloning is cheap since
/// schemas are reference counted.
#[derive(Clone)]
pub struct Contract {
    method: HttpMethod,
    route: Route,
    query: Option<DynSchema>,
    body: Option<DynSchema>,
    response: Option<DynSchema>,
    name: Option<String>,
}

impl Contract {
    pub fn new(method: HttpMethod, route: Route) -> Self {
        Contract {
            method,
            route,
            query: None,
            body: None,
            response: None,
            name: None,
        }
    }

    pub fn get(route: Route) -> Self {
        Self::new(HttpMethod::Get, route)
    }

    pub fn post(route: Route) -> Self {
        Self::new(HttpMethod::Post, route)
    }

    pub fn put(route: Route) -> Self {
        Self::new(HttpMethod::Put, route)
    }

    pub fn patch(route: Route) -> Self {
        Self::new(HttpMethod::Patch, route)
    }

    pub fn delete(route: Route) -> Self {
        Self::new(HttpMethod::Delete, route)
    }

    #[must_use]
    pub fn with_query<S>(mut self, schema: S) -> Self
    where
        S: Schema + 'static,
        S::Output: Serialize,
    {
        self.query = Some(erase(schema));
        self
    }

    #[must_use]
    pub fn with_body<S>(mut self, schema: S) -> Self
    where
        S: Schema + 'static,
        S::Output: Serialize,
    {
        self.body = Some(erase(schema));
        self
    }

    #[must_use]
    pub fn with_response<S>(mut self, schema: S) -> Self
    where
        S: Schema + 'static,
        S::Output: Serialize,
    {
        self.response = Some(erase(schema));
        self
    }

    /// Name used in logs instead of `METHOD pattern`.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    #[must_use]
    pub fn query_schema(&self) -> Option<&DynSchema> {
        self.query.as_ref()
    }

    #[must_use]
    pub fn body_schema(&self) -> Option<&DynSchema> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn response_schema(&self) -> Option<&DynSchema> {
        self.response.as_ref()
    }

    /// The contract name, or `METHOD pattern` when unnamed.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.method, self.route),
        }
    }

    /// Build the request path for this contract.
    pub fn build_path(&self, params: &Value) -> Result<String, RouteBuildError> {
        self.route.build(params)
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("method", &self.method)
            .field("route", &self.route)
            .field("query", &self.query.is_some())
            .field("body", &self.body.is_some())
            .field("response", &self.response.is_some())
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JsonSchema;
    use serde_json::json;

    #[test]
    fn test_method_parsing_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("HEAD".parse::<HttpMethod>().is_err());
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }

    #[test]
    fn test_method_http_conversion() {
        assert_eq!(HttpMethod::Delete.as_http(), http::Method::DELETE);
        assert_eq!(HttpMethod::try_from(&http::Method::PUT).unwrap(), HttpMethod::Put);
        assert!(HttpMethod::try_from(&http::Method::OPTIONS).is_err());
        assert!(!HttpMethod::Get.reads_body());
        assert!(HttpMethod::Delete.reads_body());
    }

    #[test]
    fn test_contract_label() {
        let contract = Contract::get(Route::pattern("/api/projects/:id").unwrap());
        assert_eq!(contract.label(), "GET /api/projects/:id");
        assert_eq!(contract.named("get_project").label(), "get_project");
    }

    #[test]
    fn test_contract_schemas_are_optional() {
        let contract = Contract::post(Route::exact("/api/projects"));
        assert!(contract.query_schema().is_none());
        assert!(contract.body_schema().is_none());
        assert!(contract.response_schema().is_none());

        let contract = contract.with_body(JsonSchema::compile(json!({"type": "object"})).unwrap());
        assert!(contract.body_schema().is_some());
        assert!(format!("{contract:?}").contains("body: true"));
    }

    #[test]
    fn test_build_path_delegates_to_route() {
        let contract = Contract::delete(Route::pattern("/api/projects/:id").unwrap());
        assert_eq!(
            contract.build_path(&json!({"id": 7})).unwrap(),
            "/api/projects/7"
        );
    }
}

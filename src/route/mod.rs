//! # Route Module
//!
//! A [`Route`] describes how one logical endpoint maps to a URL. It is shared
//! verbatim between the server (which parses incoming paths with it) and the
//! client (which builds outgoing URLs with it), so both sides agree on the URL
//! shape by construction.
//!
//! ## Variants
//!
//! | Variant | `build` | `parse` | `is` | server pattern |
//! |---|---|---|---|---|
//! | [`Route::Static`] | fixed path | empty params on exact match | exact equality | the path |
//! | [`Route::Pattern`] | template substitution (or custom builder) | compiled matcher | anchored regex | the template |
//! | [`Route::Custom`] | caller closure | caller closure | caller closure | none |
//!
//! Custom routes cover URLs a flat template cannot express (subdomain or
//! query-based dispatch). They have no server-registrable pattern, so host
//! frameworks with native template routers must probe them linearly with
//! [`Route::is`].
//!
//! ## Example
//!
//! ```rust
//! use brrtcontract::route::Route;
//! use serde_json::json;
//!
//! let route = Route::pattern("/api/projects/:id").unwrap();
//! let url = route.build(&json!({ "id": "p 1" })).unwrap();
//! assert_eq!(url, "/api/projects/p%201");
//! assert_eq!(route.parse(&url).unwrap()["id"], "p 1");
//! ```

mod pattern;

pub use pattern::{CompiledPattern, PatternError};

use crate::schema::DynSchema;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Path parameters extracted from a URL: placeholder name to decoded value.
pub type ParamMap = BTreeMap<String, String>;

/// Caller-supplied URL builder.
pub type BuildFn = Arc<dyn Fn(&Value) -> Result<String, RouteBuildError> + Send + Sync>;
/// Caller-supplied URL parser; `None` means the URL does not belong to the route.
pub type ParseFn = Arc<dyn Fn(&str) -> Option<ParamMap> + Send + Sync>;
/// Caller-supplied URL predicate.
pub type IsFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Failure to build a URL from parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteBuildError {
    #[error("missing route parameter `{name}`")]
    MissingParam { name: String },
    #[error("route parameter `{name}` is empty")]
    EmptyParam { name: String },
    #[error("route parameter `{name}` must be a string, number or boolean")]
    UnsupportedValue { name: String },
    #[error("route parameters could not be serialized: {message}")]
    Serialize { message: String },
    /// Free-form failure reported by a custom builder.
    #[error("{0}")]
    Custom(String),
}

/// Placeholder syntax used when exporting a pattern to a host router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternSyntax {
    /// `/items/:id` (Express, Hono, axum 0.7)
    #[default]
    Colon,
    /// `/items/{id}` (OpenAPI, axum 0.8, matchit)
    Braces,
}

/// Which variant a [`Route`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Static,
    Pattern,
    Custom,
}

/// An exact, parameterless path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    path: String,
}

impl StaticRoute {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A `:name` template with an optional params schema and builder override.
///
/// The params schema documents the parameter shape for callers; the
/// dispatcher never validates extracted params against it.
#[derive(Clone)]
pub struct PatternRoute {
    compiled: CompiledPattern,
    params_schema: Option<DynSchema>,
    builder: Option<BuildFn>,
}

impl PatternRoute {
    pub fn new(template: &str) -> Result<Self, PatternError> {
        Ok(Self {
            compiled: CompiledPattern::compile(template)?,
            params_schema: None,
            builder: None,
        })
    }

    /// Attach a schema describing the extracted parameters.
    #[must_use]
    pub fn with_params_schema(mut self, schema: DynSchema) -> Self {
        self.params_schema = Some(schema);
        self
    }

    /// Replace the default placeholder substitution with a custom builder.
    #[must_use]
    pub fn with_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&Value) -> Result<String, RouteBuildError> + Send + Sync + 'static,
    {
        self.builder = Some(Arc::new(builder));
        self
    }

    #[must_use]
    pub fn compiled(&self) -> &CompiledPattern {
        &self.compiled
    }

    #[must_use]
    pub fn params_schema(&self) -> Option<&DynSchema> {
        self.params_schema.as_ref()
    }
}

/// Three independent closures giving full control over the URL.
#[derive(Clone)]
pub struct CustomRoute {
    build: BuildFn,
    parse: ParseFn,
    is: IsFn,
}

/// How a logical endpoint maps to a URL. Immutable once constructed.
#[derive(Clone)]
pub enum Route {
    Static(StaticRoute),
    Pattern(PatternRoute),
    Custom(CustomRoute),
}

impl Route {
    /// A static route matching exactly `path`.
    pub fn exact(path: impl Into<String>) -> Self {
        Route::Static(StaticRoute { path: path.into() })
    }

    /// A pattern route compiled from a `:name` template.
    pub fn pattern(template: &str) -> Result<Self, PatternError> {
        PatternRoute::new(template).map(Route::Pattern)
    }

    /// A custom route from caller-supplied `build`, `parse` and `is`.
    pub fn custom<B, P, I>(build: B, parse: P, is: I) -> Self
    where
        B: Fn(&Value) -> Result<String, RouteBuildError> + Send + Sync + 'static,
        P: Fn(&str) -> Option<ParamMap> + Send + Sync + 'static,
        I: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Route::Custom(CustomRoute {
            build: Arc::new(build),
            parse: Arc::new(parse),
            is: Arc::new(is),
        })
    }

    #[must_use]
    pub fn kind(&self) -> RouteKind {
        match self {
            Route::Static(_) => RouteKind::Static,
            Route::Pattern(_) => RouteKind::Pattern,
            Route::Custom(_) => RouteKind::Custom,
        }
    }

    /// Build a URL from a JSON object of parameter values.
    ///
    /// Static routes ignore `params`.
    pub fn build(&self, params: &Value) -> Result<String, RouteBuildError> {
        match self {
            Route::Static(route) => Ok(route.path.clone()),
            Route::Pattern(route) => match &route.builder {
                Some(builder) => builder(params),
                None => route.compiled.build(params),
            },
            Route::Custom(route) => (route.build)(params),
        }
    }

    /// Build a URL from any serializable parameter struct.
    pub fn build_from<P: Serialize + ?Sized>(&self, params: &P) -> Result<String, RouteBuildError> {
        let value = serde_json::to_value(params).map_err(|e| RouteBuildError::Serialize {
            message: e.to_string(),
        })?;
        self.build(&value)
    }

    /// Extract parameters from a path, or `None` if the path is not this route.
    #[must_use]
    pub fn parse(&self, path: &str) -> Option<ParamMap> {
        match self {
            Route::Static(route) => (route.path == path).then(ParamMap::new),
            Route::Pattern(route) => route.compiled.match_path(path),
            Route::Custom(route) => (route.parse)(path),
        }
    }

    /// Whether `path` belongs to this route. Static routes compare exactly,
    /// with no trailing-slash normalization.
    #[must_use]
    pub fn is(&self, path: &str) -> bool {
        match self {
            Route::Static(route) => route.path == path,
            Route::Pattern(route) => route.compiled.is_match(path),
            Route::Custom(route) => (route.is)(path),
        }
    }

    /// The string a template-based host router can register, if any.
    #[must_use]
    pub fn server_pattern(&self) -> Option<&str> {
        match self {
            Route::Static(route) => Some(&route.path),
            Route::Pattern(route) => Some(route.compiled.template()),
            Route::Custom(_) => None,
        }
    }

    /// [`Route::server_pattern`] rendered in the host router's placeholder syntax.
    #[must_use]
    pub fn server_pattern_in(&self, syntax: PatternSyntax) -> Option<String> {
        match (self, syntax) {
            (Route::Pattern(route), PatternSyntax::Braces) => Some(route.compiled.to_brace_syntax()),
            _ => self.server_pattern().map(str::to_string),
        }
    }

    /// Placeholder names; empty for static and custom routes.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        match self {
            Route::Pattern(route) => route.compiled.param_names(),
            Route::Static(_) | Route::Custom(_) => &[],
        }
    }

    #[must_use]
    pub fn params_schema(&self) -> Option<&DynSchema> {
        match self {
            Route::Pattern(route) => route.params_schema(),
            Route::Static(_) | Route::Custom(_) => None,
        }
    }
}

impl From<PatternRoute> for Route {
    fn from(route: PatternRoute) -> Self {
        Route::Pattern(route)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Static(route) => f.debug_tuple("Static").field(&route.path).finish(),
            Route::Pattern(route) => f
                .debug_struct("Pattern")
                .field("template", &route.compiled.template())
                .field("params_schema", &route.params_schema.is_some())
                .field("custom_builder", &route.builder.is_some())
                .finish(),
            Route::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.server_pattern().unwrap_or("<custom>"))
    }
}

//! # brrtcontract
//!
//! **brrtcontract** is a framework-agnostic contract layer for HTTP endpoints. One declarative
//! [`Contract`] per endpoint drives both sides of the wire: the server dispatcher matches,
//! extracts and validates with it, and the client builds URLs and checks responses with it.
//!
//! ## Architecture
//!
//! - **[`route`]** - Static, pattern (`/projects/:id`) and custom routes with symmetric
//!   `build` / `parse` / `is`
//! - **[`schema`]** - The `Schema` validation capability, backed by JSON Schema, serde types or
//!   plain functions
//! - **[`contract`]** - Method, route and optional query/body/response schemas
//! - **[`router`]** - Immutable route table, first registered match wins
//! - **[`dispatcher`]** - Validate, invoke, validate pipeline around async handlers
//! - **[`server`]** - Transport-independent request/response types for host adapters
//! - **[`client`]** - Contract invoker over pluggable transports
//! - **[`otel`]** - Structured logging setup
//! - **[`runtime_config`]** - Environment-driven dispatcher settings
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtcontract::{Contract, Dispatcher, HandlerError, IncomingRequest, JsonSchema, Route};
//! use serde_json::json;
//!
//! # tokio_test_block(async {
//! let create = Contract::post(Route::exact("/api/projects")).with_body(
//!     JsonSchema::compile(json!({
//!         "type": "object",
//!         "required": ["name"],
//!         "properties": { "name": { "type": "string", "minLength": 1 } }
//!     }))
//!     .unwrap(),
//! );
//!
//! let dispatcher = Dispatcher::builder()
//!     .route(create, |ctx| async move {
//!         let name = ctx.body.as_ref().and_then(|b| b["name"].as_str()).unwrap_or_default().to_string();
//!         Ok::<_, HandlerError>(json!({ "id": 1, "name": name }))
//!     })
//!     .build();
//!
//! let response = dispatcher
//!     .handle(IncomingRequest::new("POST", "/api/projects").with_json(&json!({ "name": "" })))
//!     .await;
//! assert_eq!(response.status, 400);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```
//!
//! ## Logging
//!
//! Every stage logs through `tracing` with structured fields. Install a subscriber with
//! [`otel::init_logging_with_config`] or bring your own.

pub mod client;
pub mod contract;
pub mod dispatcher;
pub mod ids;
pub mod otel;
pub mod route;
pub mod router;
pub mod runtime_config;
pub mod schema;
pub mod server;

pub use client::{CallInput, Client, ClientConfig, ClientError, LocalTransport, Transport};
pub use contract::{Contract, HttpMethod};
pub use dispatcher::{
    DispatchError, Dispatcher, DispatcherBuilder, Endpoint, HandlerError, RequestContext,
};
pub use ids::RequestId;
pub use route::{ParamMap, PatternRoute, Route, RouteBuildError};
pub use router::{RouteId, RouteMatch, RouteTable};
pub use runtime_config::DispatcherConfig;
pub use schema::{DynSchema, FnSchema, JsonSchema, Schema, SchemaError, SchemaIssue, TypedSchema};
pub use server::{DispatchResponse, IncomingRequest};

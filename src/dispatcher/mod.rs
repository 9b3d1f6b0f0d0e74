//! # Dispatcher Module
//!
//! The dispatcher binds contracts to async handlers and runs every request
//! through the same pipeline.
//!
//! ## Request Flow
//!
//! 1. Method is normalized (`HEAD` is served by `GET` contracts)
//! 2. Router matches the path, first registered route wins
//! 3. Query string is parsed and validated against the query schema
//! 4. Body is size-checked, parsed as JSON and validated (non-`GET` only)
//! 5. Handler is invoked with a [`RequestContext`]
//! 6. Handler result is validated against the response schema
//! 7. Result is returned as `200` JSON with an `x-request-id` header
//!
//! ## Error Handling
//!
//! Every failure becomes a response, never a panic out of the dispatcher:
//! - No matching route returns `404 {"error": "Not Found"}`
//! - Query or body validation failures return `400` with `details`
//! - Oversized bodies return `413`
//! - [`HandlerError::status`] lets handlers pick their own status
//! - Handler panics, internal errors and response validation failures
//!   return an opaque `500`; details only reach the logs
//!
//! Path params are never validated: they are exactly what the route's
//! `parse` produced.
//!
//! ```rust
//! use brrtcontract::contract::Contract;
//! use brrtcontract::dispatcher::{Dispatcher, RequestContext, HandlerError};
//! use brrtcontract::route::Route;
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::builder()
//!     .route(
//!         Contract::get(Route::pattern("/projects/:id").unwrap()),
//!         |ctx: RequestContext| async move {
//!             Ok::<_, HandlerError>(json!({ "id": ctx.param("id") }))
//!         },
//!     )
//!     .build();
//! assert_eq!(dispatcher.routes().count(), 1);
//! ```

mod context;
mod core;
mod error;

pub use context::RequestContext;
pub use core::{Dispatcher, DispatcherBuilder, Endpoint, HandlerFuture, RouteInfo};
pub use error::{DispatchError, HandlerError, INTERNAL_ERROR_MESSAGE};

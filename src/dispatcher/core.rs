//! Dispatcher core module - hot path for request dispatch.

use super::error::is_error_status;
use super::{DispatchError, HandlerError, RequestContext};
use crate::contract::{Contract, HttpMethod};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::route::ParamMap;
use crate::router::{RouteId, RouteMatch, RouteTable};
use crate::runtime_config::DispatcherConfig;
use crate::server::{parse_query, DispatchResponse, IncomingRequest};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Boxed future returned by type-erased handlers.
pub type HandlerFuture = BoxFuture<'static, Result<Value, HandlerError>>;

type BoxedHandler = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// A contract bound to the function that serves it.
pub struct Endpoint {
    contract: Contract,
    handler: BoxedHandler,
}

impl Endpoint {
    /// Bind an async handler to a contract.
    ///
    /// The handler's output is serialized to JSON before response
    /// validation; a serialization failure is reported as an internal error.
    pub fn new<F, Fut, R>(contract: Contract, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let handler = Arc::new(handler);
        let boxed: BoxedHandler = Arc::new(move |ctx: RequestContext| {
            let handler = Arc::clone(&handler);
            // The user function runs on first poll so its panics are caught
            // together with the future's.
            async move {
                let result = handler(ctx).await?;
                serde_json::to_value(result).map_err(HandlerError::internal)
            }
            .boxed()
        });
        Endpoint {
            contract,
            handler: boxed,
        }
    }

    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }
}

/// Route listing entry for host adapters with their own routers.
#[derive(Debug, Clone, Copy)]
pub struct RouteInfo<'a> {
    pub id: RouteId,
    pub method: HttpMethod,
    /// `None` for custom routes, which must be matched with `is()`.
    pub server_pattern: Option<&'a str>,
    pub contract: &'a Contract,
}

struct Inner {
    table: RouteTable,
    endpoints: Vec<Endpoint>,
    config: DispatcherConfig,
}

/// Matches requests to contracts and runs the validate, invoke, validate
/// pipeline.
///
/// Immutable after construction and cheap to clone; share one instance
/// across every connection.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

/// Collects endpoints in registration order.
#[derive(Default)]
pub struct DispatcherBuilder {
    endpoints: Vec<Endpoint>,
    config: Option<DispatcherConfig>,
}

impl DispatcherBuilder {
    /// Register a handler for `contract`. Earlier registrations win overlaps.
    #[must_use]
    pub fn route<F, Fut, R>(self, contract: Contract, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.endpoint(Endpoint::new(contract, handler))
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Override the environment-derived configuration.
    #[must_use]
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn build(self) -> Dispatcher {
        let config = self.config.unwrap_or_else(DispatcherConfig::from_env);
        Dispatcher::with_config(self.endpoints, config)
    }
}

/// `HEAD` is served by `GET` contracts; anything outside the contract
/// methods matches nothing.
fn normalize_method(raw: &str) -> Option<HttpMethod> {
    if raw.eq_ignore_ascii_case("HEAD") {
        return Some(HttpMethod::Get);
    }
    raw.parse().ok()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Build from endpoints in registration order with configuration from
    /// the environment.
    #[must_use]
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self::with_config(endpoints, DispatcherConfig::from_env())
    }

    #[must_use]
    pub fn with_config(endpoints: Vec<Endpoint>, config: DispatcherConfig) -> Self {
        let table = RouteTable::new(
            endpoints
                .iter()
                .map(|e| (e.contract.method(), e.contract.route().clone())),
        );
        info!(
            endpoints = endpoints.len(),
            max_body_bytes = config.max_body_bytes,
            coerce_query_numbers = config.coerce_query_numbers,
            "Dispatcher ready"
        );
        Dispatcher {
            inner: Arc::new(Inner {
                table,
                endpoints,
                config,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = RouteInfo<'_>> + '_ {
        self.inner
            .endpoints
            .iter()
            .enumerate()
            .map(|(index, endpoint)| RouteInfo {
                id: RouteId(index),
                method: endpoint.contract.method(),
                server_pattern: endpoint.contract.route().server_pattern(),
                contract: &endpoint.contract,
            })
    }

    #[must_use]
    pub fn contract(&self, id: RouteId) -> Option<&Contract> {
        self.inner.endpoints.get(id.index()).map(Endpoint::contract)
    }

    /// Match a raw method (any case) and path (query allowed, ignored).
    #[must_use]
    pub fn match_request(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let method = normalize_method(method)?;
        let path = path.split(['?', '#']).next().unwrap_or(path);
        self.inner.table.route(method, path)
    }

    /// Handle one request end to end. Never fails: every error becomes a
    /// response.
    pub async fn handle(&self, req: IncomingRequest) -> DispatchResponse {
        let request_id = request_id_for(&req);
        let is_head = req.method.eq_ignore_ascii_case("HEAD");
        let matched = self.match_request(&req.method, req.path());

        let outcome = match matched {
            Some(hit) => {
                let span = info_span!("dispatch", request_id = %request_id, route_id = %hit.id);
                self.execute(hit.id, hit.params, req, request_id)
                    .instrument(span)
                    .await
            }
            None => {
                info!(
                    request_id = %request_id,
                    method = %req.method,
                    path = %req.path(),
                    "No contract matched request"
                );
                Err(DispatchError::NoMatch {
                    method: req.method.clone(),
                    path: req.path().to_string(),
                })
            }
        };
        finish(outcome, request_id, is_head)
    }

    /// Run the extraction and validation pipeline for a route the host
    /// framework has already matched, with the params it extracted.
    pub async fn handle_matched(
        &self,
        id: RouteId,
        params: ParamMap,
        req: IncomingRequest,
    ) -> DispatchResponse {
        let request_id = request_id_for(&req);
        let is_head = req.method.eq_ignore_ascii_case("HEAD");
        let span = info_span!("dispatch", request_id = %request_id, route_id = %id);
        let outcome = self
            .execute(id, params, req, request_id)
            .instrument(span)
            .await;
        finish(outcome, request_id, is_head)
    }

    async fn execute(
        &self,
        id: RouteId,
        params: ParamMap,
        req: IncomingRequest,
        request_id: RequestId,
    ) -> Result<Value, DispatchError> {
        let Some(endpoint) = self.inner.endpoints.get(id.index()) else {
            return Err(DispatchError::NoMatch {
                method: req.method.clone(),
                path: req.path().to_string(),
            });
        };
        let contract = &endpoint.contract;
        let label = contract.label();

        // D1: Query extraction and validation
        let raw_query = parse_query(
            req.query_str().unwrap_or(""),
            self.inner.config.coerce_query_numbers,
        );
        let query = match contract.query_schema() {
            Some(schema) => schema.validate(&raw_query).map_err(|issues| {
                info!(
                    contract = %label,
                    issues = ?issues.issues,
                    "Query validation failed"
                );
                DispatchError::QueryValidation(issues)
            })?,
            None => raw_query,
        };

        // D2: Body extraction and validation
        let body = if contract.method().reads_body() {
            self.read_body(contract, &label, &req.body)?
        } else {
            None
        };

        let path = req.path().to_string();
        let IncomingRequest { headers, raw, .. } = req;
        let ctx = RequestContext {
            request_id,
            route_id: id,
            method: contract.method(),
            path,
            params,
            query,
            body,
            headers,
            raw,
        };

        // D3: Request dispatched to handler
        info!(
            contract = %label,
            path_params = ?ctx.params,
            "Handler execution start"
        );
        let start = Instant::now();
        let outcome = AssertUnwindSafe((endpoint.handler)(ctx)).catch_unwind().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let value = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(HandlerError::Status { status, message }))
                if !is_error_status(status) =>
            {
                error!(
                    contract = %label,
                    status,
                    message = %message,
                    execution_time_ms = elapsed_ms,
                    "Handler returned a non-error status as an error - reporting 500"
                );
                return Err(DispatchError::Handler(HandlerError::Status { status, message }));
            }
            Ok(Err(HandlerError::Status { status, message })) => {
                info!(
                    contract = %label,
                    status,
                    message = %message,
                    execution_time_ms = elapsed_ms,
                    "Handler returned error status"
                );
                return Err(DispatchError::Handler(HandlerError::Status { status, message }));
            }
            Ok(Err(HandlerError::Internal(err))) => {
                error!(
                    contract = %label,
                    error = %err,
                    execution_time_ms = elapsed_ms,
                    "Handler failed"
                );
                return Err(DispatchError::Handler(HandlerError::Internal(err)));
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                error!(
                    contract = %label,
                    panic_message = %message,
                    "Handler panicked - CRITICAL"
                );
                return Err(DispatchError::Panic(message));
            }
        };

        // D4: Handler execution complete
        info!(
            contract = %label,
            execution_time_ms = elapsed_ms,
            "Handler execution complete"
        );

        // D5: Response validation
        match contract.response_schema() {
            Some(schema) => schema.validate(&value).map_err(|source| {
                error!(
                    contract = %label,
                    issues = ?source.issues,
                    "Response validation failed - handler result violates its contract"
                );
                DispatchError::ResponseValidation {
                    route: label.clone(),
                    source,
                }
            }),
            None => Ok(value),
        }
    }

    fn read_body(
        &self,
        contract: &Contract,
        label: &str,
        raw: &Bytes,
    ) -> Result<Option<Value>, DispatchError> {
        let limit = self.inner.config.max_body_bytes;
        if raw.len() > limit {
            warn!(
                contract = %label,
                body_size_bytes = raw.len(),
                limit,
                "Request body exceeds limit"
            );
            return Err(DispatchError::PayloadTooLarge {
                size: raw.len(),
                limit,
            });
        }

        let parsed = if raw.is_empty() {
            None
        } else {
            let value = serde_json::from_slice::<Value>(raw).map_err(|e| {
                info!(contract = %label, error = %e, "Request body is not valid JSON");
                DispatchError::BodyParse(e)
            })?;
            debug!(
                contract = %label,
                body_size_bytes = raw.len(),
                "JSON body parsed"
            );
            Some(value)
        };

        match contract.body_schema() {
            Some(schema) => {
                let validated = schema
                    .validate(parsed.as_ref().unwrap_or(&Value::Null))
                    .map_err(|issues| {
                        info!(
                            contract = %label,
                            issues = ?issues.issues,
                            "Body validation failed"
                        );
                        DispatchError::BodyValidation(issues)
                    })?;
                Ok(Some(validated))
            }
            None => Ok(parsed),
        }
    }
}

fn request_id_for(req: &IncomingRequest) -> RequestId {
    RequestId::from_header_or_new(
        req.headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    )
}

fn finish(
    outcome: Result<Value, DispatchError>,
    request_id: RequestId,
    is_head: bool,
) -> DispatchResponse {
    let mut response = match outcome {
        Ok(value) => DispatchResponse::json(200, value),
        Err(err) => {
            debug!(request_id = %request_id, error = %err, status = err.status(), "Dispatch failed");
            err.to_response()
        }
    };
    response.set_header(REQUEST_ID_HEADER, request_id.to_string());
    if is_head {
        response.without_body()
    } else {
        response
    }
}

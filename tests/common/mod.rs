#![allow(dead_code)]

//! Shared contracts and handlers for integration tests.

use brrtcontract::{
    Contract, Dispatcher, DispatcherConfig, HandlerError, JsonSchema, PatternRoute, Route,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn schema(document: Value) -> JsonSchema {
    JsonSchema::compile(document).unwrap()
}

/// `GET /api/projects/:id` with a uuid params schema that the dispatcher
/// does not enforce.
pub fn get_project() -> Contract {
    let route = PatternRoute::new("/api/projects/:id")
        .unwrap()
        .with_params_schema(brrtcontract::schema::erase(schema(json!({
            "type": "object",
            "properties": { "id": { "type": "string", "format": "uuid" } }
        }))));
    Contract::get(Route::from(route)).named("get_project")
}

pub fn list_projects() -> Contract {
    Contract::get(Route::exact("/api/projects"))
        .with_query(schema(json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer", "minimum": 1, "maximum": 100 },
                "q": { "type": "string" }
            }
        })))
        .named("list_projects")
}

pub fn create_project() -> Contract {
    Contract::post(Route::exact("/api/projects"))
        .with_body(schema(json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string", "minLength": 1, "maxLength": 255 }
            }
        })))
        .with_response(schema(json!({
            "type": "object",
            "required": ["id", "name"],
            "properties": {
                "id": { "type": "integer" },
                "name": { "type": "string" }
            }
        })))
        .named("create_project")
}

/// Counts handler invocations so tests can assert a handler never ran.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// The three project endpoints, each counting into `calls`.
pub fn project_dispatcher(calls: &Calls) -> Dispatcher {
    let (c1, c2, c3) = (calls.clone(), calls.clone(), calls.clone());
    Dispatcher::builder()
        .config(DispatcherConfig::default())
        .route(get_project(), move |ctx| {
            let calls = c1.clone();
            async move {
                calls.hit();
                Ok::<_, HandlerError>(json!({ "id": ctx.param("id") }))
            }
        })
        .route(list_projects(), move |ctx| {
            let calls = c2.clone();
            async move {
                calls.hit();
                Ok::<_, HandlerError>(json!({ "query": ctx.query }))
            }
        })
        .route(create_project(), move |ctx| {
            let calls = c3.clone();
            async move {
                calls.hit();
                let name = ctx.body_as::<Value>()?["name"].clone();
                Ok::<_, HandlerError>(json!({ "id": 1, "name": name }))
            }
        })
        .build()
}

//! # Schema Module
//!
//! Contracts never look inside a schema. Everything the dispatcher and the
//! client need is the [`Schema`] capability: hand it a raw JSON value, get
//! back the validated value or a [`SchemaError`] listing what failed.
//!
//! Two engines are provided:
//!
//! - [`JsonSchema`] compiles a JSON Schema document once with the
//!   `jsonschema` crate and reports every failing instance location.
//! - [`TypedSchema`] validates by deserializing into a Rust type with serde,
//!   which is the natural choice when the handler already owns a typed
//!   request struct.
//!
//! Contracts store schemas type-erased as [`DynSchema`] (output is always a
//! `serde_json::Value`); [`erase`] performs the conversion for any schema
//! whose output is serializable.
//!
//! ```rust
//! use brrtcontract::schema::{JsonSchema, Schema};
//! use serde_json::json;
//!
//! let schema = JsonSchema::compile(json!({
//!     "type": "object",
//!     "properties": { "limit": { "type": "integer", "maximum": 100 } }
//! }))
//! .unwrap();
//!
//! let err = schema.validate(&json!({ "limit": 500 })).unwrap_err();
//! assert_eq!(err.issues[0].path, "/limit");
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// One failing location reported by a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// JSON pointer to the failing value (`""` for the root, `/name` for a field).
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaIssue {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Structured validation failure. Serializes as the bare list of issues.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(transparent)]
#[error("schema validation failed with {} issue(s)", .issues.len())]
pub struct SchemaError {
    pub issues: Vec<SchemaIssue>,
}

impl SchemaError {
    pub fn new(issues: Vec<SchemaIssue>) -> Self {
        SchemaError { issues }
    }

    /// A failure with a single root-level issue.
    pub fn single(message: impl Into<String>) -> Self {
        SchemaError {
            issues: vec![SchemaIssue::new("", message)],
        }
    }

    /// Whether any issue points at `path` (a JSON pointer such as `/name`).
    #[must_use]
    pub fn mentions(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

/// Validation capability: raw value in, validated value or structured error out.
pub trait Schema: Send + Sync {
    type Output;

    fn validate(&self, raw: &Value) -> Result<Self::Output, SchemaError>;
}

/// Type-erased schema as stored on contracts.
pub type DynSchema = Arc<dyn Schema<Output = Value>>;

struct Erased<S>(S);

impl<S> Schema for Erased<S>
where
    S: Schema,
    S::Output: Serialize,
{
    type Output = Value;

    fn validate(&self, raw: &Value) -> Result<Value, SchemaError> {
        let validated = self.0.validate(raw)?;
        serde_json::to_value(validated).map_err(|e| SchemaError::single(e.to_string()))
    }
}

/// Erase a schema's output type so it can be stored on a contract.
pub fn erase<S>(schema: S) -> DynSchema
where
    S: Schema + 'static,
    S::Output: Serialize,
{
    Arc::new(Erased(schema))
}

/// Error compiling a JSON Schema document.
#[derive(Debug, Clone, Error)]
#[error("invalid JSON schema: {message}")]
pub struct SchemaCompileError {
    pub message: String,
}

/// A JSON Schema document compiled once and reused for every request.
pub struct JsonSchema {
    document: Value,
    validator: jsonschema::Validator,
}

impl JsonSchema {
    pub fn compile(document: Value) -> Result<Self, SchemaCompileError> {
        let validator = jsonschema::validator_for(&document).map_err(|e| SchemaCompileError {
            message: e.to_string(),
        })?;
        Ok(JsonSchema {
            document,
            validator,
        })
    }

    /// The source document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl Schema for JsonSchema {
    type Output = Value;

    fn validate(&self, raw: &Value) -> Result<Value, SchemaError> {
        let issues: Vec<SchemaIssue> = self
            .validator
            .iter_errors(raw)
            .map(|error| SchemaIssue::new(error.instance_path.to_string(), error.to_string()))
            .collect();
        if issues.is_empty() {
            Ok(raw.clone())
        } else {
            Err(SchemaError::new(issues))
        }
    }
}

/// Validation by serde deserialization into `T`.
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    #[must_use]
    pub fn new() -> Self {
        TypedSchema {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedSchema<{}>", std::any::type_name::<T>())
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned,
{
    type Output = T;

    fn validate(&self, raw: &Value) -> Result<T, SchemaError> {
        T::deserialize(raw).map_err(|e| SchemaError::single(e.to_string()))
    }
}

/// A schema backed by a closure, for plugging in another validation engine.
pub struct FnSchema<F> {
    check: F,
}

impl<F> FnSchema<F>
where
    F: Fn(&Value) -> Result<Value, SchemaError> + Send + Sync,
{
    pub fn new(check: F) -> Self {
        FnSchema { check }
    }
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(&Value) -> Result<Value, SchemaError> + Send + Sync,
{
    type Output = Value;

    fn validate(&self, raw: &Value) -> Result<Value, SchemaError> {
        (self.check)(raw)
    }
}

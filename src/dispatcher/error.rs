use crate::schema::SchemaError;
use crate::server::DispatchResponse;
use serde_json::json;
use thiserror::Error;

/// Generic message for 500-class responses; internals stay in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Failure raised by application logic.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A failure the handler wants reported with a specific status.
    ///
    /// Only 4xx and 5xx statuses are honored; anything else is reported as
    /// an opaque 500.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// Anything else; reported as an opaque 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    /// Status and message surfaced to the client, see [`HandlerError::Status`].
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        HandlerError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(404, message)
    }

    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HandlerError::Internal(anyhow::Error::new(error))
    }
}

/// Everything that can end a request before a success response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches {method} {path}")]
    NoMatch { method: String, path: String },
    #[error("query validation failed")]
    QueryValidation(#[source] SchemaError),
    #[error("request body is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("request body is not valid JSON: {0}")]
    BodyParse(#[source] serde_json::Error),
    #[error("body validation failed")]
    BodyValidation(#[source] SchemaError),
    #[error("handler result for `{route}` failed response validation")]
    ResponseValidation {
        route: String,
        #[source]
        source: SchemaError,
    },
    #[error("handler failed: {0}")]
    Handler(#[source] HandlerError),
    #[error("handler panicked: {0}")]
    Panic(String),
}

impl DispatchError {
    /// HTTP status this error is reported with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NoMatch { .. } => 404,
            DispatchError::QueryValidation(_)
            | DispatchError::BodyParse(_)
            | DispatchError::BodyValidation(_) => 400,
            DispatchError::PayloadTooLarge { .. } => 413,
            DispatchError::Handler(HandlerError::Status { status, .. })
                if is_error_status(*status) =>
            {
                *status
            }
            DispatchError::ResponseValidation { .. }
            | DispatchError::Handler(_)
            | DispatchError::Panic(_) => 500,
        }
    }

    /// Fixed label used as the `error` field of the response body.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            DispatchError::NoMatch { .. } => "Not Found",
            DispatchError::QueryValidation(_) => "Query validation failed",
            DispatchError::PayloadTooLarge { .. } => "Payload Too Large",
            DispatchError::BodyParse(_) => "Invalid body",
            DispatchError::BodyValidation(_) => "Body validation failed",
            DispatchError::Handler(HandlerError::Status { status, message })
                if is_error_status(*status) =>
            {
                message
            }
            DispatchError::ResponseValidation { .. }
            | DispatchError::Handler(_)
            | DispatchError::Panic(_) => "Internal Server Error",
        }
    }

    /// Whether this is a server-side defect rather than a client mistake.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.status() >= 500
    }

    /// Render the client-facing response.
    ///
    /// Request-side failures carry structured `details`; internal failures
    /// only carry [`INTERNAL_ERROR_MESSAGE`].
    #[must_use]
    pub fn to_response(&self) -> DispatchResponse {
        let status = self.status();
        let label = self.label();
        match self {
            DispatchError::QueryValidation(issues) | DispatchError::BodyValidation(issues) => {
                DispatchResponse::json(status, json!({ "error": label, "details": issues }))
            }
            DispatchError::BodyParse(source) => DispatchResponse::json(
                status,
                json!({ "error": label, "details": source.to_string() }),
            ),
            _ if self.is_internal() => DispatchResponse::json(
                status,
                json!({ "error": label, "message": INTERNAL_ERROR_MESSAGE }),
            ),
            _ => DispatchResponse::error(status, label),
        }
    }
}

/// Handler statuses outside 400..=599 would pose as success or be invalid HTTP.
pub(crate) fn is_error_status(status: u16) -> bool {
    (400..=599).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaIssue;

    #[test]
    fn test_validation_error_shape() {
        let err = DispatchError::QueryValidation(SchemaError::new(vec![SchemaIssue::new(
            "/limit",
            "500 is greater than the maximum of 100",
        )]));
        let resp = err.to_response();
        assert_eq!(resp.status, 400);
        let body = resp.body.unwrap();
        assert_eq!(body["error"], "Query validation failed");
        assert_eq!(body["details"][0]["path"], "/limit");
    }

    #[test]
    fn test_body_parse_differs_from_body_validation() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let parse = DispatchError::BodyParse(parse_err).to_response();
        let validation = DispatchError::BodyValidation(SchemaError::single("nope")).to_response();
        assert_eq!(parse.status, 400);
        assert_eq!(validation.status, 400);
        assert_ne!(
            parse.body.unwrap()["error"],
            validation.body.unwrap()["error"]
        );
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let err = DispatchError::ResponseValidation {
            route: "GET /x".to_string(),
            source: SchemaError::single("secret detail"),
        };
        let body = err.to_response().body.unwrap();
        assert_eq!(err.status(), 500);
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
        assert!(body.get("details").is_none());
        assert!(!body.to_string().contains("secret detail"));
    }

    #[test]
    fn test_handler_status_error() {
        let err = DispatchError::Handler(HandlerError::not_found("Project not found"));
        let resp = err.to_response();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body.unwrap(), serde_json::json!({"error": "Project not found"}));
    }

    #[test]
    fn test_handler_internal_error() {
        let err = DispatchError::Handler(HandlerError::from(anyhow::anyhow!("db down")));
        let body = err.to_response().body.unwrap();
        assert_eq!(body["error"], "Internal Server Error");
        assert!(!body.to_string().contains("db down"));
    }

    #[test]
    fn test_not_found_shape() {
        let err = DispatchError::NoMatch {
            method: "GET".to_string(),
            path: "/nope".to_string(),
        };
        assert_eq!(
            err.to_response().body.unwrap(),
            serde_json::json!({"error": "Not Found"})
        );
    }

    #[test]
    fn test_handler_status_outside_error_range_is_opaque_500() {
        for status in [200, 42, 302, 600] {
            let err = DispatchError::Handler(HandlerError::status(status, "weird"));
            let resp = err.to_response();
            assert_eq!(resp.status, 500, "status {status}");
            let body = resp.body.unwrap();
            assert_eq!(body["error"], "Internal Server Error");
            assert!(!body.to_string().contains("weird"));
        }
    }

    #[test]
    fn test_handler_status_range_bounds() {
        assert_eq!(DispatchError::Handler(HandlerError::status(400, "a")).status(), 400);
        assert_eq!(DispatchError::Handler(HandlerError::status(599, "b")).status(), 599);
        assert_eq!(DispatchError::Handler(HandlerError::status(399, "c")).status(), 500);
    }
}

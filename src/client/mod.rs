//! # Client Module
//!
//! Invokes a [`Contract`](crate::contract::Contract) from the calling side.
//! The request path comes from the same route the server matches with, so
//! client and server cannot disagree about URL shape.
//!
//! Requests go through a [`Transport`]: [`ReqwestTransport`] for real HTTP,
//! [`LocalTransport`] to call a [`Dispatcher`](crate::dispatcher::Dispatcher)
//! in-process, or any async closure.
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), brrtcontract::client::ClientError> {
//! use brrtcontract::client::{CallInput, Client, ClientConfig};
//! use brrtcontract::contract::Contract;
//! use brrtcontract::route::Route;
//! use serde_json::json;
//!
//! let client = Client::new(ClientConfig::new("http://localhost:8080"));
//! let get_project = Contract::get(Route::pattern("/api/projects/:id").unwrap());
//! let project = client
//!     .call(&get_project, CallInput::new().params(json!({ "id": "123" })))
//!     .await?;
//! # let _ = project;
//! # Ok(())
//! # }
//! ```

mod core;
mod transport;

pub use core::{build_query_string, CallInput, Client, ClientConfig, ClientError};
pub use transport::{
    LocalTransport, OutgoingRequest, ReqwestTransport, Transport, TransportError,
    TransportResponse,
};

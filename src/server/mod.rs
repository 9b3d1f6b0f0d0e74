//! Transport-independent request and response types.
//!
//! Host adapters translate their server's native types into an
//! [`IncomingRequest`] and turn the dispatcher's [`DispatchResponse`] back
//! into bytes on the wire. `http::Request` / `http::Response` conversions are
//! provided for hyper- and tower-based hosts.

pub mod request;
pub mod response;

pub use request::{parse_query, IncomingRequest, RawHandle};
pub use response::{DispatchResponse, HeaderVec, MAX_INLINE_HEADERS};

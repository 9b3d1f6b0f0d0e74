//! # Router Module
//!
//! The router owns the immutable route table the dispatcher matches against.
//!
//! ## Matching policy
//!
//! Routes are kept in registration order and **the first registered route
//! that matches wins**. There is no specificity ranking: if `/items/:id` is
//! registered before `/items/new`, a request for `/items/new` goes to
//! `/items/:id`.
//!
//! Matching runs in two passes for a given method:
//!
//! 1. **Static and pattern routes.** Static paths are looked up in a hash
//!    map; pattern routes registered *before* the static hit (if any) are
//!    tested with their anchored regex. The lowest registration index wins.
//! 2. **Custom routes.** Only if pass 1 found nothing, custom routes are
//!    probed with their `is()` closure, again in registration order.
//!
//! ```rust
//! use brrtcontract::contract::HttpMethod;
//! use brrtcontract::route::Route;
//! use brrtcontract::router::RouteTable;
//!
//! let table = RouteTable::new(vec![
//!     (HttpMethod::Get, Route::pattern("/items/:id").unwrap()),
//!     (HttpMethod::Get, Route::exact("/items/new")),
//! ]);
//! let hit = table.route(HttpMethod::Get, "/items/new").unwrap();
//! assert_eq!(hit.id.index(), 0);
//! assert_eq!(hit.params["id"], "new");
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{RouteId, RouteMatch, RouteTable};

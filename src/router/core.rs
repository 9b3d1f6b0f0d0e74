//! Route table core - hot path for request matching.

use crate::contract::HttpMethod;
use crate::route::{ParamMap, Route, RouteKind};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Matches slower than this are logged at `warn`.
const SLOW_MATCH: Duration = Duration::from_millis(1);

/// Position of a route in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) usize);

impl RouteId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of successfully matching a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub id: RouteId,
    /// Params from the route's `parse`, never schema-validated.
    pub params: ParamMap,
}

/// Immutable, registration-ordered route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<(HttpMethod, Route)>,
    /// First registration index for each exact path, per method.
    statics: HashMap<HttpMethod, HashMap<String, usize>>,
    /// Pattern route indices in registration order.
    patterns: Vec<usize>,
    /// Custom route indices in registration order.
    customs: Vec<usize>,
}

impl RouteTable {
    pub fn new(routes: impl IntoIterator<Item = (HttpMethod, Route)>) -> Self {
        let routes: Vec<(HttpMethod, Route)> = routes.into_iter().collect();
        let mut statics: HashMap<HttpMethod, HashMap<String, usize>> = HashMap::new();
        let mut patterns = Vec::new();
        let mut customs = Vec::new();

        for (index, (method, route)) in routes.iter().enumerate() {
            match route {
                Route::Static(fixed) => {
                    let by_path = statics.entry(*method).or_default();
                    if by_path.contains_key(fixed.path()) {
                        warn!(
                            method = %method,
                            path = %fixed.path(),
                            shadowed_index = index,
                            "Duplicate static route - later registration is unreachable"
                        );
                    } else {
                        by_path.insert(fixed.path().to_string(), index);
                    }
                }
                Route::Pattern(_) => patterns.push(index),
                Route::Custom(_) => customs.push(index),
            }
        }

        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|(method, route)| format!("{method} {route}"))
            .collect();
        info!(
            routes_count = routes.len(),
            pattern_routes = patterns.len(),
            custom_routes = customs.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Self {
            routes,
            statics,
            patterns,
            customs,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: RouteId) -> Option<(HttpMethod, &Route)> {
        self.routes.get(id.0).map(|(method, route)| (*method, route))
    }

    /// Routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (RouteId, HttpMethod, &Route)> + '_ {
        self.routes
            .iter()
            .enumerate()
            .map(|(index, (method, route))| (RouteId(index), *method, route))
    }

    /// Match a normalized method and path (no query string).
    #[must_use]
    pub fn route(&self, method: HttpMethod, path: &str) -> Option<RouteMatch> {
        // RT1: Route match attempt
        debug!(method = %method, path = %path, "Route match attempt");
        let match_start = Instant::now();

        let result = self.find(method, path);
        let match_duration = match_start.elapsed();

        match &result {
            Some(hit) => {
                // RT3: Route matched
                let kind = self
                    .routes
                    .get(hit.id.0)
                    .map(|(_, route)| route.kind())
                    .unwrap_or(RouteKind::Static);
                if match_duration > SLOW_MATCH {
                    warn!(
                        method = %method,
                        path = %path,
                        route_id = %hit.id,
                        route_kind = ?kind,
                        duration_us = match_duration.as_micros(),
                        "Slow route matching detected"
                    );
                } else {
                    debug!(
                        method = %method,
                        path = %path,
                        route_id = %hit.id,
                        route_kind = ?kind,
                        path_params = ?hit.params,
                        duration_us = match_duration.as_micros(),
                        "Route matched"
                    );
                }
            }
            None => {
                // RT4: No route found
                debug!(
                    method = %method,
                    path = %path,
                    duration_us = match_duration.as_micros(),
                    "No route matched"
                );
            }
        }
        result
    }

    fn find(&self, method: HttpMethod, path: &str) -> Option<RouteMatch> {
        let indexed = self.find_indexed(method, path);
        // Custom routes registered before the indexed hit still take precedence.
        let limit = indexed.as_ref().map_or(usize::MAX, |hit| hit.id.0);

        for &index in &self.customs {
            if index >= limit {
                break;
            }
            if let Some(hit) = self.probe_custom(index, method, path) {
                return Some(hit);
            }
        }
        indexed
    }

    /// Static hash lookup plus pattern scan, lowest index first.
    fn find_indexed(&self, method: HttpMethod, path: &str) -> Option<RouteMatch> {
        let static_hit = self
            .statics
            .get(&method)
            .and_then(|by_path| by_path.get(path))
            .copied();
        let limit = static_hit.unwrap_or(usize::MAX);

        for &index in &self.patterns {
            if index >= limit {
                break;
            }
            let (route_method, route) = &self.routes[index];
            if *route_method != method {
                continue;
            }
            if let Some(params) = route.parse(path) {
                return Some(RouteMatch {
                    id: RouteId(index),
                    params,
                });
            }
        }

        static_hit.map(|index| RouteMatch {
            id: RouteId(index),
            params: ParamMap::new(),
        })
    }

    fn probe_custom(&self, index: usize, method: HttpMethod, path: &str) -> Option<RouteMatch> {
        let (route_method, route) = &self.routes[index];
        if *route_method != method || !route.is(path) {
            return None;
        }
        match route.parse(path) {
            Some(params) => Some(RouteMatch {
                id: RouteId(index),
                params,
            }),
            None => {
                // RT5: is() and parse() disagree; treated as no match
                warn!(
                    method = %method,
                    path = %path,
                    route_id = %RouteId(index),
                    "Custom route accepted path but parse returned nothing - skipping"
                );
                None
            }
        }
    }
}

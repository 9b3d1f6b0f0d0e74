use super::{RouteId, RouteTable};
use crate::contract::HttpMethod;
use crate::route::{ParamMap, Route};

fn tenant_route() -> Route {
    Route::custom(
        |_| Ok("/t".to_string()),
        |path: &str| {
            path.strip_prefix("/t/").map(|rest| {
                let mut params = ParamMap::new();
                params.insert("rest".to_string(), rest.to_string());
                params
            })
        },
        |path: &str| path.starts_with("/t/"),
    )
}

#[test]
fn test_empty_table() {
    let table = RouteTable::new(Vec::new());
    assert!(table.is_empty());
    assert!(table.route(HttpMethod::Get, "/").is_none());
}

#[test]
fn test_static_route_lookup() {
    let table = RouteTable::new(vec![
        (HttpMethod::Get, Route::exact("/a")),
        (HttpMethod::Get, Route::exact("/b")),
    ]);
    assert_eq!(table.route(HttpMethod::Get, "/b").unwrap().id, RouteId(1));
    assert!(table.route(HttpMethod::Get, "/b/").is_none());
}

#[test]
fn test_method_filters_candidates() {
    let table = RouteTable::new(vec![
        (HttpMethod::Post, Route::pattern("/items/:id").unwrap()),
        (HttpMethod::Get, Route::pattern("/items/:id").unwrap()),
    ]);
    assert_eq!(table.route(HttpMethod::Get, "/items/1").unwrap().id, RouteId(1));
    assert_eq!(table.route(HttpMethod::Post, "/items/1").unwrap().id, RouteId(0));
    assert!(table.route(HttpMethod::Delete, "/items/1").is_none());
}

#[test]
fn test_pattern_registered_first_beats_static() {
    let table = RouteTable::new(vec![
        (HttpMethod::Get, Route::pattern("/items/:id").unwrap()),
        (HttpMethod::Get, Route::exact("/items/new")),
    ]);
    let hit = table.route(HttpMethod::Get, "/items/new").unwrap();
    assert_eq!(hit.id, RouteId(0));
    assert_eq!(hit.params["id"], "new");
}

#[test]
fn test_static_registered_first_beats_pattern() {
    let table = RouteTable::new(vec![
        (HttpMethod::Get, Route::exact("/items/new")),
        (HttpMethod::Get, Route::pattern("/items/:id").unwrap()),
    ]);
    let hit = table.route(HttpMethod::Get, "/items/new").unwrap();
    assert_eq!(hit.id, RouteId(0));
    assert!(hit.params.is_empty());
    assert_eq!(table.route(HttpMethod::Get, "/items/7").unwrap().id, RouteId(1));
}

#[test]
fn test_overlapping_patterns_first_wins() {
    let table = RouteTable::new(vec![
        (HttpMethod::Get, Route::pattern("/:a/:b").unwrap()),
        (HttpMethod::Get, Route::pattern("/users/:id").unwrap()),
    ]);
    let hit = table.route(HttpMethod::Get, "/users/9").unwrap();
    assert_eq!(hit.id, RouteId(0));
    assert_eq!(hit.params["a"], "users");
}

#[test]
fn test_duplicate_static_keeps_first() {
    let table = RouteTable::new(vec![
        (HttpMethod::Get, Route::exact("/dup")),
        (HttpMethod::Get, Route::exact("/dup")),
    ]);
    assert_eq!(table.route(HttpMethod::Get, "/dup").unwrap().id, RouteId(0));
}

#[test]
fn test_custom_registered_first_beats_pattern() {
    let table = RouteTable::new(vec![
        (HttpMethod::Get, tenant_route()),
        (HttpMethod::Get, Route::pattern("/t/:x").unwrap()),
    ]);
    let hit = table.route(HttpMethod::Get, "/t/one").unwrap();
    assert_eq!(hit.id, RouteId(0));
    assert_eq!(hit.params["rest"], "one");
}

#[test]
fn test_custom_registered_first_beats_static() {
    let table = RouteTable::new(vec![
        (HttpMethod::Get, tenant_route()),
        (HttpMethod::Get, Route::exact("/t/home")),
    ]);
    assert_eq!(table.route(HttpMethod::Get, "/t/home").unwrap().id, RouteId(0));
}

#[test]
fn test_custom_registered_later_loses_to_pattern() {
    let table = RouteTable::new(vec![
        (HttpMethod::Get, Route::pattern("/t/:x").unwrap()),
        (HttpMethod::Get, tenant_route()),
    ]);
    assert_eq!(table.route(HttpMethod::Get, "/t/one").unwrap().id, RouteId(0));

    // Only the custom route accepts multi-segment paths.
    let hit = table.route(HttpMethod::Get, "/t/one/two").unwrap();
    assert_eq!(hit.id, RouteId(1));
    assert_eq!(hit.params["rest"], "one/two");
}

#[test]
fn test_custom_route_with_other_method_is_skipped() {
    let table = RouteTable::new(vec![
        (HttpMethod::Post, tenant_route()),
        (HttpMethod::Get, Route::pattern("/t/:x").unwrap()),
    ]);
    assert_eq!(table.route(HttpMethod::Get, "/t/one").unwrap().id, RouteId(1));
}

#[test]
fn test_custom_route_whose_parse_rejects_is_no_match() {
    let greedy = Route::custom(|_| Ok("/t".to_string()), |_| None, |_| true);
    let table = RouteTable::new(vec![
        (HttpMethod::Get, greedy),
        (HttpMethod::Get, tenant_route()),
    ]);
    // falls through to the next custom route instead of empty params
    let hit = table.route(HttpMethod::Get, "/t/one").unwrap();
    assert_eq!(hit.id, RouteId(1));
    assert_eq!(hit.params["rest"], "one");
    assert!(table.route(HttpMethod::Get, "/other").is_none());
}

#[test]
fn test_iter_preserves_registration_order() {
    let table = RouteTable::new(vec![
        (HttpMethod::Get, Route::exact("/a")),
        (HttpMethod::Post, tenant_route()),
        (HttpMethod::Put, Route::pattern("/c/:id").unwrap()),
    ]);
    let order: Vec<(usize, HttpMethod)> = table
        .iter()
        .map(|(id, method, _)| (id.index(), method))
        .collect();
    assert_eq!(
        order,
        vec![(0, HttpMethod::Get), (1, HttpMethod::Post), (2, HttpMethod::Put)]
    );
    assert_eq!(table.len(), 3);
    assert!(table.get(RouteId(3)).is_none());
}

use brrtcontract::contract::HttpMethod;
use brrtcontract::{
    Contract, Dispatcher, DispatcherConfig, HandlerError, IncomingRequest, JsonSchema, Route,
    RouteTable,
};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::hint::black_box;

fn zoo_routes() -> Vec<(HttpMethod, Route)> {
    let pattern = |t: &str| Route::pattern(t).expect("valid template");
    vec![
        (HttpMethod::Get, Route::exact("/")),
        (HttpMethod::Get, Route::exact("/zoo/animals")),
        (HttpMethod::Post, Route::exact("/zoo/animals")),
        (HttpMethod::Get, pattern("/zoo/animals/:id")),
        (HttpMethod::Put, pattern("/zoo/animals/:id")),
        (HttpMethod::Patch, pattern("/zoo/animals/:id")),
        (HttpMethod::Delete, pattern("/zoo/animals/:id")),
        (HttpMethod::Get, pattern("/zoo/animals/:id/toys/:toy_id")),
        (
            HttpMethod::Get,
            pattern("/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id"),
        ),
        (
            HttpMethod::Post,
            pattern("/inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/:batch_id"),
        ),
        (HttpMethod::Get, pattern("/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i")),
        (HttpMethod::Get, Route::exact("/zoo/health")),
    ]
}

fn bench_route_throughput(c: &mut Criterion) {
    let table = RouteTable::new(zoo_routes());
    c.bench_function("route_match", |b| {
        let test_paths = [
            (HttpMethod::Get, "/zoo/animals/123"),
            (HttpMethod::Get, "/zoo/animals/123/toys/456"),
            (HttpMethod::Get, "/zoo/cats/animals/123/habitats/88/sections/5"),
            (HttpMethod::Post, "/inventory/1/feeds/2/items/3/batches/4"),
            (HttpMethod::Get, "/complex/1/2/3/4/5/6/7/8/9"),
            (HttpMethod::Get, "/zoo/health"),
        ];
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                let res = table.route(*method, path);
                black_box(&res);
            }
        })
    });
}

fn bench_route_build(c: &mut Criterion) {
    let route = Route::pattern("/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id")
        .expect("valid template");
    let params = json!({ "category": "big cats", "id": 7, "habitat_id": "north", "section_id": 3 });
    c.bench_function("route_build", |b| {
        b.iter(|| black_box(route.build(black_box(&params))))
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let body_schema = JsonSchema::compile(json!({
        "type": "object",
        "required": ["name"],
        "properties": { "name": { "type": "string", "minLength": 1, "maxLength": 255 } }
    }))
    .expect("valid schema");
    let dispatcher = Dispatcher::builder()
        .config(DispatcherConfig::default())
        .route(
            Contract::post(Route::exact("/zoo/animals")).with_body(body_schema),
            |ctx| async move { Ok::<_, HandlerError>(json!({ "id": 1, "animal": ctx.body })) },
        )
        .build();
    let payload = json!({ "name": "Tiger" });

    c.bench_function("dispatch_validated_post", |b| {
        b.to_async(&rt).iter(|| async {
            let req = IncomingRequest::new("POST", "/zoo/animals").with_json(&payload);
            black_box(dispatcher.handle(req).await)
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_route_build, bench_dispatch);
criterion_main!(benches);

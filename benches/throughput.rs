use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use rivet::context::Handler;
use rivet::params::Params;
use rivet::router::Router;
use std::hint::black_box;

const ROUTES: &[(Method, &str)] = &[
    (Method::GET, "/"),
    (Method::GET, "/zoo/animals"),
    (Method::POST, "/zoo/animals"),
    (Method::GET, "/zoo/animals/:id uint"),
    (Method::PUT, "/zoo/animals/:id uint"),
    (Method::DELETE, "/zoo/animals/:id uint"),
    (Method::GET, "/zoo/animals/:id uint/toys/:toy_id"),
    (
        Method::GET,
        "/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id",
    ),
    (
        Method::POST,
        "/inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/:batch_id",
    ),
    (Method::GET, "/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i"),
    (Method::GET, "/static/*path"),
    (Method::HEAD, "/zoo/health"),
];

fn build_router() -> Router {
    let mut router = Router::new();
    for (method, pattern) in ROUTES {
        router
            .handle(
                method.clone(),
                pattern,
                [Handler::http(|_, rw| {
                    rw.write_str("ok");
                })],
            )
            .expect("route registers");
    }
    router
}

fn bench_route_match(c: &mut Criterion) {
    let router = build_router();
    let test_paths = [
        (Method::GET, "/zoo/animals/123"),
        (Method::GET, "/zoo/animals/123/toys/456"),
        (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
        (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
        (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
        (Method::GET, "/static/css/site.css"),
        (Method::GET, "/does/not/exist"),
    ];

    c.bench_function("route_match", |b| {
        b.iter(|| {
            for (method, path) in &test_paths {
                let mut params = Params::new();
                let node = router.match_route(method, path, &mut params, None);
                black_box((node.id(), &params));
            }
        })
    });
}

fn bench_serve(c: &mut Criterion) {
    let router = build_router();
    c.bench_function("serve", |b| {
        b.iter(|| {
            let req = http::Request::get("/zoo/animals/123/toys/456")
                .body(Vec::new())
                .expect("request builds");
            black_box(router.serve(req));
        })
    });
}

criterion_group!(benches, bench_route_match, bench_serve);
criterion_main!(benches);

use canopy::{ParamBuf, Router, RouterBuilder};
use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use std::hint::black_box;

fn example_router() -> Router<&'static str> {
    let mut builder = RouterBuilder::new();
    builder.get("/", vec!["root_handler"]).unwrap();
    builder.get("/zoo/animals", vec!["get_animals"]).unwrap();
    builder.post("/zoo/animals", vec!["create_animal"]).unwrap();
    builder.get("/zoo/animals/{id:int}", vec!["get_animal"]).unwrap();
    builder.put("/zoo/animals/{id:int}", vec!["update_animal"]).unwrap();
    builder.delete("/zoo/animals/{id:int}", vec!["delete_animal"]).unwrap();
    builder
        .get("/zoo/animals/{id:int}/toys/{toy_id}", vec!["animal_toy"])
        .unwrap();
    builder
        .get(
            "/zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}",
            vec!["habitat_section"],
        )
        .unwrap();
    builder
        .post(
            "/inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}",
            vec!["post_item_batch"],
        )
        .unwrap();
    builder
        .get(
            "/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}",
            vec!["complex_many_params"],
        )
        .unwrap();
    builder.get("/static/*path", vec!["assets"]).unwrap();
    builder.build()
}

fn bench_route_throughput(c: &mut Criterion) {
    let router = example_router();
    let mut buf = ParamBuf::with_slots(router.max_params());
    c.bench_function("route_match", |b| {
        let test_paths = [
            (Method::GET, "/zoo/animals/123"),
            (Method::GET, "/zoo/animals/123/toys/456"),
            (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
            (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
            (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
            (Method::GET, "/static/css/site/main.css"),
        ];
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                let res = router.find("", method, path, &mut buf);
                black_box(res.is_matched());
            }
        })
    });
}

fn bench_route_misses(c: &mut Criterion) {
    let router = example_router();
    let mut buf = ParamBuf::with_slots(router.max_params());
    c.bench_function("route_miss", |b| {
        b.iter(|| {
            black_box(router.find("", &Method::GET, "/zoo/animals/abc/toys", &mut buf).outcome());
            black_box(router.find("", &Method::PATCH, "/zoo/animals", &mut buf).outcome());
        })
    });
}

fn bench_route_scaling(c: &mut Criterion) {
    let mut builder = RouterBuilder::new();
    for i in 0..1000 {
        builder
            .get(&format!("/api/v1/resource{i}/{{id}}/items/{{item:int}}"), vec![i])
            .unwrap();
    }
    let router = builder.build();
    let mut buf = ParamBuf::with_slots(router.max_params());
    c.bench_function("route_match_1000_routes", |b| {
        b.iter(|| {
            let res = router.find("", &Method::GET, "/api/v1/resource777/abc/items/9", &mut buf);
            black_box(res.matched().map(|m| m.handlers()[0]));
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_route_misses, bench_route_scaling);
criterion_main!(benches);

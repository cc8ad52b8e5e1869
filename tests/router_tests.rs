use canopy::{ParamBuf, RouteLookup, Router, RouterBuilder};
use http::Method;

type Handler = fn() -> &'static str;

fn root_handler() -> &'static str {
    "root_handler"
}
fn get_animals() -> &'static str {
    "get_animals"
}
fn create_animal() -> &'static str {
    "create_animal"
}
fn get_animal() -> &'static str {
    "get_animal"
}
fn update_animal() -> &'static str {
    "update_animal"
}
fn patch_animal() -> &'static str {
    "patch_animal"
}
fn delete_animal() -> &'static str {
    "delete_animal"
}
fn health_check() -> &'static str {
    "health_check"
}
fn supported_ops() -> &'static str {
    "supported_ops"
}
fn trace_route() -> &'static str {
    "trace_route"
}
fn animal_toy() -> &'static str {
    "animal_toy"
}

fn verb_zoo() -> Router<Handler> {
    let mut builder: RouterBuilder<Handler> = RouterBuilder::new();
    builder.get("/", vec![root_handler as Handler]).unwrap();
    {
        let mut zoo = builder.group("/zoo").named("zoo");
        zoo.get("/animals", vec![get_animals as Handler]).unwrap().named("animals");
        zoo.post("/animals", vec![create_animal as Handler]).unwrap();
        zoo.get("/animals/{id:int}", vec![get_animal as Handler])
            .unwrap()
            .named("animal");
        zoo.put("/animals/{id:int}", vec![update_animal as Handler]).unwrap();
        zoo.patch("/animals/{id:int}", vec![patch_animal as Handler]).unwrap();
        zoo.delete("/animals/{id:int}", vec![delete_animal as Handler]).unwrap();
        zoo.get("/animals/{id:int}/toys/{toy_id}", vec![animal_toy as Handler])
            .unwrap()
            .named("toy");
        zoo.head("/health", vec![health_check as Handler]).unwrap();
        zoo.options("/health", vec![supported_ops as Handler]).unwrap();
        zoo.trace("/health", vec![trace_route as Handler]).unwrap();
    }
    builder.build()
}

fn assert_route_match(router: &Router<Handler>, method: Method, path: &str, expected_handler: &str) {
    let mut buf = ParamBuf::with_slots(router.max_params());
    match router.find("", &method, path, &mut buf) {
        RouteLookup::Matched(m) => {
            let handler = m.handlers()[0];
            assert_eq!(
                handler(),
                expected_handler,
                "Handler mismatch for {} {}",
                method,
                path
            );
        }
        other => {
            assert_eq!(
                expected_handler, "<none>",
                "Expected route to match for {} {}, got {}",
                method,
                path,
                other.outcome()
            );
        }
    }
}

#[test]
fn test_router_root() {
    let router = verb_zoo();
    assert_route_match(&router, Method::GET, "/", "root_handler");
}

#[test]
fn test_router_collection_verbs() {
    let router = verb_zoo();
    assert_route_match(&router, Method::GET, "/zoo/animals", "get_animals");
    assert_route_match(&router, Method::POST, "/zoo/animals", "create_animal");
}

#[test]
fn test_router_item_verbs() {
    let router = verb_zoo();
    assert_route_match(&router, Method::GET, "/zoo/animals/123", "get_animal");
    assert_route_match(&router, Method::PUT, "/zoo/animals/123", "update_animal");
    assert_route_match(&router, Method::PATCH, "/zoo/animals/123", "patch_animal");
    assert_route_match(&router, Method::DELETE, "/zoo/animals/123", "delete_animal");
}

#[test]
fn test_router_health_verbs() {
    let router = verb_zoo();
    assert_route_match(&router, Method::HEAD, "/zoo/health", "health_check");
    assert_route_match(&router, Method::OPTIONS, "/zoo/health", "supported_ops");
    assert_route_match(&router, Method::TRACE, "/zoo/health", "trace_route");
}

#[test]
fn test_router_unknown_paths() {
    let router = verb_zoo();
    assert_route_match(&router, Method::GET, "/zoo/animals/abc", "<none>");
    assert_route_match(&router, Method::GET, "/zoo/unknown", "<none>");
    assert_route_match(&router, Method::GET, "/zoo/animals/1/toys", "<none>");
}

#[test]
fn test_router_method_not_allowed_lists_methods() {
    let router = verb_zoo();
    let mut buf = ParamBuf::new();
    match router.find("", &Method::POST, "/zoo/health", &mut buf) {
        RouteLookup::MethodNotAllowed { allowed } => {
            assert_eq!(allowed, vec![Method::HEAD, Method::OPTIONS, Method::TRACE]);
        }
        other => panic!("expected method_not_allowed, got {}", other.outcome()),
    }
}

#[test]
fn test_router_extracts_params() {
    let router = verb_zoo();
    let mut buf = ParamBuf::with_slots(router.max_params());
    let m = router
        .find("", &Method::GET, "/zoo/animals/7/toys/ball", &mut buf)
        .matched()
        .unwrap();
    assert_eq!(m.param("id"), Some("7"));
    assert_eq!(m.params.parse::<u32>("id"), Some(7));
    assert_eq!(m.param("toy_id"), Some("ball"));
    assert!(!m.params.has("missing"));
    let pairs: Vec<(&str, &str)> = m.params.iter().collect();
    assert_eq!(pairs, vec![("id", "7"), ("toy_id", "ball")]);
}

#[test]
fn test_router_reverse_urls() {
    let router = verb_zoo();
    assert_eq!(router.url("zoo.animals", Vec::<String>::new()), "/zoo/animals");
    assert_eq!(router.url("zoo.animal", [9]), "/zoo/animals/9");
    assert_eq!(router.url("zoo.toy", ["9", "rope"]), "/zoo/animals/9/toys/rope");
    assert_eq!(router.url("zoo.toy", ["9"]), "/zoo/animals/9/toys/{toy_id}");
}

#[test]
fn test_router_is_shareable_across_threads() {
    let router = std::sync::Arc::new(verb_zoo());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let router = std::sync::Arc::clone(&router);
            std::thread::spawn(move || {
                let mut buf = ParamBuf::with_slots(router.max_params());
                for n in 0..100 {
                    let path = format!("/zoo/animals/{}", i * 100 + n);
                    let m = router
                        .find("", &Method::GET, &path, &mut buf)
                        .matched()
                        .unwrap();
                    assert_eq!(m.params.parse::<usize>("id"), Some(i * 100 + n));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

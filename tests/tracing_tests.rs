use canopy::{ParamBuf, RouterBuilder, RouterConfig};
use http::Method;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

#[derive(Clone, Default)]
struct Captured {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for Captured {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

impl Captured {
    fn has(&self, level: Level, message: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m == message)
    }
}

#[test]
fn test_build_logs_routing_table() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(captured.clone()));

    let mut builder = RouterBuilder::new();
    builder.get("/a", vec!["a"]).unwrap();
    let _router = builder.build();

    assert!(captured.has(Level::DEBUG, "Route registered"));
    assert!(captured.has(Level::INFO, "Routing table loaded"));
}

#[test]
fn test_shadowed_registration_warns() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(captured.clone()));

    let mut builder = RouterBuilder::new();
    builder.get("/a/{x}", vec!["x"]).unwrap();
    builder.get("/a/{y}", vec!["y"]).unwrap();

    let warnings = captured
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, _)| *level == Level::WARN)
        .count();
    assert_eq!(warnings, 1);
}

#[test]
fn test_slow_match_warning() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(captured.clone()));

    let mut builder = RouterBuilder::with_config(RouterConfig {
        slow_match_warn_us: Some(0),
        ..RouterConfig::default()
    });
    builder.get("/{a:path}/{b:path}/z", vec!["nested"]).unwrap();
    let router = builder.build();

    // Nested catch-alls backtrack quadratically on a miss, well past a microsecond.
    let path: String = (0..200).map(|i| format!("/{}", i % 10)).collect();
    let mut buf = ParamBuf::new();
    assert!(!router.find("", &Method::GET, &path, &mut buf).is_matched());
    assert!(captured.has(Level::WARN, "Slow route matching detected"));
    assert!(captured.has(Level::DEBUG, "Route match attempt"));
}

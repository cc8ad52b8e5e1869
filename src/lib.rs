//! # canopy
//!
//! **canopy** is a radix-trie HTTP request router. Route patterns mix literal
//! text with typed, regex-constrained, optional and catch-all parameters; lookups
//! pick the most specific pattern and backtrack when a greedy parameter would
//! prevent a match.
//!
//! ## Architecture
//!
//! - **[`router`]** - pattern grammar, matchers, radix tree, route table and dispatch
//! - **[`manifest`]** - declarative route manifests (YAML, JSON, TOML)
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - the `canopy` introspection binary
//!
//! ## Pattern grammar
//!
//! | Pattern                 | Matches                                  |
//! |-------------------------|------------------------------------------|
//! | `/users/{id}`           | `/users/42`, `/users/bob`                |
//! | `/users/{id:int}`       | `/users/42`                              |
//! | `/price/{p:float}`      | `/price/3.14`                            |
//! | `/zip/{code:[0-9]{5}}`  | `/zip/12345`                             |
//! | `/lang/{code?}`         | `/lang/`, `/lang/en`                     |
//! | `/files/*path`          | `/files/`, `/files/css/site.css`         |
//! | `/v/:id`                | shorthand for `/v/{id}`                  |
//!
//! At each branch static text is tried first, then parameters ordered
//! `int`, `float`, regex and custom rules, default, `string`, and finally
//! catch-alls.
//!
//! ## Quick start
//!
//! ```rust
//! use canopy::{ParamBuf, RouteLookup, RouterBuilder};
//! use http::Method;
//!
//! let mut builder = RouterBuilder::new();
//! {
//!     let mut api = builder.group("/api").named("api");
//!     api.get("/users/{id:int}", vec!["get_user"]).unwrap().named("user");
//!     api.post("/users", vec!["create_user"]).unwrap();
//! }
//! let router = builder.build();
//!
//! let mut buf = ParamBuf::with_slots(router.max_params());
//! match router.find("", &Method::DELETE, "/api/users", &mut buf) {
//!     RouteLookup::MethodNotAllowed { allowed } => assert_eq!(allowed, vec![Method::POST]),
//!     other => panic!("unexpected {}", other.outcome()),
//! }
//! assert_eq!(router.url("api.user", [42]), "/api/users/42");
//! ```

pub mod cli;
pub mod logging;
pub mod manifest;
pub mod router;

pub use manifest::{load_router, Manifest};
pub use router::{
    parse_pattern, Group, Matcher, ParamBuf, ParamRule, ParamSpan, Params, Route, RouteEntry,
    RouteError, RouteId, RouteInfo, RouteLookup, RouteMatch, Router, RouterBuilder, RouterConfig,
    SharedRouter, Token,
};

//! # Router Module
//!
//! Path matching and route resolution for canopy.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Parsing route patterns (`/users/{id:int}`, `/files/*path`, `/:lang?`)
//! - Compacting them into one radix tree per host
//! - Matching request paths with specificity ordering and backtracking
//! - Classifying lookups as matched, method-not-allowed or not-found
//! - Rebuilding concrete URLs from named routes
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Building**: a [`RouterBuilder`] accepts registrations (directly, through
//!    [`Group`]s, or by mounting another builder). Patterns are parsed and inserted
//!    into an arena-backed radix tree, splitting static nodes where they diverge.
//!
//! 2. **Serving**: [`RouterBuilder::build`] freezes everything into a [`Router`].
//!    Lookups are read-only and write parameter ranges into a caller-owned
//!    [`ParamBuf`], so one router serves any number of threads without locking.
//!    [`SharedRouter`] swaps in a rebuilt router without blocking readers.
//!
//! ## Example
//!
//! ```rust
//! use canopy::{ParamBuf, RouteLookup, RouterBuilder};
//! use http::Method;
//!
//! let mut builder = RouterBuilder::new();
//! builder.get("/pets/{id:int}", vec!["get_pet"]).unwrap().named("pet");
//! builder.get("/pets/{name}", vec!["get_pet_by_name"]).unwrap();
//! let router = builder.build();
//!
//! let mut buf = ParamBuf::with_slots(router.max_params());
//! if let RouteLookup::Matched(m) = router.find("", &Method::GET, "/pets/123", &mut buf) {
//!     assert_eq!(m.handlers(), &["get_pet"]);
//!     assert_eq!(m.param("id"), Some("123"));
//! }
//! assert_eq!(router.url("pet", [7]), "/pets/7");
//! ```
//!
//! ## Performance
//!
//! - Static text is dispatched on its first byte through a 256-entry table
//! - The search keeps an explicit frame stack, inline for up to 32 levels
//! - Parameter storage is inline for up to [`MAX_INLINE_PARAMS`] parameters

mod builder;
mod core;
mod error;
mod matcher;
mod params;
mod pattern;
mod radix;
mod route;
mod shared;

pub use builder::{Group, RouteEntry, RouterBuilder, ANY_METHODS};
pub use core::{host_matches, RouteLookup, RouteMatch, Router, RouterConfig};
pub use error::RouteError;
pub use matcher::{Matcher, ParamRule};
pub use params::{ParamBuf, Params, MAX_INLINE_PARAMS};
pub use pattern::{parse_pattern, Token, PATH_RULE};
pub use route::{ParamSpan, Route, RouteId, RouteInfo};
pub use shared::SharedRouter;

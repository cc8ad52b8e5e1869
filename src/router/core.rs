//! Router core module - hot path for request routing.
//!
//! A [`Router`] is the serving half of the two-phase lifecycle: it is produced by
//! [`RouterBuilder::build`](super::RouterBuilder::build), exposes lookups only, and
//! is `Send + Sync` so any number of request threads can share it without locks.
//! All per-request state lives in the caller's [`ParamBuf`].

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

use super::params::{ParamBuf, Params};
use super::radix::RadixTree;
use super::route::{Route, RouteId, RouteInfo};

/// Router behaviour switches, usually loaded from the `settings` block of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Match hosts against registered patterns such as `*.example.com`
    pub host_wildcards: bool,
    /// Emit a warning when a single lookup takes longer than this many microseconds
    pub slow_match_warn_us: Option<u64>,
}

/// Result of successfully matching a request to a route
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    /// The matched route
    pub route: &'a Route<H>,
    /// Path parameters borrowed from the request path
    pub params: Params<'a>,
}

impl<H> Clone for RouteMatch<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for RouteMatch<'_, H> {}

impl<'a, H> RouteMatch<'a, H> {
    #[must_use]
    pub fn id(&self) -> RouteId {
        self.route.id
    }

    #[must_use]
    pub fn handlers(&self) -> &'a [H] {
        self.route.handlers()
    }

    /// Shorthand for `params.get(name)`
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.params.get(name)
    }
}

/// Classified outcome of a lookup.
///
/// `MethodNotAllowed` means some pattern matched the path but none of its routes
/// accept the request method (HTTP 405); `NotFound` means no pattern matched (HTTP 404).
#[derive(Debug)]
pub enum RouteLookup<'a, H> {
    Matched(RouteMatch<'a, H>),
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

impl<'a, H> RouteLookup<'a, H> {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, RouteLookup::Matched(_))
    }

    /// The match, if any
    #[must_use]
    pub fn matched(self) -> Option<RouteMatch<'a, H>> {
        match self {
            RouteLookup::Matched(m) => Some(m),
            _ => None,
        }
    }

    /// Stable label used in logs and CLI output
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            RouteLookup::Matched(_) => "matched",
            RouteLookup::MethodNotAllowed { .. } => "method_not_allowed",
            RouteLookup::NotFound => "not_found",
        }
    }
}

/// Immutable routing table, one radix tree per host.
pub struct Router<H> {
    pub(crate) trees: HashMap<String, RadixTree>,
    /// Registered hosts containing `*`, in registration order
    pub(crate) wildcard_hosts: Vec<String>,
    pub(crate) routes: Vec<Route<H>>,
    pub(crate) names: HashMap<String, RouteId>,
    pub(crate) config: RouterConfig,
}

impl<H> Router<H> {
    /// Match a request to a route.
    ///
    /// `params` is reset and sized for the selected host before the search, so a
    /// pooled buffer can be passed in without clearing it first.
    ///
    /// # Example
    ///
    /// ```rust
    /// use canopy::{ParamBuf, RouteLookup, RouterBuilder};
    /// use http::Method;
    ///
    /// let mut builder = RouterBuilder::new();
    /// builder.get("/users/{id:int}", vec!["show_user"]).unwrap();
    /// let router = builder.build();
    ///
    /// let mut buf = ParamBuf::new();
    /// match router.find("", &Method::GET, "/users/42", &mut buf) {
    ///     RouteLookup::Matched(m) => assert_eq!(m.param("id"), Some("42")),
    ///     other => panic!("unexpected {}", other.outcome()),
    /// }
    /// ```
    pub fn find<'a>(
        &'a self,
        host: &str,
        method: &Method,
        path: &'a str,
        params: &'a mut ParamBuf,
    ) -> RouteLookup<'a, H> {
        debug!(method = %method, host = %host, path = %path, "Route match attempt");
        let match_start = Instant::now();

        let lookup = match self.tree_for(host).and_then(|tree| tree.find(path, params)) {
            None => RouteLookup::NotFound,
            Some(routes) => match routes.iter().find(|(m, _)| m == method) {
                Some(&(_, id)) => {
                    let route = &self.routes[id.index()];
                    let params: &'a ParamBuf = params;
                    RouteLookup::Matched(RouteMatch {
                        route,
                        params: Params::new(&route.params, path, params),
                    })
                }
                None => RouteLookup::MethodNotAllowed {
                    allowed: routes.iter().map(|(m, _)| m.clone()).collect(),
                },
            },
        };

        let duration_us = match_start.elapsed().as_micros();
        let pattern = match &lookup {
            RouteLookup::Matched(m) => m.route.path(),
            _ => "",
        };
        match self.config.slow_match_warn_us {
            Some(limit) if duration_us > u128::from(limit) => warn!(
                method = %method,
                host = %host,
                path = %path,
                pattern = %pattern,
                outcome = lookup.outcome(),
                duration_us,
                "Slow route matching detected"
            ),
            _ => debug!(
                method = %method,
                path = %path,
                pattern = %pattern,
                outcome = lookup.outcome(),
                duration_us,
                "Route match finished"
            ),
        }
        lookup
    }

    /// Tree serving `host`: exact partition, then wildcard hosts when enabled,
    /// then the default partition.
    fn tree_for(&self, host: &str) -> Option<&RadixTree> {
        if !host.is_empty() {
            if let Some(tree) = self.trees.get(host) {
                return Some(tree);
            }
            if self.config.host_wildcards {
                let tree = self
                    .wildcard_hosts
                    .iter()
                    .find(|pattern| host_matches(host, pattern))
                    .and_then(|pattern| self.trees.get(pattern));
                if tree.is_some() {
                    return tree;
                }
            }
        }
        self.trees.get("")
    }

    #[must_use]
    pub fn route(&self, id: RouteId) -> Option<&Route<H>> {
        self.routes.get(id.index())
    }

    /// Look a route up by its (group-qualified) name.
    #[must_use]
    pub fn route_by_name(&self, name: &str) -> Option<&Route<H>> {
        self.names.get(name).and_then(|&id| self.route(id))
    }

    /// Reverse URL for a named route; empty when the name is unknown.
    pub fn url<I>(&self, name: &str, args: I) -> String
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        self.route_by_name(name)
            .map(|route| route.url(args))
            .unwrap_or_default()
    }

    /// All routes sorted by path; registration order breaks ties.
    #[must_use]
    pub fn routes(&self) -> Vec<&Route<H>> {
        let mut routes: Vec<&Route<H>> = self.routes.iter().collect();
        routes.sort_by(|a, b| a.path.cmp(&b.path));
        routes
    }

    /// `(method, host, path, name)` records for every route, sorted like [`Router::routes`]
    #[must_use]
    pub fn route_infos(&self) -> Vec<RouteInfo> {
        self.routes().into_iter().map(Route::info).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered host partitions, sorted; the default partition is `""`.
    #[must_use]
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.trees.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }

    /// Largest parameter count of any route, over all hosts.
    /// Use it to size pooled [`ParamBuf`]s.
    #[must_use]
    pub fn max_params(&self) -> usize {
        self.trees
            .values()
            .map(RadixTree::max_params)
            .max()
            .unwrap_or(0)
    }

    /// Largest parameter count of the tree that would serve `host`.
    #[must_use]
    pub fn max_params_for(&self, host: &str) -> usize {
        self.tree_for(host).map_or(0, RadixTree::max_params)
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// One line per route, in [`Router::routes`] order.
    #[must_use]
    pub fn dump_routes(&self) -> String {
        let mut out = format!("[routes] count={}\n", self.routes.len());
        for route in self.routes() {
            out.push_str(&route.to_string());
            out.push('\n');
        }
        out
    }

    /// Indented rendering of the tree serving `host`, `None` if no tree would.
    #[must_use]
    pub fn dump_tree(&self, host: &str) -> Option<String> {
        self.tree_for(host).map(|tree| {
            tree.dump(|id| {
                self.route(id)
                    .map_or_else(|| id.index().to_string(), |r| r.path.clone())
            })
        })
    }
}

impl<H> fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("hosts", &self.hosts())
            .field("routes", &self.routes.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Whether `host` matches a pattern with a single `*`, e.g. `*.example.com`.
///
/// The star stands for at least one character.
#[must_use]
pub fn host_matches(host: &str, pattern: &str) -> bool {
    let Some((prefix, suffix)) = pattern.split_once('*') else {
        return false;
    };
    host.len() >= pattern.len() && host.starts_with(prefix) && host.ends_with(suffix)
}

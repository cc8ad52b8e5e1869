//! Building phase of the router lifecycle.
//!
//! All registration goes through a [`RouterBuilder`], which owns the trees
//! mutably and is turned into an immutable [`Router`] by [`RouterBuilder::build`].
//! Groups borrow the builder, so nothing can be registered once the router is
//! serving.

use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::core::{Router, RouterConfig};
use super::error::RouteError;
use super::matcher::{ParamRule, RuleMap};
use super::pattern::parse_pattern;
use super::radix::RadixTree;
use super::route::{ParamSpan, Route, RouteId};

// The pattern is a constant literal, so compilation cannot fail.
#[allow(clippy::expect_used)]
static METHOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]+$").expect("method regex should be valid"));

/// Methods registered by `any`.
pub const ANY_METHODS: [Method; 9] = [
    Method::CONNECT,
    Method::DELETE,
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::POST,
    Method::PUT,
    Method::TRACE,
];

type RouteKey = (String, Method, String);

macro_rules! verbs {
    ($($(#[$doc:meta])* $fn_name:ident => $method:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $fn_name(
                &mut self,
                path: &str,
                handlers: Vec<H>,
            ) -> Result<RouteEntry<'_, H>, RouteError> {
                self.add(Method::$method.as_str(), path, handlers)
            }
        )*

        /// Register `path` for every method in [`ANY_METHODS`].
        pub fn any(&mut self, path: &str, handlers: Vec<H>) -> Result<Vec<RouteId>, RouteError> {
            ANY_METHODS
                .iter()
                .map(|method| self.add(method.as_str(), path, handlers.clone()).map(|e| e.id()))
                .collect()
        }
    };
}

/// Mutable route registry; call [`build`](RouterBuilder::build) to start serving.
///
/// `H` is the handler type. The router never calls handlers, it only stores and
/// returns them, so any cloneable value works: function pointers, `Arc<dyn Fn>`,
/// or plain handler names as the manifest loader uses.
pub struct RouterBuilder<H> {
    trees: HashMap<String, RadixTree>,
    wildcard_hosts: Vec<String>,
    routes: Vec<Route<H>>,
    keys: HashMap<RouteKey, RouteId>,
    rules: RuleMap,
    config: RouterConfig,
    middlewares: Vec<H>,
}

impl<H: Clone> Default for RouterBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> RouterBuilder<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            trees: HashMap::new(),
            wildcard_hosts: Vec::new(),
            routes: Vec::new(),
            keys: HashMap::new(),
            rules: RuleMap::new(),
            config,
            middlewares: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RouterConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Register a named parameter rule, used by `{x:name}` in later patterns.
    ///
    /// Registered names take priority over regex compilation of the rule text.
    pub fn rule(&mut self, name: impl Into<String>, rule: Arc<dyn ParamRule>) -> &mut Self {
        self.rules.insert(name.into(), rule);
        self
    }

    /// Append a middleware to every route registered through the builder afterwards.
    pub fn middleware(&mut self, handler: H) -> &mut Self {
        self.middlewares.push(handler);
        self
    }

    /// Number of routes registered so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Register a route in the default host partition, after the builder's middlewares.
    pub fn add(
        &mut self,
        method: &str,
        path: &str,
        handlers: Vec<H>,
    ) -> Result<RouteEntry<'_, H>, RouteError> {
        let handlers = combine(&self.middlewares, handlers, path)?;
        let id = self.insert("", method, path, handlers)?;
        Ok(RouteEntry {
            builder: self,
            id,
            group: None,
        })
    }

    verbs! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        head => HEAD,
        options => OPTIONS,
        trace => TRACE,
        connect => CONNECT,
    }

    /// Register `(host, method, pattern)` with exactly `handlers`.
    ///
    /// Registering an existing key again rebinds its handlers and returns the
    /// same id. An empty pattern is treated as `/`.
    pub fn insert(
        &mut self,
        host: &str,
        method: &str,
        pattern: &str,
        handlers: Vec<H>,
    ) -> Result<RouteId, RouteError> {
        if !METHOD_RE.is_match(method) {
            return Err(RouteError::InvalidMethod {
                method: method.to_string(),
            });
        }
        let pattern = if pattern.is_empty() { "/" } else { pattern };
        if handlers.is_empty() {
            return Err(RouteError::NoHandlers {
                pattern: pattern.to_string(),
            });
        }
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| RouteError::InvalidMethod {
            method: method.to_string(),
        })?;

        let key = (host.to_string(), method.clone(), pattern.to_string());
        if let Some(&id) = self.keys.get(&key) {
            self.routes[id.index()].handlers = handlers;
            debug!(
                method = %method,
                host = %host,
                pattern = %pattern,
                route_id = id.index(),
                "Route rebound"
            );
            return Ok(id);
        }

        let tokens = parse_pattern(pattern)?;
        let id = RouteId(self.routes.len());
        match self.trees.get_mut(host) {
            Some(tree) => tree.insert(pattern, &tokens, &method, id, &self.rules)?,
            None => {
                let mut tree = RadixTree::new();
                tree.insert(pattern, &tokens, &method, id, &self.rules)?;
                self.trees.insert(host.to_string(), tree);
                if host.contains('*') {
                    self.wildcard_hosts.push(host.to_string());
                }
            }
        }

        let params = tokens
            .iter()
            .filter_map(|token| token.param())
            .map(|(name, span)| ParamSpan {
                name: name.to_string(),
                start: span.start,
                end: span.end,
            })
            .collect::<Vec<_>>();
        debug!(
            method = %method,
            host = %host,
            pattern = %pattern,
            route_id = id.index(),
            params = params.len(),
            "Route registered"
        );
        self.routes.push(Route {
            id,
            host: host.to_string(),
            method,
            path: pattern.to_string(),
            name: None,
            handlers,
            params,
        });
        self.keys.insert(key, id);
        Ok(id)
    }

    /// Set or replace the name of a registered route.
    pub fn rename(&mut self, id: RouteId, name: impl Into<String>) -> Result<(), RouteError> {
        let route = self
            .routes
            .get_mut(id.index())
            .ok_or(RouteError::UnknownRoute { index: id.index() })?;
        route.name = Some(name.into());
        Ok(())
    }

    /// Open a group whose routes share `prefix`, host and middlewares.
    pub fn group(&mut self, prefix: &str) -> Group<'_, H> {
        let middlewares = self.middlewares.clone();
        Group {
            builder: self,
            prefix: prefix.to_string(),
            host: String::new(),
            name: None,
            parent_name: None,
            middlewares,
            children: 0,
        }
    }

    /// Register every route of `child` under `prefix`.
    ///
    /// Routes keep their name, host and handlers; the builder's own middlewares
    /// run first. Named rules of the child are carried over unless the builder
    /// already has a rule of the same name.
    pub fn mount(&mut self, prefix: &str, child: RouterBuilder<H>) -> Result<Vec<RouteId>, RouteError> {
        let middlewares = self.middlewares.clone();
        self.mount_routes("", prefix, &middlewares, child)
    }

    fn mount_routes(
        &mut self,
        host: &str,
        prefix: &str,
        middlewares: &[H],
        child: RouterBuilder<H>,
    ) -> Result<Vec<RouteId>, RouteError> {
        for (name, rule) in child.rules {
            self.rules.entry(name).or_insert(rule);
        }
        let mut ids = Vec::with_capacity(child.routes.len());
        for route in child.routes {
            let host = if host.is_empty() { route.host.as_str() } else { host };
            let path = format!("{prefix}{}", route.path);
            let handlers = combine(middlewares, route.handlers, &path)?;
            let id = self.insert(host, route.method.as_str(), &path, handlers)?;
            if let Some(name) = route.name {
                self.rename(id, name)?;
            }
            ids.push(id);
        }
        info!(
            prefix = %prefix,
            host = %host,
            routes_count = ids.len(),
            "Router mounted"
        );
        Ok(ids)
    }

    /// Finish registration.
    ///
    /// Names resolve to the first registered route carrying them.
    #[must_use]
    pub fn build(self) -> Router<H> {
        let mut names = HashMap::new();
        for route in &self.routes {
            if let Some(name) = &route.name {
                names.entry(name.clone()).or_insert(route.id);
            }
        }

        let routes_summary: Vec<String> = self
            .routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}{}", r.method, r.host, r.path))
            .collect();
        let max_params = self
            .trees
            .values()
            .map(RadixTree::max_params)
            .max()
            .unwrap_or(0);
        info!(
            routes_count = self.routes.len(),
            hosts_count = self.trees.len(),
            named_routes = names.len(),
            max_params,
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Router {
            trees: self.trees,
            wildcard_hosts: self.wildcard_hosts,
            routes: self.routes,
            names,
            config: self.config,
        }
    }
}

impl<H> std::fmt::Debug for RouterBuilder<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &self.routes.len())
            .field("hosts", &self.trees.len())
            .field("rules", &self.rules.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Handle to a route just registered, used to name it.
pub struct RouteEntry<'b, H> {
    builder: &'b mut RouterBuilder<H>,
    id: RouteId,
    group: Option<String>,
}

impl<H: Clone> RouteEntry<'_, H> {
    #[must_use]
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Name the route; inside a named group the stored name is `group.name`.
    pub fn named(self, name: &str) -> RouteId {
        let full = match &self.group {
            Some(group) => format!("{group}.{name}"),
            None => name.to_string(),
        };
        if let Some(route) = self.builder.routes.get_mut(self.id.index()) {
            route.name = Some(full);
        }
        self.id
    }
}

/// Routes sharing a path prefix, host, middlewares and name prefix.
///
/// Nested groups concatenate prefixes and inherit host and middlewares. An
/// unnamed group inside a named one is called `parent.<index>`.
pub struct Group<'b, H> {
    builder: &'b mut RouterBuilder<H>,
    prefix: String,
    host: String,
    name: Option<String>,
    parent_name: Option<String>,
    middlewares: Vec<H>,
    children: usize,
}

impl<'b, H: Clone> Group<'b, H> {
    /// Restrict the group to a host partition.
    #[must_use]
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(match &self.parent_name {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        });
        self
    }

    #[must_use]
    pub fn middleware(mut self, handler: H) -> Self {
        self.middlewares.push(handler);
        self
    }

    #[must_use]
    pub fn middlewares(mut self, handlers: impl IntoIterator<Item = H>) -> Self {
        self.middlewares.extend(handlers);
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Open a nested group.
    pub fn group(&mut self, prefix: &str) -> Group<'_, H> {
        let name = self
            .name
            .as_ref()
            .map(|parent| format!("{parent}.{}", self.children));
        self.children += 1;
        Group {
            builder: &mut *self.builder,
            prefix: format!("{}{prefix}", self.prefix),
            host: self.host.clone(),
            name,
            parent_name: self.name.clone(),
            middlewares: self.middlewares.clone(),
            children: 0,
        }
    }

    /// Register `prefix + path` with the group middlewares ahead of `handlers`.
    pub fn add(
        &mut self,
        method: &str,
        path: &str,
        handlers: Vec<H>,
    ) -> Result<RouteEntry<'_, H>, RouteError> {
        let pattern = format!("{}{path}", self.prefix);
        let handlers = combine(&self.middlewares, handlers, &pattern)?;
        let id = self.builder.insert(&self.host, method, &pattern, handlers)?;
        Ok(RouteEntry {
            builder: &mut *self.builder,
            id,
            group: self.name.clone(),
        })
    }

    verbs! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        head => HEAD,
        options => OPTIONS,
        trace => TRACE,
        connect => CONNECT,
    }

    /// Mount `child` under this group's prefix.
    ///
    /// The group's host replaces the child's host when set.
    pub fn mount(&mut self, prefix: &str, child: RouterBuilder<H>) -> Result<Vec<RouteId>, RouteError> {
        let prefix = format!("{}{prefix}", self.prefix);
        self.builder
            .mount_routes(&self.host, &prefix, &self.middlewares, child)
    }
}

/// Middlewares followed by `handlers`; the route's own handlers must not be empty.
fn combine<H: Clone>(middlewares: &[H], handlers: Vec<H>, pattern: &str) -> Result<Vec<H>, RouteError> {
    if handlers.is_empty() {
        return Err(RouteError::NoHandlers {
            pattern: pattern.to_string(),
        });
    }
    if middlewares.is_empty() {
        return Ok(handlers);
    }
    let mut combined = Vec::with_capacity(middlewares.len() + handlers.len());
    combined.extend_from_slice(middlewares);
    combined.extend(handlers);
    Ok(combined)
}

use http::Method;
use serde::Serialize;
use std::fmt;

use super::pattern::unescape;

/// Stable handle to a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) usize);

impl RouteId {
    /// Position of the route in registration order.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a parameter occurs in the original pattern string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpan {
    /// Parameter name (`"*"` for a bare wildcard)
    pub name: String,
    /// Byte offset of the first character of the placeholder
    pub start: usize,
    /// Byte offset just past the placeholder
    pub end: usize,
}

/// One (host, method, pattern) registration.
///
/// Routes are immutable once the router is built. While building, re-registering
/// the same key rebinds `handlers` and `name`.
#[derive(Clone)]
pub struct Route<H> {
    pub(crate) id: RouteId,
    pub(crate) host: String,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) name: Option<String>,
    pub(crate) handlers: Vec<H>,
    pub(crate) params: Vec<ParamSpan>,
}

impl<H> Route<H> {
    #[must_use]
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Host partition this route lives in (empty for the default partition)
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The pattern as registered
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Ordered handler chain, opaque to the router
    #[must_use]
    pub fn handlers(&self) -> &[H] {
        &self.handlers
    }

    /// Parameters in left-to-right occurrence order
    #[must_use]
    pub fn params(&self) -> &[ParamSpan] {
        &self.params
    }

    /// Build a concrete path by substituting `args` into the parameters, in order.
    ///
    /// Parameters without a corresponding argument keep their placeholder text,
    /// so `"/group/{v1}/1/{v2}"` with `["a"]` yields `"/group/a/1/{v2}"`.
    /// Extra arguments are ignored.
    pub fn url<I>(&self, args: I) -> String
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let mut out = String::with_capacity(self.path.len());
        let mut last = 0;
        let mut args = args.into_iter();
        for span in &self.params {
            let Some(arg) = args.next() else { break };
            out.push_str(&unescape(&self.path[last..span.start]));
            out.push_str(&arg.to_string());
            last = span.end;
        }
        out.push_str(&unescape(&self.path[last..]));
        out
    }

    /// Plain description used for enumeration and JSON output
    #[must_use]
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            method: self.method.to_string(),
            host: self.host.clone(),
            path: self.path.clone(),
            name: self.name.clone(),
            handlers: self.handlers.len(),
        }
    }
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id.0)
            .field("host", &self.host)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .field("params", &self.params)
            .finish()
    }
}

impl<H> fmt::Display for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = format!("{}{}", self.host, self.path);
        write!(
            f,
            "{:<6} {:<30} --> {} ({} handlers)",
            self.method.as_str(),
            target,
            self.name.as_deref().unwrap_or("-"),
            self.handlers.len()
        )
    }
}

/// Enumeration record for a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub method: String,
    pub host: String,
    pub path: String,
    pub name: Option<String>,
    pub handlers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::pattern::parse_pattern;

    fn route(path: &str) -> Route<()> {
        let params = parse_pattern(path)
            .unwrap()
            .iter()
            .filter_map(|t| t.param())
            .map(|(name, span)| ParamSpan {
                name: name.to_string(),
                start: span.start,
                end: span.end,
            })
            .collect();
        Route {
            id: RouteId(0),
            host: String::new(),
            method: Method::GET,
            path: path.to_string(),
            name: None,
            handlers: vec![()],
            params,
        }
    }

    #[test]
    fn test_url_partial_substitution() {
        let r = route("/group/{v1}/1/{v2}");
        assert_eq!(r.url(["a"]), "/group/a/1/{v2}");
        assert_eq!(r.url(["a", "b"]), "/group/a/1/b");
        assert_eq!(r.url(Vec::<String>::new()), "/group/{v1}/1/{v2}");
    }

    #[test]
    fn test_url_adjacent_params() {
        let r = route("/path/{var1:int}-{var2:int}");
        assert_eq!(r.url([1, 3]), "/path/1-3");
        assert_eq!(r.url([7]), "/path/7-{var2:int}");
    }

    #[test]
    fn test_url_shorthand_and_wildcard() {
        assert_eq!(route("/4/:var1/1/:var2").url(["x"]), "/4/x/1/:var2");
        assert_eq!(route("/static/*path").url(["css/a.css"]), "/static/css/a.css");
        assert_eq!(route("/a/{x}").url(["1", "2", "3"]), "/a/1");
    }

    #[test]
    fn test_url_unescapes_literals() {
        assert_eq!(route(r"/t\:{id}").url([5]), "/t:5");
    }

    #[test]
    fn test_display() {
        let mut r = route("/users/{id}");
        r.name = Some("user".into());
        let line = r.to_string();
        assert!(line.starts_with("GET "));
        assert!(line.contains("/users/{id}"));
        assert!(line.ends_with("--> user (1 handlers)"));
    }
}

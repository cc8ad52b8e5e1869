//! Radix tree implementation for route matching
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to each other by index, so
//! splitting a static node only rewrites the node in place and appends its old
//! tail as a new child: no parent pointers ever need to be relinked.
//!
//! ## Node kinds
//!
//! - **Static** nodes hold a literal byte run. Siblings never share a first byte,
//!   and each node keeps a 256-entry table for O(1) first-byte dispatch.
//! - **Param** nodes hold a [`Matcher`] for one path segment (or part of one).
//!   At most one exists per (rule, optional) pair under a parent.
//! - **Wildcard** nodes hold the catch-all `path` matcher.
//!
//! ## Search
//!
//! Children are tried static first, then parameters by rule specificity, then
//! wildcards. A parameter that cannot lead to a full match is retried with the
//! next consumption its matcher offers. The search runs on an explicit stack of
//! frames instead of recursion, so adversarial paths cannot exhaust the thread
//! stack, and writes parameter ranges into the caller's [`ParamBuf`].

use http::Method;
use smallvec::SmallVec;
use std::fmt;
use tracing::warn;

use super::matcher::{Matcher, RuleMap};
use super::params::ParamBuf;
use super::pattern::Token;
use super::route::RouteId;
use super::error::RouteError;

pub(crate) type NodeId = usize;

const ROOT: NodeId = 0;
const NO_CHILD: u32 = u32::MAX;

/// Frames kept inline before the search stack spills to the heap.
const MAX_INLINE_FRAMES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Static,
    Param,
    Wildcard,
}

/// First-byte dispatch table for static children.
#[derive(Clone)]
struct StaticIndex(Box<[u32; 256]>);

impl StaticIndex {
    fn new() -> Self {
        Self(Box::new([NO_CHILD; 256]))
    }

    #[inline]
    fn get(&self, byte: u8) -> Option<NodeId> {
        let id = self.0[usize::from(byte)];
        (id != NO_CHILD).then_some(id as NodeId)
    }

    fn set(&mut self, byte: u8, id: NodeId) {
        self.0[usize::from(byte)] = id as u32;
    }

    fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0
            .iter()
            .filter(|&&id| id != NO_CHILD)
            .map(|&id| id as NodeId)
    }
}

impl fmt::Debug for StaticIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.children()).finish()
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    /// Literal bytes for static nodes; `:` or `*` for parameter nodes.
    prefix: Box<[u8]>,
    matcher: Option<Matcher>,
    optional: bool,
    /// At most one route per method terminates here.
    routes: SmallVec<[(Method, RouteId); 2]>,
    statics: Option<StaticIndex>,
    params: Vec<NodeId>,
    wildcards: Vec<NodeId>,
}

impl Node {
    fn new_static(prefix: &[u8]) -> Self {
        Self {
            kind: NodeKind::Static,
            prefix: prefix.into(),
            matcher: None,
            optional: false,
            routes: SmallVec::new(),
            statics: None,
            params: Vec::new(),
            wildcards: Vec::new(),
        }
    }

    fn new_param(matcher: Matcher, optional: bool) -> Self {
        let (kind, label) = if matcher.is_catch_all() {
            (NodeKind::Wildcard, b"*")
        } else {
            (NodeKind::Param, b":")
        };
        Self {
            kind,
            prefix: label.as_slice().into(),
            matcher: Some(matcher),
            optional,
            ..Self::new_static(b"")
        }
    }

    #[inline]
    fn has_children(&self) -> bool {
        self.statics.is_some() || !self.params.is_empty() || !self.wildcards.is_empty()
    }

    #[inline]
    fn static_child(&self, byte: u8) -> Option<NodeId> {
        self.statics.as_ref().and_then(|s| s.get(byte))
    }

    /// Next child to try in precedence order; `cursor` remembers the position.
    /// `first` is the next path byte, `None` once the path is exhausted.
    #[inline]
    fn next_child(&self, first: Option<u8>, cursor: &mut usize) -> Option<NodeId> {
        if *cursor == 0 {
            *cursor = 1;
            if let Some(id) = first.and_then(|b| self.static_child(b)) {
                return Some(id);
            }
        }
        let i = *cursor - 1;
        *cursor += 1;
        self.params
            .get(i)
            .or_else(|| self.wildcards.get(i - self.params.len()))
            .copied()
    }

    fn rank(&self) -> u8 {
        self.matcher.as_ref().map_or(0, Matcher::rank)
    }

    fn label(&self) -> String {
        match (&self.matcher, self.kind) {
            (_, NodeKind::Static) => String::from_utf8_lossy(&self.prefix).into_owned(),
            (Some(m), NodeKind::Param) if m.rule().is_empty() => {
                format!(":{}", if self.optional { "?" } else { "" })
            }
            (Some(m), NodeKind::Param) => {
                format!("{{:{}{}}}", m.rule(), if self.optional { "?" } else { "" })
            }
            _ => "*".to_string(),
        }
    }
}

/// One step of the explicit search stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    /// Offset where this node starts consuming.
    start: usize,
    /// Offset just past the current consumption.
    end: usize,
    /// Attempt number handed to the matcher.
    cursor: usize,
    /// Position in the child precedence order.
    child: usize,
    /// Parameter slots filled up to and including this node.
    slot: usize,
    /// The zero-width offer of an optional parameter has been made.
    empty: bool,
}

/// Radix tree for a single host partition.
#[derive(Debug, Clone)]
pub(crate) struct RadixTree {
    nodes: Vec<Node>,
    max_params: usize,
}

impl Default for RadixTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::new_static(b"")],
            max_params: 0,
        }
    }

    /// Largest number of parameters of any route in this tree.
    pub(crate) fn max_params(&self) -> usize {
        self.max_params
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert the parsed pattern of `route`.
    ///
    /// Matchers are compiled before the tree is touched, so an invalid rule
    /// leaves the tree unchanged.
    pub(crate) fn insert(
        &mut self,
        pattern: &str,
        tokens: &[Token],
        method: &Method,
        route: RouteId,
        rules: &RuleMap,
    ) -> Result<(), RouteError> {
        let matchers = tokens
            .iter()
            .map(|token| match token {
                Token::Static(_) => Ok(None),
                Token::Param { rule, .. } => Matcher::from_rule(rule, rules).map(Some),
                Token::Wildcard { .. } => Ok(Some(Matcher::Path)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut current = ROOT;
        let mut params = 0;
        for (i, (token, matcher)) in tokens.iter().zip(matchers).enumerate() {
            match matcher {
                None => {
                    if let Token::Static(text) = token {
                        current = self.insert_static(current, text.as_bytes());
                    }
                }
                Some(matcher) => {
                    params += 1;
                    let optional = token.is_optional();
                    // Absent trailing optional segment: the parent terminates the route.
                    if optional && i + 1 == tokens.len() {
                        self.attach(current, pattern, method, route);
                    }
                    current = self.insert_param(current, matcher, optional);
                }
            }
        }
        self.attach(current, pattern, method, route);
        self.max_params = self.max_params.max(params);
        Ok(())
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn link_static(&mut self, parent: NodeId, child: NodeId) {
        let first = self.nodes[child].prefix[0];
        self.nodes[parent]
            .statics
            .get_or_insert_with(StaticIndex::new)
            .set(first, child);
    }

    fn insert_static(&mut self, parent: NodeId, text: &[u8]) -> NodeId {
        let mut current = parent;
        let mut rest = text;
        loop {
            let Some(&first) = rest.first() else {
                return current;
            };
            let Some(child) = self.nodes[current].static_child(first) else {
                let leaf = self.push(Node::new_static(rest));
                self.link_static(current, leaf);
                return leaf;
            };
            let common = common_prefix(&self.nodes[child].prefix, rest);
            if common < self.nodes[child].prefix.len() {
                self.split(child, common);
            }
            rest = &rest[common..];
            current = child;
        }
    }

    /// Shrink static node `id` to its first `at` bytes; the remainder, with all
    /// routes and children, moves to a new single child.
    fn split(&mut self, id: NodeId, at: usize) {
        let tail = {
            let node = &mut self.nodes[id];
            let tail = Node {
                kind: NodeKind::Static,
                prefix: node.prefix[at..].into(),
                matcher: None,
                optional: false,
                routes: std::mem::take(&mut node.routes),
                statics: node.statics.take(),
                params: std::mem::take(&mut node.params),
                wildcards: std::mem::take(&mut node.wildcards),
            };
            node.prefix = node.prefix[..at].into();
            tail
        };
        let tail = self.push(tail);
        self.link_static(id, tail);
    }

    fn insert_param(&mut self, parent: NodeId, matcher: Matcher, optional: bool) -> NodeId {
        let catch_all = matcher.is_catch_all();
        let siblings = if catch_all {
            &self.nodes[parent].wildcards
        } else {
            &self.nodes[parent].params
        };
        let existing = siblings.iter().copied().find(|&id| {
            let node = &self.nodes[id];
            node.optional == optional
                && node.matcher.as_ref().map(Matcher::rule) == Some(matcher.rule())
        });
        if let Some(id) = existing {
            return id;
        }

        let child = self.push(Node::new_param(matcher, optional));
        let mut siblings = if catch_all {
            std::mem::take(&mut self.nodes[parent].wildcards)
        } else {
            std::mem::take(&mut self.nodes[parent].params)
        };
        siblings.push(child);
        // Stable: equal ranks keep registration order.
        siblings.sort_by_key(|&id| self.nodes[id].rank());
        if catch_all {
            self.nodes[parent].wildcards = siblings;
        } else {
            self.nodes[parent].params = siblings;
        }
        child
    }

    fn attach(&mut self, id: NodeId, pattern: &str, method: &Method, route: RouteId) {
        let node = &mut self.nodes[id];
        let current = node
            .routes
            .iter()
            .find(|(m, _)| m == method)
            .map(|&(_, existing)| existing);
        match current {
            Some(existing) if existing != route => {
                warn!(
                    method = %method,
                    pattern = %pattern,
                    existing_route = existing.index(),
                    "Route shadowed by an earlier registration, keeping the first"
                );
            }
            Some(_) => {}
            None => node.routes.push((method.clone(), route)),
        }
    }

    /// Find the first node, in precedence order, that consumes all of `path`
    /// and terminates at least one route. Parameter ranges are left in `params`.
    pub(crate) fn find(&self, path: &str, params: &mut ParamBuf) -> Option<&[(Method, RouteId)]> {
        params.reset(self.max_params);
        let bytes = path.as_bytes();
        let mut stack: SmallVec<[Frame; MAX_INLINE_FRAMES]> = SmallVec::new();
        stack.push(Frame {
            node: ROOT,
            start: 0,
            end: 0,
            cursor: 0,
            child: 0,
            slot: 0,
            empty: false,
        });

        while let Some(top) = stack.last_mut() {
            let node = &self.nodes[top.node];
            if top.end == bytes.len() && !node.routes.is_empty() {
                return Some(&node.routes[..]);
            }
            if let Some(child) = node.next_child(bytes.get(top.end).copied(), &mut top.child) {
                let (start, slot) = (top.end, top.slot);
                if let Some(frame) = self.enter(child, path, start, slot, params) {
                    stack.push(frame);
                }
                continue;
            }

            // Children exhausted for this consumption: try the matcher's next offer.
            if node.matcher.is_some() {
                top.cursor += 1;
                if self.consume(top, path, params) {
                    continue;
                }
                params.clear(top.slot - 1);
            }
            stack.pop();
        }
        None
    }

    fn enter(
        &self,
        id: NodeId,
        path: &str,
        start: usize,
        slot: usize,
        params: &mut ParamBuf,
    ) -> Option<Frame> {
        let node = &self.nodes[id];
        let mut frame = Frame {
            node: id,
            start,
            end: start,
            cursor: 0,
            child: 0,
            slot,
            empty: false,
        };
        if node.matcher.is_none() {
            if !path.as_bytes()[start..].starts_with(&node.prefix) {
                return None;
            }
            frame.end = start + node.prefix.len();
            return Some(frame);
        }
        frame.slot = slot + 1;
        self.consume(&mut frame, path, params).then_some(frame)
    }

    /// Ask the frame's matcher for a consumption starting at `frame.cursor`,
    /// skipping offers that would split a UTF-8 character.
    ///
    /// No matcher has more than `rest.len() + 1` distinct lengths to offer, so
    /// the cursor is capped there even if a custom rule never answers `None`.
    /// An optional parameter with children gets a final zero-width offer, which
    /// lets `/a/{v?}/b` match `/a//b`.
    fn consume(&self, frame: &mut Frame, path: &str, params: &mut ParamBuf) -> bool {
        let node = &self.nodes[frame.node];
        let Some(matcher) = node.matcher.as_ref() else {
            return false;
        };
        let rest = &path[frame.start..];
        let has_children = node.has_children();
        while frame.cursor <= rest.len() {
            match matcher.matches(rest, frame.cursor, has_children) {
                Some(len) if len > rest.len() => break,
                Some(len) if rest.is_char_boundary(len) => {
                    frame.empty |= len == 0;
                    Self::take(frame, len, params);
                    return true;
                }
                Some(_) => frame.cursor += 1,
                None => break,
            }
        }
        if node.optional && has_children && !frame.empty && !matcher.is_catch_all() {
            frame.empty = true;
            Self::take(frame, 0, params);
            return true;
        }
        false
    }

    fn take(frame: &mut Frame, len: usize, params: &mut ParamBuf) {
        frame.end = frame.start + len;
        frame.child = 0;
        params.set(frame.slot - 1, frame.start, frame.end);
    }

    /// Render the tree, one node per line, indented by depth.
    pub(crate) fn dump(&self, route_path: impl Fn(RouteId) -> String) -> String {
        let mut out = String::new();
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            let routes: Vec<String> = node
                .routes
                .iter()
                .map(|(method, route)| format!("{method}={}", route_path(*route)))
                .collect();
            out.push_str(&"  ".repeat(depth));
            out.push_str(&if id == ROOT {
                "<root>".to_string()
            } else {
                node.label()
            });
            if routes.is_empty() {
                out.push_str(" nil\n");
            } else {
                out.push_str(&format!(" [{}]\n", routes.join(", ")));
            }
            let children: Vec<NodeId> = node
                .statics
                .iter()
                .flat_map(|s| s.children())
                .chain(node.params.iter().copied())
                .chain(node.wildcards.iter().copied())
                .collect();
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
        out
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

//! Per-request parameter storage.
//!
//! The search writes byte ranges of the request path into a caller-owned
//! [`ParamBuf`], one slot per parameter depth. Slots are overwritten in place
//! while backtracking and reset when a branch is abandoned, so a buffer can be
//! pooled and reused across requests without carrying state.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::str::FromStr;

use super::route::ParamSpan;

/// Maximum number of path parameters before the buffer spills to the heap.
/// Most routes have ≤4 path params (e.g. /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

type Slot = (usize, usize);

/// Reusable slot buffer owned by a single in-flight request.
#[derive(Debug, Clone, Default)]
pub struct ParamBuf {
    slots: SmallVec<[Slot; MAX_INLINE_PARAMS]>,
}

impl ParamBuf {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the buffer, typically with [`Router::max_params`](super::Router::max_params).
    #[must_use]
    pub fn with_slots(n: usize) -> Self {
        let mut buf = Self::default();
        buf.reset(n);
        buf
    }

    /// Number of slots currently available
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Empty every slot and make sure at least `n` exist.
    pub(crate) fn reset(&mut self, n: usize) {
        self.slots.clear();
        self.slots.resize(n, (0, 0));
    }

    #[inline]
    pub(crate) fn set(&mut self, slot: usize, start: usize, end: usize) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, (0, 0));
        }
        self.slots[slot] = (start, end);
    }

    #[inline]
    pub(crate) fn clear(&mut self, slot: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = (0, 0);
        }
    }

    /// Raw value of a slot for `path`; empty when unset.
    #[must_use]
    pub fn value<'p>(&self, path: &'p str, slot: usize) -> &'p str {
        match self.slots.get(slot) {
            Some(&(start, end)) => path.get(start..end).unwrap_or(""),
            None => "",
        }
    }
}

/// Named view over the parameters extracted for a matched route.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    names: &'a [ParamSpan],
    path: &'a str,
    buf: &'a ParamBuf,
}

impl<'a> Params<'a> {
    pub(crate) fn new(names: &'a [ParamSpan], path: &'a str, buf: &'a ParamBuf) -> Self {
        Self { names, path, buf }
    }

    /// Value of a parameter by name.
    ///
    /// Uses "last write wins" semantics when a pattern repeats a name
    /// (e.g. `/org/{id}/user/{id}` returns the user id). Absent optional
    /// parameters yield `Some("")`.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.names
            .iter()
            .enumerate()
            .rfind(|(_, span)| span.name == name)
            .map(|(slot, _)| self.buf.value(self.path, slot))
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.names.iter().any(|span| span.name == name)
    }

    /// Parse a parameter into any `FromStr` type; `None` if absent or malformed.
    #[must_use]
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// `(name, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let (path, buf) = (self.path, self.buf);
        self.names
            .iter()
            .enumerate()
            .map(move |(slot, span)| (span.name.as_str(), buf.value(path, slot)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Convert to an owned map.
    /// Note: this allocates - prefer `get()` in hot paths.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

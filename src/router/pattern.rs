//! Route pattern grammar.
//!
//! A pattern is a `/`-prefixed string mixing literal text with parameters:
//!
//! | Syntax            | Meaning                                              |
//! |-------------------|------------------------------------------------------|
//! | `{name}`          | one path segment, no `/`                             |
//! | `{name:rule}`     | `int`, `float`, `string`, `path`, a registered rule, or a regex |
//! | `{name?}`         | optional segment (`{name?:rule}` with a rule)        |
//! | `:name`, `:name?` | shorthand for `{name}` / `{name?}`                   |
//! | `*name`, `*`      | catch-all, consumes the remainder including `/`      |
//! | `\{` `\:` `\*`    | literal `{`, `:`, `*`                                |
//!
//! Parsing records the byte span of every parameter in the original pattern so
//! reverse URL generation can splice values back into the exact positions.

use std::ops::Range;

use super::error::RouteError;

/// Rule name shared by `{name:path}` and `*name`.
pub const PATH_RULE: &str = "path";

/// One element of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, escapes already removed.
    Static(String),
    /// A `{name:rule}` or `:name` parameter.
    Param {
        name: String,
        rule: String,
        optional: bool,
        span: Range<usize>,
    },
    /// A `*name` catch-all. Bare `*` is named `"*"`.
    Wildcard { name: String, span: Range<usize> },
}

impl Token {
    /// Whether this token may consume `/`.
    pub fn is_catch_all(&self) -> bool {
        match self {
            Token::Wildcard { .. } => true,
            Token::Param { rule, .. } => rule == PATH_RULE,
            Token::Static(_) => false,
        }
    }

    /// Whether the token may be absent entirely.
    pub fn is_optional(&self) -> bool {
        match self {
            Token::Param { optional, .. } => *optional || self.is_catch_all(),
            Token::Wildcard { .. } => true,
            Token::Static(_) => false,
        }
    }

    /// Parameter name and span, `None` for static text.
    pub fn param(&self) -> Option<(&str, Range<usize>)> {
        match self {
            Token::Param { name, span, .. } | Token::Wildcard { name, span } => {
                Some((name.as_str(), span.clone()))
            }
            Token::Static(_) => None,
        }
    }
}

/// Split a route pattern into tokens.
///
/// Fails on a missing leading `/`, an unterminated `{`, or an empty parameter name.
pub fn parse_pattern(pattern: &str) -> Result<Vec<Token>, RouteError> {
    if !pattern.starts_with('/') {
        return Err(RouteError::InvalidPath {
            pattern: pattern.to_string(),
        });
    }

    let bytes = pattern.as_bytes();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if matches!(bytes.get(i + 1), Some(b'{' | b':' | b'*')) => {
                literal.push(char::from(bytes[i + 1]));
                i += 2;
            }
            b'{' => {
                let end = closing_brace(bytes, i).ok_or_else(|| RouteError::UnclosedParam {
                    pattern: pattern.to_string(),
                    offset: i,
                })?;
                let body = &pattern[i + 1..end];
                let (name, rule) = match body.split_once(':') {
                    Some((name, rule)) => (name, rule),
                    None => (body, ""),
                };
                let (name, optional) = strip_optional(name);
                if name.is_empty() {
                    return Err(RouteError::EmptyParamName {
                        pattern: pattern.to_string(),
                        offset: i,
                    });
                }
                flush(&mut literal, &mut tokens);
                tokens.push(Token::Param {
                    name: name.to_string(),
                    rule: canonical_rule(rule).to_string(),
                    optional,
                    span: i..end + 1,
                });
                i = end + 1;
            }
            b':' => {
                let end = segment_end(bytes, i + 1);
                let (name, optional) = strip_optional(&pattern[i + 1..end]);
                if name.is_empty() {
                    return Err(RouteError::EmptyParamName {
                        pattern: pattern.to_string(),
                        offset: i,
                    });
                }
                flush(&mut literal, &mut tokens);
                tokens.push(Token::Param {
                    name: name.to_string(),
                    rule: String::new(),
                    optional,
                    span: i..end,
                });
                i = end;
            }
            b'*' => {
                let end = segment_end(bytes, i + 1);
                let name = if end > i + 1 { &pattern[i + 1..end] } else { "*" };
                flush(&mut literal, &mut tokens);
                tokens.push(Token::Wildcard {
                    name: name.to_string(),
                    span: i..end,
                });
                i = end;
            }
            _ => {
                // Special bytes are ASCII, so this slice always ends on a char boundary.
                let run = bytes[i + 1..]
                    .iter()
                    .position(|b| matches!(b, b'\\' | b'{' | b':' | b'*'))
                    .map_or(bytes.len(), |p| i + 1 + p);
                literal.push_str(&pattern[i..run]);
                i = run;
            }
        }
    }
    flush(&mut literal, &mut tokens);
    Ok(tokens)
}

/// Remove `\` escapes from literal pattern text.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), Some('{' | ':' | '*')) {
            continue;
        }
        out.push(c);
    }
    out
}

fn flush(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Static(std::mem::take(literal)));
    }
}

fn strip_optional(name: &str) -> (&str, bool) {
    match name.strip_suffix('?') {
        Some(stripped) => (stripped, true),
        None => (name, false),
    }
}

fn canonical_rule(rule: &str) -> &str {
    match rule {
        "str" => "string",
        other => other,
    }
}

fn segment_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(bytes.len(), |p| from + p)
}

/// Index of the `}` closing the `{` at `open`, balancing nested braces so
/// regex quantifiers such as `{3}` survive. A `/` ends the search.
fn closing_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (j, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            b'/' => return None,
            _ => {}
        }
    }
    None
}

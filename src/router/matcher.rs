//! Parameter matchers.
//!
//! Every parameter node in the trie owns one [`Matcher`]. The search asks it how
//! many bytes of the remaining path it consumes, passing a `cursor` that counts
//! previous attempts at the same position. A matcher answers `None` once it has
//! no further consumption to offer, which makes the search backtrack.
//!
//! | Rule      | First attempt                 | Later attempts (node has children) |
//! |-----------|-------------------------------|-------------------------------------|
//! | default   | up to the next `/`            | one byte shorter each time, min 1   |
//! | `int`     | leading ASCII digits          | one byte shorter each time, min 1   |
//! | `float`   | digits with at most one `.`   | one byte shorter each time, min 1   |
//! | `string`  | up to the next `/`            | one byte shorter each time, min 1   |
//! | `path`    | whole remainder (leaf) or 0   | one byte longer each time           |
//! | regex     | whole segment, else prefix    | none                                |
//!
//! Optional parameters that are not the last token get one extra zero-width
//! offer from the search once their matcher is exhausted.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::RouteError;
use super::pattern::PATH_RULE;

/// A user-supplied parameter rule, registered by name on the builder.
///
/// Implementations follow the same contract as the built-in matchers: return the
/// number of bytes consumed from `rest` for the given attempt `cursor`, or `None`
/// when no (further) consumption is possible. Returned lengths must not cross a
/// `/` unless the rule is meant to span segments.
pub trait ParamRule: Send + Sync {
    fn matches(&self, rest: &str, cursor: usize, has_children: bool) -> Option<usize>;
}

/// Named custom rules available while building.
pub(crate) type RuleMap = HashMap<String, Arc<dyn ParamRule>>;

/// The closed set of parameter matchers.
#[derive(Clone)]
pub enum Matcher {
    Default,
    Int,
    Float,
    Str,
    Path,
    Regex {
        rule: Box<str>,
        /// `^(?:rule)`: leftmost-first prefix.
        prefix: Regex,
        /// `^(?:rule)$`: tried against the whole segment first.
        whole: Regex,
    },
    Custom { rule: Box<str>, inner: Arc<dyn ParamRule> },
}

impl Matcher {
    /// Build the matcher for a rule string.
    ///
    /// Unknown rule names that were not registered on the builder are compiled
    /// as regular expressions, implicitly anchored at the start.
    pub(crate) fn from_rule(rule: &str, custom: &RuleMap) -> Result<Self, RouteError> {
        let matcher = match rule {
            "" => Matcher::Default,
            "int" => Matcher::Int,
            "float" => Matcher::Float,
            "string" => Matcher::Str,
            PATH_RULE => Matcher::Path,
            other => match custom.get(other) {
                Some(inner) => Matcher::Custom {
                    rule: other.into(),
                    inner: Arc::clone(inner),
                },
                None => {
                    let compile = |anchored: String| {
                        Regex::new(&anchored).map_err(|source| RouteError::InvalidRule {
                            rule: other.to_string(),
                            source,
                        })
                    };
                    Matcher::Regex {
                        rule: other.into(),
                        prefix: compile(format!("^(?:{other})"))?,
                        whole: compile(format!("^(?:{other})$"))?,
                    }
                }
            },
        };
        Ok(matcher)
    }

    /// The rule string this matcher was built from (`""` for the default rule).
    pub fn rule(&self) -> &str {
        match self {
            Matcher::Default => "",
            Matcher::Int => "int",
            Matcher::Float => "float",
            Matcher::Str => "string",
            Matcher::Path => PATH_RULE,
            Matcher::Regex { rule, .. } | Matcher::Custom { rule, .. } => rule,
        }
    }

    /// Precedence among sibling parameter nodes, lower is tried first.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Matcher::Int => 0,
            Matcher::Float => 1,
            Matcher::Regex { .. } | Matcher::Custom { .. } => 2,
            Matcher::Default => 3,
            Matcher::Str => 4,
            Matcher::Path => 5,
        }
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, Matcher::Path)
    }

    /// Number of bytes of `rest` consumed on attempt `cursor`.
    pub fn matches(&self, rest: &str, cursor: usize, has_children: bool) -> Option<usize> {
        match self {
            Matcher::Default | Matcher::Str => shrink(segment_len(rest), cursor, has_children),
            Matcher::Int => {
                let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
                shrink(digits, cursor, has_children)
            }
            Matcher::Float => {
                let len = shrink(float_len(rest), cursor, has_children)?;
                (&rest[..len] != ".").then_some(len)
            }
            Matcher::Path => {
                if has_children {
                    (cursor <= rest.len()).then_some(cursor)
                } else {
                    (cursor == 0).then_some(rest.len())
                }
            }
            Matcher::Regex { prefix, whole, .. } => {
                if cursor > 0 {
                    return None;
                }
                let segment = &rest[..segment_len(rest)];
                if !segment.is_empty() && whole.is_match(segment) {
                    return Some(segment.len());
                }
                prefix.find(segment).map(|m| m.end()).filter(|&end| end > 0)
            }
            Matcher::Custom { inner, .. } => inner.matches(rest, cursor, has_children),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Default => f.write_str("Default"),
            Matcher::Int => f.write_str("Int"),
            Matcher::Float => f.write_str("Float"),
            Matcher::Str => f.write_str("Str"),
            Matcher::Path => f.write_str("Path"),
            Matcher::Regex { rule, .. } => f.debug_tuple("Regex").field(rule).finish(),
            Matcher::Custom { rule, .. } => f.debug_tuple("Custom").field(rule).finish(),
        }
    }
}

/// Greedy-then-shorter consumption shared by the segment matchers.
fn shrink(max: usize, cursor: usize, has_children: bool) -> Option<usize> {
    if max == 0 {
        return None;
    }
    if !has_children {
        return (cursor == 0).then_some(max);
    }
    max.checked_sub(cursor).filter(|&len| len >= 1)
}

fn segment_len(rest: &str) -> usize {
    rest.bytes().position(|b| b == b'/').unwrap_or(rest.len())
}

fn float_len(rest: &str) -> usize {
    let mut dot = false;
    rest.bytes()
        .take_while(|&b| {
            if b == b'.' {
                !std::mem::replace(&mut dot, true)
            } else {
                b.is_ascii_digit()
            }
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(rule: &str) -> Matcher {
        Matcher::from_rule(rule, &RuleMap::new()).unwrap()
    }

    fn attempts(m: &Matcher, rest: &str, has_children: bool) -> Vec<usize> {
        (0..)
            .map_while(|cursor| m.matches(rest, cursor, has_children))
            .collect()
    }

    #[test]
    fn test_rule_dispatch() {
        assert!(matches!(matcher(""), Matcher::Default));
        assert!(matches!(matcher("int"), Matcher::Int));
        assert!(matches!(matcher("float"), Matcher::Float));
        assert!(matches!(matcher("string"), Matcher::Str));
        assert!(matches!(matcher("path"), Matcher::Path));
        assert!(matches!(matcher("[a-z]+"), Matcher::Regex { .. }));
        assert_eq!(matcher("[a-z]+").rule(), "[a-z]+");
    }

    #[test]
    fn test_invalid_regex() {
        let err = Matcher::from_rule("([", &RuleMap::new()).unwrap_err();
        assert!(matches!(err, RouteError::InvalidRule { .. }));
    }

    #[test]
    fn test_default_leaf_and_backtrack() {
        let m = matcher("");
        assert_eq!(attempts(&m, "abc/d", false), vec![3]);
        assert_eq!(attempts(&m, "abc/d", true), vec![3, 2, 1]);
        assert!(m.matches("/x", 0, true).is_none());
        assert!(m.matches("", 0, false).is_none());
    }

    #[test]
    fn test_int() {
        let m = matcher("int");
        assert!(m.matches("abc", 0, false).is_none());
        assert_eq!(m.matches("12345", 0, false), Some(5));
        assert_eq!(attempts(&m, "1-3", true), vec![1]);
        assert_eq!(attempts(&m, "12x", true), vec![2, 1]);
    }

    #[test]
    fn test_float_single_dot() {
        let m = matcher("float");
        assert_eq!(m.matches("3.14", 0, false), Some(4));
        assert_eq!(m.matches("1.2.3", 0, false), Some(3));
        assert!(m.matches(".", 0, false).is_none());
        assert!(m.matches("x1", 0, false).is_none());
    }

    #[test]
    fn test_path_grows() {
        let m = matcher("path");
        assert_eq!(m.matches("a/b", 0, false), Some(3));
        assert!(m.matches("a/b", 1, false).is_none());
        assert_eq!(attempts(&m, "a/b", true), vec![0, 1, 2, 3]);
        assert_eq!(m.matches("", 0, false), Some(0));
    }

    #[test]
    fn test_regex_anchored_no_backtrack() {
        let m = matcher("[0-9]+");
        assert_eq!(m.matches("100/regex", 0, true), Some(3));
        assert_eq!(m.matches("100s", 0, true), Some(3));
        assert!(m.matches("100", 1, true).is_none());
        assert!(m.matches("s100", 0, true).is_none());
    }

    #[test]
    fn test_regex_prefers_whole_segment() {
        let m = matcher("a|ab");
        assert_eq!(m.matches("ab", 0, false), Some(2));
        assert_eq!(m.matches("ab/x", 0, true), Some(2));
        assert_eq!(m.matches("abc", 0, true), Some(1));

        let lazy = matcher("[a-z]+?");
        assert_eq!(lazy.matches("abc", 0, false), Some(3));
        assert_eq!(lazy.matches("abc1", 0, false), Some(1));
    }

    #[test]
    fn test_rank_order() {
        let ranks: Vec<u8> = ["int", "float", "[a-z]", "", "string", "path"]
            .iter()
            .map(|r| matcher(r).rank())
            .collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        assert_eq!(ranks, sorted);
    }

    struct Hex;

    impl ParamRule for Hex {
        fn matches(&self, rest: &str, cursor: usize, _has_children: bool) -> Option<usize> {
            let len = rest.bytes().take_while(u8::is_ascii_hexdigit).count();
            (cursor == 0 && len > 0).then_some(len)
        }
    }

    #[test]
    fn test_custom_rule() {
        let mut rules = RuleMap::new();
        rules.insert("hex".to_string(), Arc::new(Hex) as Arc<dyn ParamRule>);
        let m = Matcher::from_rule("hex", &rules).unwrap();
        assert_eq!(m.rule(), "hex");
        assert_eq!(m.matches("ff0z", 0, false), Some(3));
        assert!(m.matches("zz", 0, false).is_none());
    }
}

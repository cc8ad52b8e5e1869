use std::fmt;

/// Route registration error
///
/// Returned by [`RouterBuilder`](super::RouterBuilder) when a route cannot be
/// registered. These are programmer mistakes: an application should refuse to
/// start rather than continue with a partial routing table.
#[derive(Debug, Clone)]
pub enum RouteError {
    /// HTTP method is not a run of uppercase ASCII letters
    InvalidMethod {
        /// The rejected method string
        method: String,
    },
    /// A route was registered without any handler
    NoHandlers {
        /// Pattern of the rejected route
        pattern: String,
    },
    /// Pattern does not start with `/`
    InvalidPath {
        /// The rejected pattern
        pattern: String,
    },
    /// A `{` parameter has no matching `}` before the next `/`
    UnclosedParam {
        /// The rejected pattern
        pattern: String,
        /// Byte offset of the opening `{`
        offset: usize,
    },
    /// A parameter has an empty name
    EmptyParamName {
        /// The rejected pattern
        pattern: String,
        /// Byte offset of the parameter
        offset: usize,
    },
    /// A parameter rule is neither built-in, registered, nor a valid regex
    InvalidRule {
        /// The rule text
        rule: String,
        /// Compile error reported by the regex engine
        source: regex::Error,
    },
    /// A route id does not belong to this builder
    UnknownRoute {
        /// The offending index
        index: usize,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidMethod { method } => {
                write!(f, "http method '{method}' is not valid (expected uppercase letters only)")
            }
            RouteError::NoHandlers { pattern } => {
                write!(f, "no handler found for route '{pattern}'")
            }
            RouteError::InvalidPath { pattern } => {
                write!(f, "route path '{pattern}' must start with '/'")
            }
            RouteError::UnclosedParam { pattern, offset } => {
                write!(
                    f,
                    "route '{pattern}': param closing delimiter '}}' is missing (opened at byte {offset})"
                )
            }
            RouteError::EmptyParamName { pattern, offset } => {
                write!(f, "route '{pattern}': param name is missing at byte {offset}")
            }
            RouteError::InvalidRule { rule, source } => {
                write!(f, "param rule '{rule}' is not a valid regular expression: {source}")
            }
            RouteError::UnknownRoute { index } => {
                write!(f, "route id {index} is not registered")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::InvalidRule { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_mentions_pattern() {
        let err = RouteError::UnclosedParam {
            pattern: "/a/{id".to_string(),
            offset: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("/a/{id"));
        assert!(msg.contains("'}'"));
    }

    #[test]
    fn test_invalid_rule_has_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = RouteError::InvalidRule {
            rule: "(".to_string(),
            source,
        };
        assert!(err.source().is_some());
        assert!(RouteError::NoHandlers { pattern: "/".into() }.source().is_none());
    }
}

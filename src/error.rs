//! Configuration-time errors.
//!
//! Everything in this module is raised while routes are being registered.
//! Request-time failures (a filter rejecting a segment, an unmatched path, a
//! handler whose arguments cannot be resolved) are not errors: they surface as
//! backtracking, the not-found node, or a `false` from [`Context::invoke`].
//!
//! [`Context::invoke`]: crate::context::Context::invoke

use thiserror::Error;

/// A filter builder rejected its arguments.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The arguments do not fit the filter class.
    #[error("filter `{class}`: {reason}")]
    InvalidArguments {
        /// Filter class name as written in the pattern
        class: String,
        /// Human readable explanation
        reason: String,
    },
    /// The regex source of a `regex` / `|` filter does not compile.
    #[error("filter `regex`: invalid expression `{source_text}`")]
    InvalidRegex {
        /// Regex source as written in the pattern
        source_text: String,
        #[source]
        source: regex::Error,
    },
}

impl FilterError {
    pub(crate) fn arguments(class: &str, reason: impl Into<String>) -> Self {
        FilterError::InvalidArguments {
            class: class.to_string(),
            reason: reason.into(),
        }
    }
}

/// A route pattern could not be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern must start with `/`")]
    MissingLeadingSlash,
    #[error("unknown filter class `{class}`")]
    UnknownFilter { class: String },
    #[error("malformed filter in segment `{segment}`: {reason}")]
    MalformedFilter { segment: String, reason: String },
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("duplicate parameter name `{name}`")]
    DuplicateParam { name: String },
    #[error("invalid parameter name `{name}`")]
    InvalidParamName { name: String },
    #[error("catch-all `{segment}` must be the final segment")]
    CatchAllNotLast { segment: String },
}

/// Route registration failed.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: PatternError,
    },
    /// A second parametric or catch-all child would be created at a position
    /// that already has one with a different name or filter.
    #[error("route `{pattern}` conflicts with existing {existing} at the same position")]
    Conflict { pattern: String, existing: String },
}

/// A route table file could not be loaded or turned into a router.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read route table `{path}`")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse route table: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("route `{route}`: invalid method `{method}`")]
    Method { route: String, method: String },
    #[error("route `{route}` could not be registered")]
    Route {
        route: String,
        #[source]
        source: RouteError,
    },
}

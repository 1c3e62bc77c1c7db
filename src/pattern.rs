//! Route pattern compiler.
//!
//! Turns a pattern string into the ordered [`Segment`] list that the trie
//! stores. The grammar, one `/`-separated segment at a time:
//!
//! | Segment               | Meaning                                                   |
//! |-----------------------|-----------------------------------------------------------|
//! | `literal`             | matched byte for byte                                     |
//! | `:name`               | one path segment captured as `name`                       |
//! | `:`                   | one path segment, matched and discarded                   |
//! | `:name class arg...`  | captured and converted by a registered filter             |
//! | `:name \| regex`      | shorthand for the `regex` filter                          |
//! | `prefix:name filter`  | literal `prefix`, then the rest of the segment as `name`  |
//! | `*name` / `*`         | one or more remaining characters, across `/`              |
//! | `...**` (final)       | the possibly empty remainder, captured as `*`             |
//! | trailing `/?`         | the final slash is optional                               |
//!
//! A `/` inside a filter spec's `[...]` class, or escaped as `\/`, stays part
//! of the spec, so `/:name | [^/]+` is one segment.
//!
//! Adjacent literal text (including the separating `/`) is merged into a single
//! [`Segment::Static`].

use std::sync::Arc;

use crate::error::PatternError;
use crate::filter::{BoundFilter, FilterRegistry, REGEX_CLASS};

/// Parameter name used by `**` and by a bare `*`.
pub const CATCH_ALL_NAME: &str = "*";

/// One compiled unit of a route pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Static(String),
    /// An empty `name` matches without capturing.
    Param {
        name: Arc<str>,
        filter: Option<BoundFilter>,
    },
    /// Consumes the rest of the path. `allow_empty` is set for `**`.
    CatchAll { name: Arc<str>, allow_empty: bool },
    OptionalSlash,
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
    keys: Vec<Arc<str>>,
}

impl Pattern {
    /// Compile `source`, resolving filter classes against `filters`.
    ///
    /// # Errors
    ///
    /// Any [`PatternError`]; these are configuration mistakes and are reported
    /// at registration time.
    pub fn compile(source: &str, filters: &FilterRegistry) -> Result<Self, PatternError> {
        let body = source
            .strip_prefix('/')
            .ok_or(PatternError::MissingLeadingSlash)?;

        let (body, optional_slash) = match body.strip_suffix("/?") {
            Some(rest) => (rest, true),
            // "/?" on its own leaves an empty body
            None if body == "?" => ("", true),
            None => (body, false),
        };

        let mut compiler = Compiler {
            filters,
            segments: Vec::new(),
            keys: Vec::new(),
            literal: String::new(),
        };

        if !(optional_slash && body.is_empty()) {
            let parts = split_segments(body);
            let last = parts.len() - 1;
            for (i, part) in parts.iter().enumerate() {
                compiler.literal.push('/');
                compiler.segment(part, i == last)?;
            }
        }
        compiler.flush();
        if optional_slash {
            compiler.segments.push(Segment::OptionalSlash);
        }

        Ok(Self {
            source: source.to_string(),
            segments: compiler.segments,
            keys: compiler.keys,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Declared parameter names in path order; discarded (`:`) captures are
    /// not listed.
    #[must_use]
    pub fn keys(&self) -> &[Arc<str>] {
        &self.keys
    }
}

struct Compiler<'f> {
    filters: &'f FilterRegistry,
    segments: Vec<Segment>,
    keys: Vec<Arc<str>>,
    literal: String,
}

impl Compiler<'_> {
    fn flush(&mut self) {
        if !self.literal.is_empty() {
            self.segments
                .push(Segment::Static(std::mem::take(&mut self.literal)));
        }
    }

    fn segment(&mut self, part: &str, is_last: bool) -> Result<(), PatternError> {
        // A filter spec may itself contain `*` (e.g. a regex), so parameters
        // are recognised first.
        if let Some((prefix, spec)) = part.split_once(':') {
            if !prefix.contains('*') {
                self.literal.push_str(prefix);
                return self.param(part, spec);
            }
        }

        if let Some(prefix) = part.strip_suffix("**") {
            if !is_last {
                return Err(PatternError::CatchAllNotLast {
                    segment: part.to_string(),
                });
            }
            self.literal.push_str(prefix);
            return self.catch_all(CATCH_ALL_NAME, true);
        }

        if let Some(name) = part.strip_prefix('*') {
            if !is_last {
                return Err(PatternError::CatchAllNotLast {
                    segment: part.to_string(),
                });
            }
            let name = if name.is_empty() { CATCH_ALL_NAME } else { name };
            return self.catch_all(name, false);
        }

        self.literal.push_str(part);
        Ok(())
    }

    fn catch_all(&mut self, name: &str, allow_empty: bool) -> Result<(), PatternError> {
        if name != CATCH_ALL_NAME {
            check_name(name)?;
        }
        let name = self.declare(name)?;
        self.flush();
        self.segments.push(Segment::CatchAll { name, allow_empty });
        Ok(())
    }

    /// `spec` is everything after the `:` up to the next `/`.
    fn param(&mut self, part: &str, spec: &str) -> Result<(), PatternError> {
        let (name, rest) = match spec.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (spec, ""),
        };
        check_name(name)?;

        let filter = if rest.is_empty() {
            None
        } else if let Some(source) = rest.strip_prefix('|') {
            let source = source.trim();
            if source.is_empty() {
                return Err(PatternError::MalformedFilter {
                    segment: part.to_string(),
                    reason: "`|` must be followed by a regular expression".to_string(),
                });
            }
            Some(self.filters.build(REGEX_CLASS, &[source])?)
        } else {
            let mut words = rest.split_whitespace();
            let class = words.next().unwrap_or_default();
            let args: Vec<&str> = words.collect();
            if class.contains('|') {
                return Err(PatternError::MalformedFilter {
                    segment: part.to_string(),
                    reason: format!("unexpected `|` in filter class `{class}`"),
                });
            }
            Some(self.filters.build(class, &args)?)
        };

        let name = if name.is_empty() {
            Arc::from("")
        } else {
            self.declare(name)?
        };
        self.flush();
        self.segments.push(Segment::Param { name, filter });
        Ok(())
    }

    fn declare(&mut self, name: &str) -> Result<Arc<str>, PatternError> {
        if self.keys.iter().any(|k| k.as_ref() == name) {
            return Err(PatternError::DuplicateParam {
                name: name.to_string(),
            });
        }
        let name: Arc<str> = Arc::from(name);
        self.keys.push(Arc::clone(&name));
        Ok(name)
    }
}

/// Split `body` on `/`, except inside a parameter's filter spec where a `/`
/// in a `[...]` class or after `\\` belongs to the spec.
fn split_segments(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    // `:` seen in this segment, then whitespace after it
    let (mut param, mut spec) = (false, false);
    let mut class_depth = 0usize;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        if spec {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    continue;
                }
                '[' => class_depth += 1,
                ']' => class_depth = class_depth.saturating_sub(1),
                _ => {}
            }
        } else if c == ':' {
            param = true;
        } else if param && c.is_whitespace() {
            spec = true;
        }

        if c == '/' && class_depth == 0 {
            parts.push(&body[start..i]);
            start = i + 1;
            param = false;
            spec = false;
        }
    }
    parts.push(&body[start..]);
    parts
}

fn check_name(name: &str) -> Result<(), PatternError> {
    if name.contains([':', '*', '|']) {
        return Err(PatternError::InvalidParamName {
            name: name.to_string(),
        });
    }
    Ok(())
}

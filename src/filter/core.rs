use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{FilterError, PatternError};
use crate::Request;

use super::builtin;

/// Validates and converts the raw text of one path segment.
///
/// Returning `None` is a failed-match signal, not an error: the matcher
/// abandons the branch and tries the next candidate.
pub trait Filter: Send + Sync {
    /// Check `text` and return its converted value.
    ///
    /// `req` is the request being routed when matching runs from
    /// [`Router::serve`](crate::router::Router::serve); it is `None` for bare
    /// lookups.
    fn filter(&self, text: &str, req: Option<&Request>) -> Option<Value>;
}

/// Adapts a plain function to [`Filter`].
pub struct FilterFn<F>(pub F);

impl<F> Filter for FilterFn<F>
where
    F: Fn(&str) -> Option<Value> + Send + Sync,
{
    fn filter(&self, text: &str, _req: Option<&Request>) -> Option<Value> {
        (self.0)(text)
    }
}

/// Builds a filter instance for a class name and its pattern arguments.
pub type FilterBuilder =
    Arc<dyn Fn(&str, &[&str]) -> Result<Arc<dyn Filter>, FilterError> + Send + Sync>;

/// A filter instance bound to a parametric segment.
///
/// `spec` is the normalized `class arg...` text; two parametric segments at the
/// same trie position are the same segment only if their specs are equal.
#[derive(Clone)]
pub struct BoundFilter {
    spec: Arc<str>,
    filter: Arc<dyn Filter>,
}

impl BoundFilter {
    #[must_use]
    pub fn spec(&self) -> &str {
        &self.spec
    }

    #[inline]
    #[must_use]
    pub fn apply(&self, text: &str, req: Option<&Request>) -> Option<Value> {
        self.filter.filter(text, req)
    }
}

impl PartialEq for BoundFilter {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

impl fmt::Debug for BoundFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundFilter").field(&self.spec).finish()
    }
}

/// Named filter builders, owned by a [`Router`](crate::router::Router).
///
/// [`FilterRegistry::default`] comes with the built-in classes; use
/// [`FilterRegistry::empty`] to start from nothing.
#[derive(Clone)]
pub struct FilterRegistry {
    builders: HashMap<String, FilterBuilder>,
}

impl FilterRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Register `builder` under `class`, replacing any previous builder.
    pub fn register<F>(&mut self, class: &str, builder: F)
    where
        F: Fn(&str, &[&str]) -> Result<Arc<dyn Filter>, FilterError> + Send + Sync + 'static,
    {
        debug!(class = %class, "Filter class registered");
        self.builders.insert(class.to_string(), Arc::new(builder));
    }

    /// Register a filter class that takes no arguments and wraps a function.
    pub fn register_fn<F>(&mut self, class: &str, f: F)
    where
        F: Fn(&str) -> Option<Value> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.register(class, move |class, args| {
            if !args.is_empty() {
                return Err(FilterError::arguments(class, "takes no arguments"));
            }
            let f = Arc::clone(&f);
            Ok(Arc::new(FilterFn(move |text: &str| f(text))) as Arc<dyn Filter>)
        });
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.builders.contains_key(class)
    }

    /// Construct the filter `class` with `args`.
    ///
    /// # Errors
    ///
    /// [`PatternError::UnknownFilter`] for an unregistered class, or the
    /// builder's [`FilterError`].
    pub fn build(&self, class: &str, args: &[&str]) -> Result<BoundFilter, PatternError> {
        let builder = self
            .builders
            .get(class)
            .ok_or_else(|| PatternError::UnknownFilter {
                class: class.to_string(),
            })?;
        let filter = builder(class, args)?;

        let mut spec = String::from(class);
        for arg in args {
            spec.push(' ');
            spec.push_str(arg);
        }
        Ok(BoundFilter {
            spec: spec.into(),
            filter,
        })
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        builtin::install(&mut registry);
        registry
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        classes.sort_unstable();
        f.debug_struct("FilterRegistry")
            .field("classes", &classes)
            .finish()
    }
}

//! Path parameters captured during a match.
//!
//! The matcher reports every captured parameter of the winning route, in
//! left-to-right path order, through a [`ParamsReceiver`]. Two receivers cover
//! the common cases:
//!
//! - [`Params`] keeps the filter-converted values (`uint` segments become
//!   numbers, `regex` segments their first capture group, ...).
//! - [`PathParams`] keeps the raw path text.
//!
//! [`Captures`] keeps all three parts and can replay them into another
//! receiver later, which is how the router feeds a context that is created
//! only after the route is known.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum number of path parameters before heap allocation.
/// Most routes have ≤4 path params (e.g. `/users/:id/posts/:post_id`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Receives the parameters of the winning route.
///
/// * `key` - parameter name, `"*"` for an unnamed catch-all
/// * `text` - the raw text from the path
/// * `value` - the value produced by the segment's filter (the text itself
///   for unfiltered segments)
pub trait ParamsReceiver {
    fn receive(&mut self, key: &Arc<str>, text: &str, value: Value);
}

/// Adapts a closure to [`ParamsReceiver`].
pub struct ParamsFn<F>(pub F);

impl<F> ParamsReceiver for ParamsFn<F>
where
    F: FnMut(&str, &str, Value),
{
    fn receive(&mut self, key: &Arc<str>, text: &str, value: Value) {
        (self.0)(key.as_ref(), text, value)
    }
}

/// Discards everything.
impl ParamsReceiver for () {
    fn receive(&mut self, _key: &Arc<str>, _text: &str, _value: Value) {}
}

/// Converted parameter values by name.
///
/// Param names use `Arc<str>` because they come from the route tree and are
/// shared by every request that matches it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: SmallVec<[(Arc<str>, Value); MAX_INLINE_PARAMS]>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier value with the same name.
    pub fn insert(&mut self, key: &Arc<str>, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((Arc::clone(key), value)),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// String form of a value: strings as-is, anything else through its JSON
    /// rendering (`6000`, `true`, ...).
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| match v {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Note: allocates - use [`Params::get`] in hot paths
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    /// Deserialize the parameters into a struct, one field per parameter.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error when a field is missing or has the wrong
    /// shape.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let object: Map<String, Value> =
            self.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        serde_json::from_value(Value::Object(object))
    }
}

impl ParamsReceiver for Params {
    fn receive(&mut self, key: &Arc<str>, _text: &str, value: Value) {
        self.insert(key, value);
    }
}

/// Raw path text by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>,
}

impl PathParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &Arc<str>, text: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => text.clone_into(&mut entry.1),
            None => self.entries.push((Arc::clone(key), text.to_string())),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Note: allocates - use [`PathParams::get`] in hot paths
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    /// Deserialize the raw texts into a struct; every field sees a string.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error when a field is missing or is not a
    /// string-shaped type.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let object: Map<String, Value> = self
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        serde_json::from_value(Value::Object(object))
    }
}

impl ParamsReceiver for PathParams {
    fn receive(&mut self, key: &Arc<str>, text: &str, _value: Value) {
        self.insert(key, text);
    }
}

/// One captured parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub name: Arc<str>,
    pub text: String,
    pub value: Value,
}

/// Buffers everything a match emits, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captures {
    entries: SmallVec<[Capture; MAX_INLINE_PARAMS]>,
}

impl Captures {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed every buffered parameter to `receiver`, in capture order.
    pub fn replay(&self, receiver: &mut dyn ParamsReceiver) {
        for capture in &self.entries {
            receiver.receive(&capture.name, &capture.text, capture.value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capture> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ParamsReceiver for Captures {
    fn receive(&mut self, key: &Arc<str>, text: &str, value: Value) {
        self.entries.push(Capture {
            name: Arc::clone(key),
            text: text.to_string(),
            value,
        });
    }
}

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, warn};

use super::handler::Handler;
use crate::params::{Params, ParamsReceiver, PathParams};
use crate::response::ResponseWriter;
use crate::{Request, Response};

/// Key of one slot in the context value store.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// What the chain does when a handler's arguments cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvokePolicy {
    /// Log and continue with the next handler.
    #[default]
    Skip,
    /// Stop the chain; answer `500` unless something was already written.
    Abort,
}

impl FromStr for InvokePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(InvokePolicy::Skip),
            "abort" => Ok(InvokePolicy::Abort),
            other => Err(format!("unknown invoke policy `{other}` (expected skip|abort)")),
        }
    }
}

impl fmt::Display for InvokePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokePolicy::Skip => f.write_str("skip"),
            InvokePolicy::Abort => f.write_str("abort"),
        }
    }
}

/// How a context keeps the captured path parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamStyle {
    /// Filter-converted values, see [`Params`].
    #[default]
    Values,
    /// Raw path text, see [`PathParams`].
    Text,
}

#[derive(Debug)]
enum Captured {
    Values(Params),
    Text(PathParams),
}

/// Per-request state: the request, the response being written, the captured
/// path parameters, a type-indexed value store and the handler chain.
pub struct Context {
    request: Request,
    response: ResponseWriter,
    params: Captured,
    store: HashMap<TypeKey, Box<dyn Any + Send>>,
    handlers: Arc<[Handler]>,
    cursor: usize,
    policy: InvokePolicy,
}

impl Context {
    /// Context keeping filter-converted parameter values.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self::with_style(request, ParamStyle::Values)
    }

    /// Context keeping the raw parameter text.
    #[must_use]
    pub fn scene(request: Request) -> Self {
        Self::with_style(request, ParamStyle::Text)
    }

    #[must_use]
    pub fn with_style(request: Request, style: ParamStyle) -> Self {
        let params = match style {
            ParamStyle::Values => Captured::Values(Params::new()),
            ParamStyle::Text => Captured::Text(PathParams::new()),
        };
        Self {
            request,
            response: ResponseWriter::new(),
            params,
            store: HashMap::new(),
            handlers: Arc::from(Vec::<Handler>::new()),
            cursor: 0,
            policy: InvokePolicy::default(),
        }
    }

    #[must_use]
    pub fn style(&self) -> ParamStyle {
        match self.params {
            Captured::Values(_) => ParamStyle::Values,
            Captured::Text(_) => ParamStyle::Text,
        }
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    /// Read-only view of the response written so far.
    #[must_use]
    pub fn response_ref(&self) -> &ResponseWriter {
        &self.response
    }

    /// Shorthand for writing a string body.
    pub fn write_str(&mut self, data: &str) -> usize {
        self.response.write_str(data)
    }

    // ---- parameters ----------------------------------------------------

    /// Converted parameters; `None` for a [`ParamStyle::Text`] context.
    #[must_use]
    pub fn params(&self) -> Option<&Params> {
        match &self.params {
            Captured::Values(p) => Some(p),
            Captured::Text(_) => None,
        }
    }

    /// Raw parameters; `None` for a [`ParamStyle::Values`] context.
    #[must_use]
    pub fn path_params(&self) -> Option<&PathParams> {
        match &self.params {
            Captured::Text(p) => Some(p),
            Captured::Values(_) => None,
        }
    }

    /// String form of parameter `name`, whatever the style.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<Cow<'_, str>> {
        match &self.params {
            Captured::Values(p) => p.get_str(name),
            Captured::Text(p) => p.get(name).map(Cow::Borrowed),
        }
    }

    /// Deserialize the captured parameters into `T`.
    ///
    /// # Errors
    ///
    /// The deserializer error when the parameters do not fit `T`.
    pub fn bind_params<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.params {
            Captured::Values(p) => p.bind(),
            Captured::Text(p) => p.bind(),
        }
    }

    // ---- value store ---------------------------------------------------

    /// Store `value` under its own type, replacing an earlier one.
    pub fn map<T: Any + Send>(&mut self, value: T) {
        self.map_to(TypeKey::of::<T>(), value);
    }

    /// Store `value` under an explicit key, replacing an earlier one.
    pub fn map_to<T: Any + Send>(&mut self, key: TypeKey, value: T) {
        self.store.insert(key, Box::new(value));
    }

    #[must_use]
    pub fn get(&self, key: TypeKey) -> Option<&(dyn Any + Send)> {
        self.store.get(&key).map(Box::as_ref)
    }

    /// The value stored under `T`'s own key.
    #[must_use]
    pub fn value<T: Any + Send>(&self) -> Option<&T> {
        self.get(TypeKey::of::<T>())?.downcast_ref::<T>()
    }

    pub fn value_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.store.get_mut(&TypeKey::of::<T>())?.downcast_mut::<T>()
    }

    /// Remove and return the value stored under `T`'s own key.
    pub fn take<T: Any + Send>(&mut self) -> Option<T> {
        let boxed = self.store.remove(&TypeKey::of::<T>())?;
        boxed.downcast::<T>().ok().map(|b| *b)
    }

    /// A stored value together with the response writer.
    pub(super) fn value_with_response<T: Any + Send>(
        &mut self,
    ) -> Option<(&T, &mut ResponseWriter)> {
        let value = stored::<T>(&self.store)?;
        Some((value, &mut self.response))
    }

    pub(super) fn split(&mut self) -> (&Request, &mut ResponseWriter) {
        (&self.request, &mut self.response)
    }

    /// A `Params` in the store wins over the captured parameters.
    pub(super) fn split_params(&mut self) -> Option<(&Params, &mut ResponseWriter)> {
        if let Some(stored) = stored::<Params>(&self.store) {
            return Some((stored, &mut self.response));
        }
        match &self.params {
            Captured::Values(p) => Some((p, &mut self.response)),
            Captured::Text(_) => None,
        }
    }

    pub(super) fn split_path_params(&mut self) -> Option<(&PathParams, &mut ResponseWriter)> {
        if let Some(stored) = stored::<PathParams>(&self.store) {
            return Some((stored, &mut self.response));
        }
        match &self.params {
            Captured::Text(p) => Some((p, &mut self.response)),
            Captured::Values(_) => None,
        }
    }

    // ---- chain -----------------------------------------------------------

    /// Install the handler chain and rewind the cursor.
    pub fn set_handlers(&mut self, handlers: Arc<[Handler]>) {
        self.handlers = handlers;
        self.cursor = 0;
    }

    #[must_use]
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub fn set_policy(&mut self, policy: InvokePolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn policy(&self) -> InvokePolicy {
        self.policy
    }

    /// Run `handler` if all of its arguments can be resolved.
    ///
    /// Returns `false`, without running it, when an argument is missing.
    pub fn invoke(&mut self, handler: &Handler) -> bool {
        handler.call(self)
    }

    /// Run the handlers after the cursor.
    ///
    /// Stops after a context-shaped handler (it calls `next` itself when it
    /// wants the chain to go on) and after any handler that wrote to the
    /// response.
    pub fn next(&mut self) {
        let handlers = Arc::clone(&self.handlers);
        while let Some(handler) = handlers.get(self.cursor) {
            let position = self.cursor;
            self.cursor += 1;

            if !self.invoke(handler) {
                match self.policy {
                    InvokePolicy::Skip => {
                        warn!(
                            position,
                            handler = %handler.describe(),
                            "Handler arguments unresolved, skipping"
                        );
                        continue;
                    }
                    InvokePolicy::Abort => {
                        error!(
                            position,
                            handler = %handler.describe(),
                            "Handler arguments unresolved, aborting chain"
                        );
                        self.abort();
                        return;
                    }
                }
            }

            if handler.is_context() || self.response.written() {
                return;
            }
        }
    }

    /// Stop the chain; nothing after the cursor runs.
    pub fn abort(&mut self) {
        self.cursor = self.handlers.len();
        if !self.response.written() {
            self.response.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[must_use]
    pub fn into_response(self) -> Response {
        self.response.into_response()
    }
}

fn stored<T: Any + Send>(store: &HashMap<TypeKey, Box<dyn Any + Send>>) -> Option<&T> {
    store.get(&TypeKey::of::<T>())?.downcast_ref::<T>()
}

impl ParamsReceiver for Context {
    fn receive(&mut self, key: &Arc<str>, text: &str, value: Value) {
        match &mut self.params {
            Captured::Values(p) => p.insert(key, value),
            Captured::Text(p) => p.insert(key, text),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("path", &self.request.uri().path())
            .field("params", &self.params)
            .field("store", &self.store.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.len())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

use serde::de::DeserializeOwned;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use super::core::Context;
use crate::params::{Params, PathParams};
use crate::response::ResponseWriter;
use crate::Request;

type UnitFn = dyn Fn() + Send + Sync;
type RequestFn = dyn Fn(&Request) + Send + Sync;
type HttpFn = dyn Fn(&Request, &mut ResponseWriter) + Send + Sync;
type ParamsFn = dyn Fn(&Params, &mut ResponseWriter) + Send + Sync;
type PathParamsFn = dyn Fn(&PathParams, &mut ResponseWriter) + Send + Sync;
type ContextFn = dyn Fn(&mut Context) + Send + Sync;
/// Resolves its own argument; `false` when it cannot.
type AdaptedFn = dyn Fn(&mut Context) -> bool + Send + Sync;

#[derive(Clone)]
enum Shape {
    Unit(Arc<UnitFn>),
    Request(Arc<RequestFn>),
    Http(Arc<HttpFn>),
    Params(Arc<ParamsFn>),
    PathParams(Arc<PathParamsFn>),
    Context(Arc<ContextFn>),
    Adapted(Arc<AdaptedFn>),
}

/// One element of a handler chain.
///
/// Cloning is cheap; the function itself is shared.
#[derive(Clone)]
pub struct Handler {
    shape: Shape,
    label: Arc<str>,
}

impl Handler {
    fn with(shape: Shape, label: impl Into<Arc<str>>) -> Self {
        Self {
            shape,
            label: label.into(),
        }
    }

    /// A handler taking no arguments.
    pub fn unit<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with(Shape::Unit(Arc::new(f)), "unit")
    }

    pub fn request<F>(f: F) -> Self
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        Self::with(Shape::Request(Arc::new(f)), "request")
    }

    /// The classic `(request, response)` shape.
    pub fn http<F>(f: F) -> Self
    where
        F: Fn(&Request, &mut ResponseWriter) + Send + Sync + 'static,
    {
        Self::with(Shape::Http(Arc::new(f)), "http")
    }

    /// Converted parameters: a stored [`Params`] first, then the captured
    /// ones. Unresolved in a raw-text context with nothing stored.
    pub fn params<F>(f: F) -> Self
    where
        F: Fn(&Params, &mut ResponseWriter) + Send + Sync + 'static,
    {
        Self::with(Shape::Params(Arc::new(f)), "params")
    }

    /// Raw parameter text, a stored [`PathParams`] first. Unresolved in a
    /// converted-values context with nothing stored.
    pub fn path_params<F>(f: F) -> Self
    where
        F: Fn(&PathParams, &mut ResponseWriter) + Send + Sync + 'static,
    {
        Self::with(Shape::PathParams(Arc::new(f)), "path_params")
    }

    /// Full access to the context. The chain continues only through
    /// [`Context::next`].
    pub fn context<F>(f: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        Self::with(Shape::Context(Arc::new(f)), "context")
    }

    /// A value previously stored with [`Context::map`].
    pub fn value<T, F>(f: F) -> Self
    where
        T: Any + Send,
        F: Fn(&T, &mut ResponseWriter) + Send + Sync + 'static,
    {
        let adapted = move |ctx: &mut Context| match ctx.value_with_response::<T>() {
            Some((value, rw)) => {
                f(value, rw);
                true
            }
            None => false,
        };
        Self::with(
            Shape::Adapted(Arc::new(adapted)),
            format!("value<{}>", type_name::<T>()),
        )
    }

    /// A `T` taken from the value store if present, otherwise deserialized
    /// from the captured path parameters.
    pub fn bind<T, F>(f: F) -> Self
    where
        T: DeserializeOwned + Clone + Any + Send,
        F: Fn(T, &mut ResponseWriter) + Send + Sync + 'static,
    {
        let adapted = move |ctx: &mut Context| {
            let arg = match ctx.value::<T>() {
                Some(stored) => stored.clone(),
                None => match ctx.bind_params::<T>() {
                    Ok(bound) => bound,
                    Err(_) => return false,
                },
            };
            f(arg, ctx.response());
            true
        };
        Self::with(
            Shape::Adapted(Arc::new(adapted)),
            format!("bind<{}>", type_name::<T>()),
        )
    }

    /// Replace the label used in log lines.
    #[must_use]
    pub fn named(mut self, label: &str) -> Self {
        self.label = Arc::from(label);
        self
    }

    #[must_use]
    pub fn describe(&self) -> &str {
        &self.label
    }

    pub(super) fn is_context(&self) -> bool {
        matches!(self.shape, Shape::Context(_))
    }

    pub(super) fn call(&self, ctx: &mut Context) -> bool {
        match &self.shape {
            Shape::Unit(f) => f(),
            Shape::Request(f) => f(ctx.request()),
            Shape::Http(f) => {
                let (req, rw) = ctx.split();
                f(req, rw);
            }
            Shape::Params(f) => {
                let Some((params, rw)) = ctx.split_params() else {
                    return false;
                };
                f(params, rw);
            }
            Shape::PathParams(f) => {
                let Some((params, rw)) = ctx.split_path_params() else {
                    return false;
                };
                f(params, rw);
            }
            Shape::Context(f) => f(ctx),
            Shape::Adapted(f) => return f(ctx),
        }
        true
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.label).finish()
    }
}

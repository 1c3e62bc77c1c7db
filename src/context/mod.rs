//! # Context Module
//!
//! The per-request value store and handler-chain runner.
//!
//! A [`Context`] is built for every request by a riveter (see
//! [`Router::set_riveter`](crate::router::Router::set_riveter)), receives the
//! parameters of the matched route, and then runs the route's handlers in
//! order.
//!
//! ## Handler shapes
//!
//! Handlers are a closed set of shapes built with explicit constructors on
//! [`Handler`]:
//!
//! | Constructor              | Arguments resolved                                   |
//! |--------------------------|------------------------------------------------------|
//! | [`Handler::unit`]        | none                                                 |
//! | [`Handler::request`]     | the request                                          |
//! | [`Handler::http`]        | the request and the response writer                  |
//! | [`Handler::params`]      | converted [`Params`](crate::params::Params)          |
//! | [`Handler::path_params`] | raw [`PathParams`](crate::params::PathParams)        |
//! | [`Handler::context`]     | the whole [`Context`]                                |
//! | [`Handler::value`]       | a `&T` from the value store                          |
//! | [`Handler::bind`]        | a `T` from the store, else bound from the parameters |
//!
//! ## Continuation
//!
//! A context-shaped handler controls the chain itself: the rest of the chain
//! runs only if it calls [`Context::next`]. Every other shape continues to the
//! next handler automatically unless it wrote to the response.
//!
//! A handler whose argument cannot be resolved is not run and
//! [`Context::invoke`] returns `false`; what happens next is decided by the
//! [`InvokePolicy`].

mod core;
mod handler;
#[cfg(test)]
mod tests;

pub use self::core::{Context, InvokePolicy, ParamStyle, TypeKey};
pub use handler::Handler;

//! Router core module - hot path for request routing.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::{Method, StatusCode};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

use crate::context::{Context, Handler};
use crate::error::RouteError;
use crate::filter::FilterRegistry;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::params::{Captures, ParamsReceiver};
use crate::pattern::Pattern;
use crate::runtime_config::RuntimeConfig;
use crate::trie::{NodeRef, RouteId, RouteIds, Trie};
use crate::{Request, Response};

/// Builds the request-scoped [`Context`] for a matched route.
///
/// [`Context::new`] is the default; [`Context::scene`] keeps raw parameter
/// text instead of converted values.
pub type Riveter = Arc<dyn Fn(Request) -> Context + Send + Sync>;

/// Methods covered by [`Router::any`].
pub const ANY_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// What a trie leaf carries: the handler chain and an optional riveter
/// override.
#[derive(Clone)]
pub struct Route {
    handlers: Arc<[Handler]>,
    riveter: Option<Riveter>,
    name: Option<Arc<str>>,
}

impl Route {
    pub fn new(handlers: impl IntoIterator<Item = Handler>) -> Self {
        Self {
            handlers: handlers.into_iter().collect(),
            riveter: None,
            name: None,
        }
    }

    /// Build this route's contexts with `riveter` instead of the router's.
    #[must_use]
    pub fn with_riveter(mut self, riveter: Riveter) -> Self {
        self.riveter = Some(riveter);
        self
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    #[must_use]
    pub fn has_riveter(&self) -> bool {
        self.riveter.is_some()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("handlers", &self.handlers)
            .field("riveter", &self.riveter.is_some())
            .finish()
    }
}

/// One registered route, as listed by [`Router::routes`].
#[derive(Debug, Clone, Copy)]
pub struct RouteInfo<'r> {
    pub method: &'r Method,
    pub id: RouteId,
    pub pattern: &'r str,
    pub route: &'r Route,
}

/// Method-scoped routing table.
///
/// Register routes first (`&mut self`), then share the router read-only
/// between threads: matching and serving take `&self`.
pub struct Router {
    tries: HashMap<Method, Trie<Route>>,
    filters: FilterRegistry,
    ids: RouteIds,
    riveter: Riveter,
    not_found: Arc<[Handler]>,
    config: RuntimeConfig,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Empty router with the built-in filters and default runtime settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            tries: HashMap::new(),
            filters: FilterRegistry::default(),
            ids: RouteIds::new(),
            riveter: Arc::new(Context::new),
            not_found: Arc::from(vec![default_not_found()]),
            config,
        }
    }

    /// Replace the filter registry. Affects routes registered afterwards.
    #[must_use]
    pub fn with_filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    /// Filter classes available to patterns registered from now on.
    pub fn filters_mut(&mut self) -> &mut FilterRegistry {
        &mut self.filters
    }

    #[must_use]
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RuntimeConfig) {
        self.config = config;
    }

    /// Default context factory for routes without their own riveter.
    pub fn set_riveter(&mut self, riveter: Riveter) {
        self.riveter = riveter;
    }

    /// Handlers run when no route matches. Defaults to a plain 404.
    pub fn not_found(&mut self, handlers: impl IntoIterator<Item = Handler>) {
        self.not_found = handlers.into_iter().collect();
    }

    /// Register `handlers` for `method` and `pattern`.
    ///
    /// # Errors
    ///
    /// [`RouteError::Pattern`] when the pattern does not compile,
    /// [`RouteError::Conflict`] when it clashes with a registered one.
    pub fn handle(
        &mut self,
        method: Method,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<RouteId, RouteError> {
        self.handle_route(method, pattern, Route::new(handlers))
    }

    /// Register a prepared [`Route`].
    ///
    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn handle_route(
        &mut self,
        method: Method,
        pattern: &str,
        route: Route,
    ) -> Result<RouteId, RouteError> {
        let compiled =
            Pattern::compile(pattern, &self.filters).map_err(|source| RouteError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
        let trie = self.tries.entry(method.clone()).or_default();
        let id = trie.insert(&compiled, route, &mut self.ids)?;
        debug!(
            method = %method,
            pattern = %pattern,
            route_id = %id,
            keys = ?compiled.keys(),
            "Route registered"
        );
        Ok(id)
    }

    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn get(
        &mut self,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<RouteId, RouteError> {
        self.handle(Method::GET, pattern, handlers)
    }

    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn post(
        &mut self,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<RouteId, RouteError> {
        self.handle(Method::POST, pattern, handlers)
    }

    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn put(
        &mut self,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<RouteId, RouteError> {
        self.handle(Method::PUT, pattern, handlers)
    }

    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn patch(
        &mut self,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<RouteId, RouteError> {
        self.handle(Method::PATCH, pattern, handlers)
    }

    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn delete(
        &mut self,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<RouteId, RouteError> {
        self.handle(Method::DELETE, pattern, handlers)
    }

    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn head(
        &mut self,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<RouteId, RouteError> {
        self.handle(Method::HEAD, pattern, handlers)
    }

    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn options(
        &mut self,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<RouteId, RouteError> {
        self.handle(Method::OPTIONS, pattern, handlers)
    }

    /// Register the same chain under every method in [`ANY_METHODS`].
    ///
    /// Each method gets its own route identity; they are returned in
    /// [`ANY_METHODS`] order.
    ///
    /// # Errors
    ///
    /// See [`Router::handle`]. Methods registered before the failing one stay
    /// registered.
    pub fn any(
        &mut self,
        pattern: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<Vec<RouteId>, RouteError> {
        let route = Route::new(handlers);
        ANY_METHODS
            .iter()
            .map(|method| self.handle_route(method.clone(), pattern, route.clone()))
            .collect()
    }

    /// Find the route for `method` and `path`, feeding its parameters to
    /// `receiver`.
    ///
    /// An unregistered method or unmatched path gives the not-found node
    /// (`id() == RouteId::NOT_FOUND`) and emits nothing.
    pub fn match_route<'r>(
        &'r self,
        method: &Method,
        path: &str,
        receiver: &mut dyn ParamsReceiver,
        req: Option<&Request>,
    ) -> NodeRef<'r, Route> {
        match self.tries.get(method) {
            Some(trie) => trie.lookup(path, receiver, req),
            None => NodeRef::not_found(),
        }
    }

    /// Every registered route, ordered by identity.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo<'_>> {
        let mut out: Vec<_> = self
            .tries
            .iter()
            .flat_map(|(method, trie)| {
                trie.routes()
                    .into_iter()
                    .map(move |(id, pattern, route)| RouteInfo {
                        method,
                        id,
                        pattern,
                        route,
                    })
            })
            .collect();
        out.sort_by_key(|info| info.id);
        out
    }

    /// Number of registered routes across all methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tries.values().map(Trie::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Route one request and run its handler chain.
    pub fn serve(&self, req: Request) -> Response {
        let started = Instant::now();
        let request_id = RequestId::from_header_or_new(
            req.headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
        );
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let span = info_span!("request", request_id = %request_id, method = %method, path = %path);
        let _entered = span.enter();

        let mut captures = Captures::new();
        let node = self.match_route(&method, &path, &mut captures, Some(&req));
        let match_us = started.elapsed().as_micros();
        if match_us > u128::from(self.config.slow_match_us) {
            warn!(
                route_id = %node.id(),
                pattern = %node.pattern(),
                duration_us = match_us,
                threshold_us = self.config.slow_match_us,
                "Slow route matching detected"
            );
        } else {
            debug!(
                route_id = %node.id(),
                pattern = %node.pattern(),
                params = captures.len(),
                duration_us = match_us,
                "Route match attempt"
            );
        }

        let (handlers, riveter) = match node.route() {
            Some(route) => (
                Arc::clone(&route.handlers),
                route.riveter.as_ref().unwrap_or(&self.riveter),
            ),
            None => (Arc::clone(&self.not_found), &self.riveter),
        };

        let mut ctx = riveter(req);
        ctx.map(request_id);
        captures.replay(&mut ctx);
        ctx.set_policy(self.config.invoke_policy);
        ctx.set_handlers(handlers);
        ctx.next();

        let status = ctx.response_ref().status();
        let size = ctx.response_ref().size();
        info!(
            route_id = %node.id(),
            route = node.route().and_then(Route::name).unwrap_or(""),
            status,
            size,
            latency_us = started.elapsed().as_micros(),
            "Request completed"
        );
        ctx.into_response()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.len())
            .field("methods", &self.tries.keys().collect::<Vec<_>>())
            .field("filters", &self.filters)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn default_not_found() -> Handler {
    Handler::http(|_, rw| {
        rw.write_header(StatusCode::NOT_FOUND);
        rw.write_str("404 page not found\n");
    })
    .named("not_found")
}

//! Route tables declared in TOML.
//!
//! ```toml
//! [settings]
//! invoke_policy = "abort"   # optional, skip|abort
//! slow_match_us = 500       # optional
//!
//! [[route]]
//! method = "GET"
//! pattern = "/repos/:owner/:repo"
//! name = "get_repo"
//!
//! [[route]]
//! method = "GET"
//! pattern = "/files/**"
//! style = "text"            # optional, values|text
//! ```
//!
//! [`RouteTable::build_router`] registers every entry with a handler that
//! answers a JSON document naming the route and its parameters, which makes a
//! table useful for checking patterns and for stubbing services.

use http::header::{HeaderValue, CONTENT_TYPE};
use http::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::context::{Context, Handler, InvokePolicy, ParamStyle};
use crate::error::TableError;
use crate::router::{Route, Router};
use crate::runtime_config::RuntimeConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSettings {
    pub invoke_policy: Option<InvokePolicy>,
    pub slow_match_us: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    pub method: String,
    pub pattern: String,
    /// Defaults to `"METHOD pattern"`.
    pub name: Option<String>,
    #[serde(default)]
    pub style: ParamStyle,
}

impl RouteEntry {
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.method.to_uppercase(), self.pattern),
        }
    }

    /// # Errors
    ///
    /// [`TableError::Method`] when `method` is not a valid HTTP method token.
    pub fn method(&self) -> Result<Method, TableError> {
        let upper = self.method.to_uppercase();
        Method::from_bytes(upper.as_bytes()).map_err(|_| TableError::Method {
            route: self.display_name(),
            method: self.method.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTable {
    #[serde(default)]
    pub settings: TableSettings,
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteEntry>,
}

impl RouteTable {
    /// Read and parse a table file.
    ///
    /// # Errors
    ///
    /// [`TableError::Io`] or [`TableError::Parse`].
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let contents = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// # Errors
    ///
    /// [`TableError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(contents: &str) -> Result<Self, TableError> {
        Ok(toml::from_str(contents)?)
    }

    /// Runtime settings: `base` overridden by the table's `[settings]`.
    #[must_use]
    pub fn runtime_config(&self, base: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            invoke_policy: self.settings.invoke_policy.unwrap_or(base.invoke_policy),
            slow_match_us: self.settings.slow_match_us.unwrap_or(base.slow_match_us),
        }
    }

    /// Register every entry on a fresh router.
    ///
    /// # Errors
    ///
    /// The first entry with an invalid method, pattern or conflict.
    pub fn build_router(&self) -> Result<Router, TableError> {
        self.build_router_with(RuntimeConfig::default())
    }

    /// Like [`RouteTable::build_router`], starting from `base` settings.
    ///
    /// # Errors
    ///
    /// See [`RouteTable::build_router`].
    pub fn build_router_with(&self, base: RuntimeConfig) -> Result<Router, TableError> {
        let mut router = Router::with_config(self.runtime_config(base));
        for entry in &self.routes {
            let method = entry.method()?;
            let name = entry.display_name();
            let mut route = Route::new([echo_route(&name)]).named(&name);
            if entry.style == ParamStyle::Text {
                route = route.with_riveter(Arc::new(Context::scene));
            }
            router
                .handle_route(method, &entry.pattern, route)
                .map_err(|source| TableError::Route {
                    route: name.clone(),
                    source,
                })?;
        }
        info!(
            routes_count = router.len(),
            invoke_policy = %router.config().invoke_policy,
            "Route table loaded"
        );
        Ok(router)
    }
}

/// Answers `{"route": name, "params": {...}}`.
fn echo_route(name: &str) -> Handler {
    let name: Arc<str> = Arc::from(name);
    Handler::context(move |ctx| {
        let params: Map<String, Value> = match (ctx.params(), ctx.path_params()) {
            (Some(values), _) => values
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            (None, Some(raw)) => raw
                .iter()
                .map(|(k, v)| (k.to_string(), Value::from(v)))
                .collect(),
            (None, None) => Map::new(),
        };
        let body = json!({ "route": name.as_ref(), "params": params });
        let rw = ctx.response();
        rw.insert_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        rw.write_str(&body.to_string());
    })
    .named("echo_route")
}

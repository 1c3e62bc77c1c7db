//! # rivet
//!
//! **rivet** is a trie-based HTTP request router: given a method and a path it
//! finds the single best-matching registered route, extracts typed path
//! parameters, and runs the route's handlers as a middleware chain over a
//! per-request, type-indexed value store.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **[`filter`]** - named validators/converters for one segment's text
//!   (`uint`, `int`, `regex`, `string`, ...), held in a router-owned registry
//! - **[`pattern`]** - compiles `/repos/:owner/:id uint` style patterns into
//!   segment lists, resolving filters
//! - **[`trie`]** - per-method radix tree with stable route identities, and
//!   the backtracking matcher (static > parameter > catch-all at every level)
//! - **[`router`]** - one trie per method, registration, matching, and the
//!   [`Router::serve`](router::Router::serve) request entry point
//! - **[`context`]** - the per-request value store and handler chain
//!
//! Around them: [`params`] (parameter receivers), [`response`] (the response
//! writer), [`shared`] (swapping a router while serving), [`table`] (TOML
//! route tables), [`runtime_config`], [`logging`] and the [`cli`] behind the
//! `rivet` binary.
//!
//! ## Pattern grammar
//!
//! | Pattern                   | Matches                                             |
//! |---------------------------|-----------------------------------------------------|
//! | `/about`                  | the literal path                                    |
//! | `/users/:id`              | any non-empty segment, captured as `id`             |
//! | `/users/:id uint`         | a segment accepted by the `uint` filter             |
//! | `/v/:version \| v(\d+)`   | a segment matching the regex, first group captured  |
//! | `/files/img:name`         | literal `img` then the rest of the segment          |
//! | `/static/*path`           | one or more remaining characters, across `/`        |
//! | `/assets**`               | the possibly empty remainder, captured as `*`       |
//! | `/catch/all/?`            | with or without the trailing slash                  |
//!
//! ## Example
//!
//! ```rust
//! use rivet::context::Handler;
//! use rivet::router::Router;
//!
//! let mut router = Router::new();
//! router.get("/", [Handler::http(|_, rw| { rw.write_str("home"); })]).unwrap();
//! router
//!     .get("/users/:id uint", [Handler::params(|p, rw| {
//!         let id = p.get("id").and_then(|v| v.as_u64()).unwrap_or(0);
//!         rw.write_str(&format!("user {}", id + 1));
//!     })])
//!     .unwrap();
//!
//! let res = router.serve(http::Request::get("/users/41").body(Vec::new()).unwrap());
//! assert_eq!(res.body(), b"user 42");
//!
//! let res = router.serve(http::Request::get("/users/me").body(Vec::new()).unwrap());
//! assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
//! ```
//!
//! ## Logging
//!
//! Every module logs through `tracing`; install a subscriber with
//! [`logging::init_logging_with_config`] or bring your own.

pub mod cli;
pub mod context;
pub mod error;
pub mod filter;
pub mod ids;
pub mod logging;
pub mod params;
pub mod pattern;
pub mod response;
pub mod router;
pub mod runtime_config;
pub mod shared;
pub mod table;
pub mod trie;

/// Request type handed to the router; the body is already read.
pub type Request = http::Request<Vec<u8>>;
/// Response produced by [`router::Router::serve`].
pub type Response = http::Response<Vec<u8>>;

pub use context::{Context, Handler, InvokePolicy};
pub use error::{FilterError, PatternError, RouteError, TableError};
pub use filter::FilterRegistry;
pub use params::{Params, ParamsReceiver, PathParams};
pub use router::{Route, Router};
pub use trie::RouteId;

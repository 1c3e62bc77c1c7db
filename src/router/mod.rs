//! # Router Module
//!
//! Method-scoped routing: one [`Trie`](crate::trie::Trie) per HTTP method, a
//! shared route-identity allocator and filter registry, and the request entry
//! point that turns a match into a running handler chain.
//!
//! ## Request flow
//!
//! 1. [`Router::serve`] selects the trie for the request method (there is no
//!    fallback to other methods) and matches the path, buffering parameters.
//! 2. The matched route's riveter, or the router default, builds a
//!    [`Context`](crate::context::Context) from the request.
//! 3. The buffered parameters are replayed into the context, the route's
//!    handlers are installed and the chain runs.
//! 4. Unmatched requests run the not-found chain (a plain `404` by default).
//!
//! ## Example
//!
//! ```rust
//! use rivet::context::Handler;
//! use rivet::router::Router;
//!
//! let mut router = Router::new();
//! router
//!     .get("/repos/:owner/:repo", [Handler::params(|params, rw| {
//!         let owner = params.get_str("owner").unwrap_or_default();
//!         rw.write_str(&owner);
//!     })])
//!     .unwrap();
//!
//! let req = http::Request::get("/repos/acme/widget").body(Vec::new()).unwrap();
//! let res = router.serve(req);
//! assert_eq!(res.body(), b"acme");
//! ```
//!
//! ## Performance
//!
//! Lookup cost grows with the path length, not with the number of routes.
//! Matches slower than `RIVET_SLOW_MATCH_US` are logged at `warn`.

mod core;

pub use self::core::{Riveter, Route, RouteInfo, Router, ANY_METHODS};

//! Swapping a router while serving.
//!
//! A [`Router`] is immutable once it serves traffic. To change the routing
//! table, build a complete new router and [`SharedRouter::store`] it: requests
//! already in flight finish on the old table, new requests see the new one, and
//! readers never take a lock.
//!
//! ```rust
//! use rivet::context::Handler;
//! use rivet::router::Router;
//! use rivet::shared::SharedRouter;
//!
//! let shared = SharedRouter::new(Router::new());
//!
//! let mut next = Router::new();
//! next.get("/health", [Handler::http(|_, rw| { rw.write_str("ok"); })]).unwrap();
//! shared.store(next);
//!
//! let res = shared.serve(http::Request::get("/health").body(Vec::new()).unwrap());
//! assert_eq!(res.body(), b"ok");
//! ```

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

use crate::router::Router;
use crate::{Request, Response};

#[derive(Debug)]
pub struct SharedRouter {
    current: ArcSwap<Router>,
}

impl SharedRouter {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            current: ArcSwap::from_pointee(router),
        }
    }

    /// The router serving right now.
    #[must_use]
    pub fn load(&self) -> Arc<Router> {
        self.current.load_full()
    }

    /// Replace the router; returns the previous one.
    pub fn store(&self, router: Router) -> Arc<Router> {
        let routes = router.len();
        let previous = self.current.swap(Arc::new(router));
        info!(
            routes,
            previous_routes = previous.len(),
            "Routing table swapped"
        );
        previous
    }

    /// Serve one request with the current router.
    pub fn serve(&self, req: Request) -> Response {
        self.current.load().serve(req)
    }
}

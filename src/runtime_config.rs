//! # Runtime Configuration Module
//!
//! Environment-variable configuration for request handling.
//!
//! ## Environment Variables
//!
//! ### `RIVET_INVOKE_POLICY`
//!
//! What a handler chain does when a handler's arguments cannot be resolved
//! (for example a `Handler::value::<Session>` with no `Session` in the store):
//!
//! - `skip`: log a warning and continue with the next handler
//! - `abort`: stop the chain and answer `500` if nothing was written yet
//!
//! Default: `skip`
//!
//! ### `RIVET_SLOW_MATCH_US`
//!
//! Route matches taking longer than this many microseconds are logged at
//! `warn` level. Default: `1000`
//!
//! ## Usage
//!
//! ```rust
//! use rivet::router::Router;
//! use rivet::runtime_config::RuntimeConfig;
//!
//! let router = Router::with_config(RuntimeConfig::from_env());
//! assert!(router.is_empty());
//! ```
//!
//! ```bash
//! export RIVET_INVOKE_POLICY=abort
//! export RIVET_SLOW_MATCH_US=250
//! ```

use std::env;
use tracing::warn;

use crate::context::InvokePolicy;

/// Default slow-match threshold in microseconds.
pub const DEFAULT_SLOW_MATCH_US: u64 = 1000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Handling of handlers whose arguments are unresolved (default: skip)
    pub invoke_policy: InvokePolicy,
    /// Slow-match warning threshold in microseconds (default: 1000)
    pub slow_match_us: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            invoke_policy: InvokePolicy::Skip,
            slow_match_us: DEFAULT_SLOW_MATCH_US,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparsable values fall back to the defaults with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let invoke_policy = match lookup("RIVET_INVOKE_POLICY") {
            Some(val) => val.parse().unwrap_or_else(|err: String| {
                warn!(value = %val, error = %err, "Ignoring RIVET_INVOKE_POLICY");
                defaults.invoke_policy
            }),
            None => defaults.invoke_policy,
        };

        let slow_match_us = match lookup("RIVET_SLOW_MATCH_US") {
            Some(val) => val.trim().parse().unwrap_or_else(|_| {
                warn!(value = %val, "Ignoring RIVET_SLOW_MATCH_US, expected microseconds");
                defaults.slow_match_us
            }),
            None => defaults.slow_match_us,
        };

        RuntimeConfig {
            invoke_policy,
            slow_match_us,
        }
    }
}

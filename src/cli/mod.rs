//! # CLI Module
//!
//! The `rivet` binary: checks, queries and lists TOML route tables (see
//! [`crate::table`]).
//!
//! ## Commands
//!
//! ### `check`
//!
//! Compile every pattern of a table and report conflicts:
//!
//! ```bash
//! rivet check routes.toml
//! ```
//!
//! ### `match`
//!
//! Resolve one request against a table and print the result as JSON:
//!
//! ```bash
//! rivet match routes.toml GET /repos/acme/widget
//! # {"id":1,"route":"get_repo","pattern":"/repos/:owner/:repo",
//! #  "params":{"owner":"acme","repo":"widget"},"raw":{"owner":"acme","repo":"widget"}}
//! ```
//!
//! Exits non-zero when nothing matches.
//!
//! ### `routes`
//!
//! List registered routes in identity order:
//!
//! ```bash
//! rivet routes routes.toml
//! ```
//!
//! Log output goes to stderr and is configured with the `RIVET_LOG_*`
//! variables (see [`crate::logging`]).

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};

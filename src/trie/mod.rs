//! # Trie Module
//!
//! A radix tree (compact prefix tree) of compiled route patterns, one per HTTP
//! method. Lookups walk the tree once per path character in the common case;
//! the cost does not grow with the number of registered routes.
//!
//! ## Structure
//!
//! Nodes live in an arena (`Vec`) and reference each other by index, so the
//! tree has a single owner and can be shared read-only between threads once
//! registration is over. Every node may have:
//!
//! - any number of **static** children, each labelled with a literal edge;
//!   siblings never share a first character, and a partially overlapping
//!   insertion splits the existing edge
//! - at most one **parametric** child (optionally carrying a filter)
//! - at most one **catch-all** child
//! - a route payload with a stable [`RouteId`]
//!
//! ```text
//! /repos/:owner/:repo          ""
//! /repos/:owner/issues          └─ "/repos/"
//! /robots.txt                       │   └─ :owner
//!                                   │        └─ "/"
//!                                   │             ├─ "issues"   (id 2)
//!                                   │             └─ :repo      (id 1)
//!                                   └─ ...
//! ```
//!
//! ## Matching priority
//!
//! At every node the matcher tries, in order: the static child whose edge
//! prefixes the remaining path, then the parametric child on the next segment,
//! then the catch-all child. A failing branch (including a filter rejecting the
//! segment text) backtracks to the next option. Parameters are buffered along
//! the branch and only reported for the winning route.

mod matcher;
mod radix;
#[cfg(test)]
mod tests;

pub use radix::{NodeRef, RouteId, RouteIds, Trie};

//! Lookup over the radix tree - hot path for request routing.
//!
//! No allocation happens for abandoned branches: captured texts are borrowed
//! from the path and the names from the tree until the winning route is known.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

use super::radix::{Kind, Leaf, NodeRef, Trie, ROOT};
use crate::params::{ParamsReceiver, MAX_INLINE_PARAMS};
use crate::Request;

struct Pending<'t, 'p> {
    name: &'t Arc<str>,
    text: &'p str,
    /// `None` for unfiltered segments; the text is converted on flush.
    value: Option<Value>,
}

type PendingVec<'t, 'p> = SmallVec<[Pending<'t, 'p>; MAX_INLINE_PARAMS]>;

impl<T> Trie<T> {
    /// Find the route for `path`.
    ///
    /// On success every captured parameter of the winning route is passed to
    /// `receiver` in path order; on failure nothing is passed and the
    /// not-found node (id 0) is returned. `req` is forwarded to filters.
    pub fn lookup<'t>(
        &'t self,
        path: &str,
        receiver: &mut dyn ParamsReceiver,
        req: Option<&Request>,
    ) -> NodeRef<'t, T> {
        let mut pending = PendingVec::new();
        let Some(leaf) = self.walk(ROOT, path, req, &mut pending) else {
            return NodeRef::not_found();
        };

        for p in pending {
            let value = p.value.unwrap_or_else(|| Value::String(p.text.to_owned()));
            receiver.receive(p.name, p.text, value);
        }
        NodeRef::found(leaf)
    }

    /// Depth-first walk from node `at` with `rest` still to be consumed.
    /// Returns the route that consumes all of it.
    fn walk<'t, 'p>(
        &'t self,
        at: usize,
        rest: &'p str,
        req: Option<&Request>,
        pending: &mut PendingVec<'t, 'p>,
    ) -> Option<&'t Leaf<T>> {
        let node = &self.nodes[at];
        if rest.is_empty() {
            // the exact route first, then `/?` without its slash
            if let Some(leaf) = node.leaf.as_ref().or(node.slash_leaf.as_ref()) {
                return Some(leaf);
            }
        }

        // 1. static edge
        if let Some(first) = rest.chars().next() {
            let child = node
                .statics
                .iter()
                .copied()
                .find(|&c| self.nodes[c].first_char() == Some(first));
            if let Some(child) = child {
                if let Some(tail) = rest.strip_prefix(self.nodes[child].prefix.as_str()) {
                    if let Some(found) = self.walk(child, tail, req, pending) {
                        return Some(found);
                    }
                }
            }
        }

        // 2. parameter: the next segment, non-empty
        if let Some(child) = node.param {
            let end = rest.find('/').unwrap_or(rest.len());
            if end > 0 {
                if let Kind::Param { name, filter } = &self.nodes[child].kind {
                    let (text, tail) = rest.split_at(end);
                    let value = match filter {
                        Some(filter) => filter.apply(text, req).map(Some),
                        None => Some(None),
                    };
                    if let Some(value) = value {
                        let mark = pending.len();
                        if !name.is_empty() {
                            pending.push(Pending { name, text, value });
                        }
                        if let Some(found) = self.walk(child, tail, req, pending) {
                            return Some(found);
                        }
                        pending.truncate(mark);
                    }
                }
            }
        }

        // 3. catch-all: always final
        if let Some(child) = node.catch_all {
            let catch_all = &self.nodes[child];
            if let Kind::CatchAll { name, allow_empty } = &catch_all.kind {
                let leaf = catch_all.leaf.as_ref().or(catch_all.slash_leaf.as_ref());
                if let Some(leaf) = leaf {
                    if *allow_empty || !rest.is_empty() {
                        pending.push(Pending {
                            name,
                            text: rest,
                            value: None,
                        });
                        return Some(leaf);
                    }
                }
            }
        }

        if rest == "/" {
            return node.slash_leaf.as_ref();
        }
        None
    }
}

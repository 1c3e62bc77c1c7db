use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::RouteError;
use crate::filter::BoundFilter;
use crate::pattern::{Pattern, Segment};

pub(super) const ROOT: usize = 0;

/// Stable identity of a registered route. `0` is reserved for "not found".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId(u32);

impl RouteId {
    pub const NOT_FOUND: RouteId = RouteId(0);

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_not_found(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out route identities, monotonically from 1.
///
/// A [`Router`](crate::router::Router) shares one allocator across all of its
/// per-method tries so identities are unique router-wide.
#[derive(Debug, Default)]
pub struct RouteIds {
    last: u32,
}

impl RouteIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> RouteId {
        self.last += 1;
        RouteId(self.last)
    }

    /// Number of identities issued so far.
    #[must_use]
    pub fn issued(&self) -> u32 {
        self.last
    }
}

#[derive(Debug)]
pub(super) enum Kind {
    Root,
    Static,
    Param {
        name: Arc<str>,
        filter: Option<BoundFilter>,
    },
    CatchAll {
        name: Arc<str>,
        allow_empty: bool,
    },
}

impl Kind {
    fn describe(&self) -> String {
        match self {
            Kind::Param { name, filter } => match filter {
                Some(f) => format!("parameter `:{name} {}`", f.spec()),
                None => format!("parameter `:{name}`"),
            },
            Kind::CatchAll {
                name,
                allow_empty: true,
            } => format!("catch-all `**` (`{name}`)"),
            Kind::CatchAll { name, .. } => format!("catch-all `*{name}`"),
            Kind::Root | Kind::Static => "static segment".to_string(),
        }
    }
}

#[derive(Debug)]
pub(super) struct Leaf<T> {
    pub(super) id: RouteId,
    pub(super) pattern: String,
    pub(super) payload: T,
}

#[derive(Debug)]
pub(super) struct Node<T> {
    /// Edge literal; empty for the root and for parametric/catch-all nodes.
    pub(super) prefix: String,
    pub(super) kind: Kind,
    pub(super) statics: Vec<usize>,
    pub(super) param: Option<usize>,
    pub(super) catch_all: Option<usize>,
    pub(super) leaf: Option<Leaf<T>>,
    /// Route registered with a trailing `/?`: matches here with or without
    /// one more `/`. Kept apart from `leaf` so `/a` and `/a/?` stay distinct.
    pub(super) slash_leaf: Option<Leaf<T>>,
}

impl<T> Node<T> {
    fn new(prefix: String, kind: Kind) -> Self {
        Self {
            prefix,
            kind,
            statics: Vec::new(),
            param: None,
            catch_all: None,
            leaf: None,
            slash_leaf: None,
        }
    }

    #[inline]
    pub(super) fn first_char(&self) -> Option<char> {
        self.prefix.chars().next()
    }
}

/// Result of a lookup: either a registered route or the not-found sentinel.
#[derive(Debug)]
pub struct NodeRef<'t, T> {
    id: RouteId,
    pattern: &'t str,
    route: Option<&'t T>,
}

impl<'t, T> NodeRef<'t, T> {
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            id: RouteId::NOT_FOUND,
            pattern: "",
            route: None,
        }
    }

    pub(super) fn found(leaf: &'t Leaf<T>) -> Self {
        Self {
            id: leaf.id,
            pattern: &leaf.pattern,
            route: Some(&leaf.payload),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> RouteId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.id.is_not_found()
    }

    /// Source text of the matched pattern; empty when not found.
    #[must_use]
    pub fn pattern(&self) -> &'t str {
        self.pattern
    }

    #[must_use]
    pub fn route(&self) -> Option<&'t T> {
        self.route
    }
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

/// Radix tree of compiled patterns for one HTTP method.
#[derive(Debug)]
pub struct Trie<T> {
    pub(super) nodes: Vec<Node<T>>,
    routes: usize,
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Trie<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(String::new(), Kind::Root)],
            routes: 0,
        }
    }

    /// Number of distinct routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Insert a compiled pattern and attach `payload` to its final node.
    ///
    /// Inserting a structurally identical pattern again replaces the payload
    /// and keeps the identity issued the first time.
    ///
    /// # Errors
    ///
    /// [`RouteError::Conflict`] when a parametric or catch-all segment would
    /// sit next to a different one at the same position.
    pub fn insert(
        &mut self,
        pattern: &Pattern,
        payload: T,
        ids: &mut RouteIds,
    ) -> Result<RouteId, RouteError> {
        let mut at = ROOT;
        let mut optional_slash = false;
        for segment in pattern.segments() {
            at = match segment {
                Segment::Static(text) => self.insert_static(at, text),
                Segment::Param { name, filter } => {
                    let kind = Kind::Param {
                        name: Arc::clone(name),
                        filter: filter.clone(),
                    };
                    self.insert_dynamic(at, kind, pattern)?
                }
                Segment::CatchAll { name, allow_empty } => {
                    let kind = Kind::CatchAll {
                        name: Arc::clone(name),
                        allow_empty: *allow_empty,
                    };
                    self.insert_dynamic(at, kind, pattern)?
                }
                Segment::OptionalSlash => {
                    optional_slash = true;
                    at
                }
            };
        }

        let node = &mut self.nodes[at];
        let slot = if optional_slash {
            &mut node.slash_leaf
        } else {
            &mut node.leaf
        };
        match slot.as_mut() {
            Some(leaf) => {
                warn!(
                    route_id = %leaf.id,
                    pattern = %pattern.source(),
                    previous = %leaf.pattern,
                    "Route already registered, replacing handlers"
                );
                leaf.payload = payload;
                pattern.source().clone_into(&mut leaf.pattern);
                Ok(leaf.id)
            }
            None => {
                let id = ids.next();
                *slot = Some(Leaf {
                    id,
                    pattern: pattern.source().to_string(),
                    payload,
                });
                self.routes += 1;
                debug!(route_id = %id, pattern = %pattern.source(), "Route inserted");
                Ok(id)
            }
        }
    }

    /// Every registered route as `(id, pattern, payload)`, ordered by id.
    #[must_use]
    pub fn routes(&self) -> Vec<(RouteId, &str, &T)> {
        let mut out: Vec<_> = self
            .nodes
            .iter()
            .flat_map(|n| n.leaf.iter().chain(n.slash_leaf.iter()))
            .map(|leaf| (leaf.id, leaf.pattern.as_str(), &leaf.payload))
            .collect();
        out.sort_by_key(|(id, _, _)| *id);
        out
    }

    fn push(&mut self, node: Node<T>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Follow or create static edges for `text`, splitting an edge that only
    /// partially overlaps.
    fn insert_static(&mut self, mut at: usize, mut text: &str) -> usize {
        while let Some(first) = text.chars().next() {
            let slot = self.nodes[at]
                .statics
                .iter()
                .position(|&c| self.nodes[c].first_char() == Some(first));

            let Some(slot) = slot else {
                let child = self.push(Node::new(text.to_string(), Kind::Static));
                self.nodes[at].statics.push(child);
                return child;
            };

            let child = self.nodes[at].statics[slot];
            let common = common_prefix_len(&self.nodes[child].prefix, text);
            if common < self.nodes[child].prefix.len() {
                // The existing child keeps its index (and route identity) and
                // moves under a new node holding the shared head.
                let tail = self.nodes[child].prefix.split_off(common);
                let head = std::mem::replace(&mut self.nodes[child].prefix, tail);
                let mut mid = Node::new(head, Kind::Static);
                mid.statics.push(child);
                let mid = self.push(mid);
                self.nodes[at].statics[slot] = mid;
                at = mid;
            } else {
                at = child;
            }
            text = &text[common..];
        }
        at
    }

    fn insert_dynamic(
        &mut self,
        at: usize,
        kind: Kind,
        pattern: &Pattern,
    ) -> Result<usize, RouteError> {
        let is_param = matches!(kind, Kind::Param { .. });
        let existing = if is_param {
            self.nodes[at].param
        } else {
            self.nodes[at].catch_all
        };

        if let Some(child) = existing {
            let same = match (&self.nodes[child].kind, &kind) {
                (
                    Kind::Param { name, filter },
                    Kind::Param {
                        name: new_name,
                        filter: new_filter,
                    },
                ) => name == new_name && filter == new_filter,
                (
                    Kind::CatchAll { name, allow_empty },
                    Kind::CatchAll {
                        name: new_name,
                        allow_empty: new_allow_empty,
                    },
                ) => name == new_name && allow_empty == new_allow_empty,
                _ => false,
            };
            if !same {
                return Err(RouteError::Conflict {
                    pattern: pattern.source().to_string(),
                    existing: self.nodes[child].kind.describe(),
                });
            }
            return Ok(child);
        }

        let child = self.push(Node::new(String::new(), kind));
        if is_param {
            self.nodes[at].param = Some(child);
        } else {
            self.nodes[at].catch_all = Some(child);
        }
        Ok(child)
    }
}

/// Length in bytes of the longest common prefix, on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map_or(0, |((i, x), _)| i + x.len_utf8())
}

//! Inheritance oracle for pointer casts.
//!
//! Inheritance is modeled as embedding: a derived type holds its base as a
//! field, and the registered edge carries the byte offset of that field
//! (`core::mem::offset_of!`). The oracle is a process-wide directed graph —
//! nodes are type keys, edges point derived→base.
//!
//! Casting a pointer up the hierarchy adds the summed offsets along the
//! path; casting down subtracts them. Multi-level embedding is supported by
//! walking the graph, unlike value conversions which are strictly one hop.
//!
//! This oracle is consumed exclusively by the pointer path of
//! [`crate::Value::cast`]; value conversions never consult it.

use std::collections::VecDeque;
use std::sync::{LazyLock, RwLock};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

use crate::type_key::TypeKey;

#[derive(Default)]
struct InheritanceGraph {
    graph: DiGraph<TypeKey, isize>,
    nodes: FxHashMap<TypeKey, NodeIndex>,
}

impl InheritanceGraph {
    fn node(&mut self, key: TypeKey) -> NodeIndex {
        match self.nodes.get(&key) {
            Some(idx) => *idx,
            None => {
                let idx = self.graph.add_node(key);
                self.nodes.insert(key, idx);
                idx
            }
        }
    }

    /// Sum of edge offsets along the derived→base path `from` → `to`, or
    /// `None` when unreachable.
    fn path_offset(&self, from: TypeKey, to: TypeKey) -> Option<isize> {
        let start = *self.nodes.get(&from)?;
        let goal = *self.nodes.get(&to)?;

        let mut queue = VecDeque::new();
        let mut seen: FxHashMap<NodeIndex, isize> = FxHashMap::default();
        queue.push_back(start);
        seen.insert(start, 0);

        while let Some(node) = queue.pop_front() {
            let acc = seen[&node];
            if node == goal {
                return Some(acc);
            }
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let next = edge.target();
                if seen.contains_key(&next) {
                    continue;
                }
                seen.insert(next, acc + *edge.weight());
                queue.push_back(next);
            }
        }
        None
    }
}

static INHERITANCE: LazyLock<RwLock<InheritanceGraph>> =
    LazyLock::new(|| RwLock::new(InheritanceGraph::default()));

/// Record one direct derived→base edge with the embedding byte offset.
///
/// Registration is idempotent for an identical edge; re-registering with a
/// different offset keeps the first edge.
pub fn register_edge(derived: TypeKey, base: TypeKey, offset: isize) {
    if let Ok(mut inh) = INHERITANCE.write() {
        let d = inh.node(derived);
        let b = inh.node(base);
        let exists = inh.graph.edges(d).any(|e| e.target() == b);
        if !exists {
            inh.graph.add_edge(d, b, offset);
        }
    }
}

/// Byte offset for casting a `derived` pointer up to `base`, walking any
/// number of embedding levels. `None` when `base` is not an ancestor.
pub fn upcast_offset(derived: TypeKey, base: TypeKey) -> Option<isize> {
    let inh = INHERITANCE.read().ok()?;
    inh.path_offset(derived, base)
}

/// Byte offset for casting a `base` pointer down to `derived`.
///
/// The caller is responsible for the pointer actually addressing a
/// `derived` subject; the oracle only answers whether the relationship
/// exists and what adjustment it implies.
pub fn downcast_offset(base: TypeKey, derived: TypeKey) -> Option<isize> {
    let inh = INHERITANCE.read().ok()?;
    inh.path_offset(derived, base).map(|o| -o)
}

/// Check whether `base` is a (transitive) base of `derived`.
pub fn is_base_of(base: TypeKey, derived: TypeKey) -> bool {
    upcast_offset(derived, base).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> TypeKey {
        TypeKey::from_name(name)
    }

    #[test]
    fn direct_edge_offsets() {
        let d = key("inh_test::Derived");
        let b = key("inh_test::Base");
        register_edge(d, b, 8);

        assert_eq!(upcast_offset(d, b), Some(8));
        assert_eq!(downcast_offset(b, d), Some(-8));
        assert!(is_base_of(b, d));
        assert!(!is_base_of(d, b));
    }

    #[test]
    fn transitive_offsets_sum() {
        let c = key("inh_test::C");
        let m = key("inh_test::M");
        let r = key("inh_test::R");
        register_edge(c, m, 16);
        register_edge(m, r, 4);

        assert_eq!(upcast_offset(c, r), Some(20));
        assert_eq!(downcast_offset(r, c), Some(-20));
    }

    #[test]
    fn unrelated_types_have_no_route() {
        let a = key("inh_test::Lone");
        let b = key("inh_test::Stranger");
        assert_eq!(upcast_offset(a, b), None);
        assert_eq!(downcast_offset(a, b), None);
    }

    #[test]
    fn duplicate_edge_is_ignored() {
        let d = key("inh_test::Dup");
        let b = key("inh_test::DupBase");
        register_edge(d, b, 0);
        register_edge(d, b, 24);
        assert_eq!(upcast_offset(d, b), Some(0));
    }
}

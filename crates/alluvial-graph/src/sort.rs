//! Structural module ordering.
//!
//! Modules are placed in a trie over their paths, every trie node weighted by the
//! modules below it. Flattening visits heavier subtrees first, so modules sharing a
//! longer path prefix stay adjacent and sub-hierarchies line up across networks.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use alluvial_core::NodeId;

#[derive(Debug, Default)]
struct PathTrie {
    weight: f64,
    modules: Vec<(NodeId, f64)>,
    children: BTreeMap<u32, PathTrie>,
}

impl PathTrie {
    fn insert(&mut self, module: NodeId, segments: &[u32], weight: f64) {
        self.weight += weight;
        match segments.split_first() {
            None => self.modules.push((module, weight)),
            Some((head, rest)) => self
                .children
                .entry(*head)
                .or_default()
                .insert(module, rest, weight),
        }
    }

    fn flatten_into(&self, out: &mut Vec<NodeId>) {
        let mut modules = self.modules.clone();
        modules.sort_by(|a, b| by_weight_desc(a.1, b.1));
        out.extend(modules.into_iter().map(|(module, _)| module));

        let mut children: Vec<(&u32, &PathTrie)> = self.children.iter().collect();
        children.sort_by(|a, b| by_weight_desc(a.1.weight, b.1.weight).then(a.0.cmp(b.0)));
        for (_, child) in children {
            child.flatten_into(out);
        }
    }
}

fn by_weight_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Orders modules given `(module, path segments, weight)` entries.
pub(crate) fn structural_order(entries: &[(NodeId, Vec<u32>, f64)]) -> Vec<NodeId> {
    let mut trie = PathTrie::default();
    for (module, segments, weight) in entries {
        trie.insert(*module, segments, *weight);
    }
    let mut order = Vec::with_capacity(entries.len());
    trie.flatten_into(&mut order);
    order
}

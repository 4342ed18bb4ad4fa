use std::collections::BTreeMap;

use alluvial_core::errors::AlluvialError;
use alluvial_core::{Depth, NodeId, Side};

use crate::names::ModuleNames;
use crate::node::{
    GroupData, Layout, LeafData, ModuleData, NetworkData, NodeKind, NodeRecord, StreamlineData,
};

/// One step of a depth-first traversal.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    /// Node being visited.
    pub node: NodeId,
    /// Position of the node among the (filtered) siblings.
    pub index: usize,
    /// The (filtered) sibling list the node was taken from.
    pub siblings: &'a [NodeId],
}

/// Arena-backed alluvial diagram.
///
/// The diagram owns every node and the streamline registry. Handles returned by
/// its methods stay valid until the node is destroyed.
#[derive(Debug, Clone)]
pub struct Diagram {
    nodes: Vec<NodeRecord>,
    free: Vec<NodeId>,
    root: NodeId,
    pub(crate) streamlines_by_id: BTreeMap<String, NodeId>,
    pub(crate) module_names: ModuleNames,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! kind_accessors {
    ($($variant:ident => $data:ty, $get:ident, $get_mut:ident, $label:literal;)*) => {
        $(
            #[doc = concat!("Returns the ", $label, " payload of a node.")]
            pub fn $get(&self, id: NodeId) -> Result<&$data, AlluvialError> {
                match &self.record(id)?.kind {
                    NodeKind::$variant(data) => Ok(data),
                    other => Err(wrong_kind(id, $label, other.depth())),
                }
            }

            pub(crate) fn $get_mut(&mut self, id: NodeId) -> Result<&mut $data, AlluvialError> {
                match &mut self.record_mut(id)?.kind {
                    NodeKind::$variant(data) => Ok(data),
                    other => Err(wrong_kind(id, $label, other.depth())),
                }
            }
        )*
    };
}

impl Diagram {
    /// Creates an empty diagram holding only the root.
    pub fn new() -> Self {
        let root = NodeId::from_raw(0);
        Self {
            nodes: vec![NodeRecord::new("root", "", None, NodeKind::Root)],
            free: Vec::new(),
            root,
            streamlines_by_id: BTreeMap::new(),
            module_names: ModuleNames::default(),
        }
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn record(&self, id: NodeId) -> Result<&NodeRecord, AlluvialError> {
        self.nodes
            .get(id.index())
            .filter(|record| record.alive)
            .ok_or_else(|| unknown_node(id))
    }

    pub(crate) fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, AlluvialError> {
        self.nodes
            .get_mut(id.index())
            .filter(|record| record.alive)
            .ok_or_else(|| unknown_node(id))
    }

    pub(crate) fn alloc(&mut self, record: NodeRecord) -> Result<NodeId, AlluvialError> {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = record;
            return Ok(id);
        }
        let raw = u32::try_from(self.nodes.len()).map_err(|_| {
            AlluvialError::tree("arena-full", "node arena exhausted")
        })?;
        self.nodes.push(record);
        Ok(NodeId::from_raw(raw))
    }

    pub(crate) fn release(&mut self, id: NodeId) {
        if let Some(record) = self.nodes.get_mut(id.index()) {
            if record.alive && id != self.root {
                record.alive = false;
                record.children.clear();
                record.parent = None;
                self.free.push(id);
            }
        }
    }

    /// Whether the handle refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.record(id).is_ok()
    }

    /// Kind and payload of a node.
    pub fn kind(&self, id: NodeId) -> Result<&NodeKind, AlluvialError> {
        Ok(&self.record(id)?.kind)
    }

    /// Depth of a node.
    pub fn depth(&self, id: NodeId) -> Result<Depth, AlluvialError> {
        Ok(self.record(id)?.kind.depth())
    }

    /// Stable id string of a node.
    pub fn id_of(&self, id: NodeId) -> Result<&str, AlluvialError> {
        Ok(&self.record(id)?.id)
    }

    /// Network id a node belongs to (empty for the root).
    pub fn network_id_of(&self, id: NodeId) -> Result<&str, AlluvialError> {
        Ok(&self.record(id)?.network_id)
    }

    /// Aggregated flow of a node, or the input flow of a leaf.
    pub fn flow(&self, id: NodeId) -> Result<f64, AlluvialError> {
        Ok(self.record(id)?.flow)
    }

    /// Geometry from the most recent layout.
    pub fn layout(&self, id: NodeId) -> Result<Layout, AlluvialError> {
        Ok(self.record(id)?.layout)
    }

    /// Owning parent; leaves report their LEFT streamline, falling back to RIGHT.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, AlluvialError> {
        let record = self.record(id)?;
        Ok(match &record.kind {
            NodeKind::Leaf(leaf) => leaf.parent(Side::Left).or(leaf.parent(Side::Right)),
            _ => record.parent,
        })
    }

    /// Ordered children of a node; empty for leaves and stale handles.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.record(id)
            .map(|record| record.children.as_slice())
            .unwrap_or(&[])
    }

    kind_accessors! {
        Network => NetworkData, as_network, as_network_mut, "network";
        Module => ModuleData, as_module, as_module_mut, "module";
        HighlightGroup => GroupData, as_group, as_group_mut, "highlight group";
        Streamline => StreamlineData, as_streamline, as_streamline_mut, "streamline";
        Leaf => LeafData, as_leaf, as_leaf_mut, "leaf";
    }

    pub(crate) fn set_flow(&mut self, id: NodeId, flow: f64) -> Result<(), AlluvialError> {
        self.record_mut(id)?.flow = flow;
        Ok(())
    }

    pub(crate) fn set_layout(&mut self, id: NodeId, layout: Layout) -> Result<(), AlluvialError> {
        self.record_mut(id)?.layout = layout;
        Ok(())
    }

    pub(crate) fn set_id(&mut self, id: NodeId, value: String) -> Result<(), AlluvialError> {
        self.record_mut(id)?.id = value;
        Ok(())
    }

    /// Appends `child` to `parent` and records the back-reference for non-leaf kinds.
    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), AlluvialError> {
        self.record(child)?;
        self.record_mut(parent)?.children.push(child);
        let record = self.record_mut(child)?;
        if !matches!(record.kind, NodeKind::Leaf(_)) {
            record.parent = Some(parent);
        }
        Ok(())
    }

    /// Removes `child` from `parent` by swapping in the last sibling. Sibling order is
    /// not preserved.
    pub(crate) fn remove_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<bool, AlluvialError> {
        let children = &mut self.record_mut(parent)?.children;
        let Some(position) = children.iter().position(|c| *c == child) else {
            return Ok(false);
        };
        children.swap_remove(position);
        if let Ok(record) = self.record_mut(child) {
            if record.parent == Some(parent) {
                record.parent = None;
            }
        }
        Ok(true)
    }

    pub(crate) fn children_mut(&mut self, id: NodeId) -> Result<&mut Vec<NodeId>, AlluvialError> {
        Ok(&mut self.record_mut(id)?.children)
    }

    /// Whether a node holds nothing. A highlight group is empty when both of its
    /// branches are.
    pub fn is_empty(&self, id: NodeId) -> bool {
        match self.record(id) {
            Ok(record) => match &record.kind {
                NodeKind::HighlightGroup(group) => group
                    .branches
                    .iter()
                    .all(|branch| self.children(*branch).is_empty()),
                _ => record.children.is_empty(),
            },
            Err(_) => true,
        }
    }

    /// Number of distinct leaves below a node.
    pub fn num_leaf_nodes(&self, id: NodeId) -> usize {
        self.leaf_nodes(id).count()
    }

    /// Lazy sequence of the distinct leaves below a node.
    ///
    /// Highlight groups are descended through their LEFT branch only, so each leaf
    /// is yielded once even though it hangs from two streamlines.
    pub fn leaf_nodes(&self, id: NodeId) -> LeafNodes<'_> {
        LeafNodes {
            diagram: self,
            stack: vec![id],
        }
    }

    /// Walks up until a node of `depth` is found. Returns `None` once the walk passes
    /// above the requested depth.
    pub fn ancestor(&self, id: NodeId, depth: Depth) -> Option<NodeId> {
        let mut current = id;
        loop {
            let record = self.record(current).ok()?;
            let current_depth = record.kind.depth();
            if current_depth == depth {
                return Some(current);
            }
            if current_depth < depth {
                return None;
            }
            current = match &record.kind {
                NodeKind::Leaf(leaf) => leaf.parent(Side::Left).or(leaf.parent(Side::Right))?,
                _ => record.parent?,
            };
        }
    }

    /// Unconditional pre-order traversal of the descendants of `start`.
    pub fn for_each_pre_order<F>(&mut self, start: NodeId, mut callback: F)
    where
        F: FnMut(&mut Diagram, Visit<'_>),
    {
        self.walk(start, &always, &mut callback, true);
    }

    /// Unconditional post-order traversal of the descendants of `start`.
    pub fn for_each_post_order<F>(&mut self, start: NodeId, mut callback: F)
    where
        F: FnMut(&mut Diagram, Visit<'_>),
    {
        self.walk(start, &always, &mut callback, false);
    }

    /// Pre-order traversal that only enters children accepted by `predicate`. The
    /// filtered list is recomputed at every node, after the parent's callback ran.
    pub fn for_each_pre_order_while<P, F>(&mut self, start: NodeId, predicate: P, mut callback: F)
    where
        P: Fn(&Diagram, NodeId) -> bool,
        F: FnMut(&mut Diagram, Visit<'_>),
    {
        self.walk(start, &predicate, &mut callback, true);
    }

    /// Post-order traversal that only enters children accepted by `predicate`.
    pub fn for_each_post_order_while<P, F>(&mut self, start: NodeId, predicate: P, mut callback: F)
    where
        P: Fn(&Diagram, NodeId) -> bool,
        F: FnMut(&mut Diagram, Visit<'_>),
    {
        self.walk(start, &predicate, &mut callback, false);
    }

    fn walk<P, F>(&mut self, node: NodeId, predicate: &P, callback: &mut F, pre_order: bool)
    where
        P: Fn(&Diagram, NodeId) -> bool,
        F: FnMut(&mut Diagram, Visit<'_>),
    {
        let siblings: Vec<NodeId> = self
            .children(node)
            .iter()
            .copied()
            .filter(|child| predicate(self, *child))
            .collect();
        for (index, child) in siblings.iter().copied().enumerate() {
            let visit = Visit {
                node: child,
                index,
                siblings: &siblings,
            };
            if pre_order {
                callback(self, visit);
                self.walk(child, predicate, callback, pre_order);
            } else {
                self.walk(child, predicate, callback, pre_order);
                callback(self, visit);
            }
        }
    }

    /// Handles of every live node, root first.
    pub fn node_handles(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, record)| record.alive)
            .map(|(idx, _)| NodeId::from_raw(idx as u32))
    }
}

/// Iterator returned by [`Diagram::leaf_nodes`].
#[derive(Debug, Clone)]
pub struct LeafNodes<'a> {
    diagram: &'a Diagram,
    stack: Vec<NodeId>,
}

impl Iterator for LeafNodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let Ok(record) = self.diagram.record(id) else {
                continue;
            };
            match &record.kind {
                NodeKind::Leaf(_) => return Some(id),
                NodeKind::HighlightGroup(group) => self.stack.push(group.branch(Side::Left)),
                _ => self.stack.extend(record.children.iter().rev().copied()),
            }
        }
        None
    }
}

fn always(_: &Diagram, _: NodeId) -> bool {
    true
}

pub(crate) fn tree_error(code: &str, message: impl Into<String>) -> AlluvialError {
    AlluvialError::tree(code, message)
}

fn unknown_node(id: NodeId) -> AlluvialError {
    tree_error("unknown-node", "node does not exist").with_context("node", id.as_raw())
}

fn wrong_kind(id: NodeId, expected: &str, actual: Depth) -> AlluvialError {
    tree_error("wrong-kind", format!("node is not a {expected}"))
        .with_context("node", id.as_raw())
        .with_context("depth", actual.as_u8())
}

#[cfg(test)]
mod tests {
    use alluvial_core::TreePath;

    use super::*;
    use crate::{LeafInput, NetworkInput};

    fn diagram(networks: &[&str]) -> Diagram {
        let mut diagram = Diagram::new();
        for id in networks {
            let leaves = vec![
                LeafInput::new("x", "1:1", 0.5),
                LeafInput::new("y", "1:2", 0.25),
                LeafInput::new("z", "2:1", 0.25),
            ];
            diagram.add_network(NetworkInput::new(*id, leaves)).unwrap();
        }
        diagram.calc_flow().unwrap();
        diagram
    }

    fn module(diagram: &Diagram, network_id: &str, path: &str) -> NodeId {
        diagram
            .module(network_id, &TreePath::parse(path).unwrap())
            .unwrap()
    }

    #[test]
    fn pre_order_reports_position_among_siblings() {
        let mut diagram = diagram(&["A", "B"]);
        let networks = diagram.networks().to_vec();
        let mut visits = Vec::new();
        let mut leaf_visits = 0;
        let root = diagram.root();
        diagram.for_each_pre_order(root, |diagram, visit| {
            match diagram.depth(visit.node).unwrap() {
                Depth::Network => visits.push((visit.node, visit.index, visit.siblings.to_vec())),
                Depth::LeafNode => leaf_visits += 1,
                _ => {}
            }
        });
        assert_eq!(
            visits,
            vec![
                (networks[0], 0, networks.clone()),
                (networks[1], 1, networks.clone()),
            ]
        );
        // each leaf hangs from both branches of its group
        assert_eq!(leaf_visits, 12);
    }

    #[test]
    fn post_order_visits_children_before_parents() {
        let mut diagram = diagram(&["A"]);
        let network = diagram.network("A").unwrap();
        let mut order = Vec::new();
        diagram.for_each_post_order(network, |_, visit| order.push(visit.node));

        let position = |node: NodeId| order.iter().position(|n| *n == node).unwrap();
        for path in ["1", "2"] {
            let module = module(&diagram, "A", path);
            for group in diagram.children(module) {
                assert!(position(*group) < position(module));
            }
        }
        assert!(!order.contains(&network));
        assert_eq!(order.last(), diagram.children(network).last());
    }

    #[test]
    fn filtered_children_are_recomputed_after_the_parent_callback() {
        let mut diagram = diagram(&["A"]);
        let network = diagram.network("A").unwrap();
        let pruned = module(&diagram, "A", "2");
        let kept = module(&diagram, "A", "1");

        let mut modules = Vec::new();
        let root = diagram.root();
        diagram.for_each_pre_order_while(
            root,
            |diagram, node| diagram.flow(node).map(|flow| flow > 0.0).unwrap_or(false),
            |diagram, visit| {
                if visit.node == network {
                    diagram.set_flow(pruned, 0.0).unwrap();
                }
                if diagram.depth(visit.node).unwrap() == Depth::Module {
                    modules.push((visit.node, visit.index, visit.siblings.len()));
                }
            },
        );
        assert_eq!(modules, vec![(kept, 0, 1)]);
        assert!(diagram.children(network).contains(&pruned));
        assert!(diagram.contains(pruned));
    }

    #[test]
    fn ancestor_stops_once_above_the_requested_depth() {
        let diagram = diagram(&["A"]);
        let network = diagram.network("A").unwrap();
        let top = module(&diagram, "A", "1");
        let leaf = diagram.find_leaf("A", "x").unwrap();

        assert_eq!(diagram.ancestor(leaf, Depth::Module), Some(top));
        assert_eq!(diagram.ancestor(leaf, Depth::Network), Some(network));
        assert_eq!(diagram.ancestor(leaf, Depth::LeafNode), Some(leaf));
        assert_eq!(diagram.ancestor(network, Depth::Module), None);
        assert_eq!(diagram.ancestor(top, Depth::StreamlineNode), None);
        assert_eq!(diagram.ancestor(NodeId::from_raw(9_999), Depth::Root), None);
    }

    #[test]
    fn leaf_sequence_can_be_restarted() {
        let diagram = diagram(&["A"]);
        let network = diagram.network("A").unwrap();

        let first: Vec<NodeId> = diagram.leaf_nodes(network).collect();
        let second: Vec<NodeId> = diagram.leaf_nodes(network).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(diagram.num_leaf_nodes(network), 3);

        let mut partial = diagram.leaf_nodes(network);
        partial.next();
        let rest: Vec<NodeId> = partial.clone().collect();
        assert_eq!(partial.collect::<Vec<_>>(), rest);
        assert_eq!(rest, first[1..].to_vec());
    }

    #[test]
    fn remove_child_swaps_in_the_last_sibling() {
        let mut diagram = diagram(&["A", "B", "C"]);
        let root = diagram.root();
        let [a, b, c] = [0, 1, 2].map(|idx| diagram.networks()[idx]);

        assert!(diagram.remove_child(root, a).unwrap());
        assert_eq!(diagram.children(root), &[c, b]);
        assert!(!diagram.remove_child(root, a).unwrap());
        assert_eq!(diagram.parent(a).unwrap(), None);
    }
}

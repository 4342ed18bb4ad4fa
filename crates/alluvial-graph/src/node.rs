use std::collections::BTreeMap;

use alluvial_core::{Depth, NodeId, Side, StreamlineId, TreePath};
use serde::{Deserialize, Serialize};

/// Geometry assigned by the layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    /// Left edge.
    pub x: f64,
    /// Top edge in screen coordinates (grows downward).
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Layout {
    pub(crate) fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Pairing of two streamline nodes in adjacent networks.
///
/// `left` lives in the left-hand (earlier) network and hangs from a RIGHT branch;
/// `right` lives in the right-hand network and hangs from a LEFT branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamlineLink {
    /// Endpoint in the earlier network.
    pub left: NodeId,
    /// Endpoint in the later network.
    pub right: NodeId,
}

impl StreamlineLink {
    /// Orients a pair given the side of the first member.
    pub(crate) fn oriented(node: NodeId, side: Side, opposite: NodeId) -> Self {
        match side {
            Side::Left => Self {
                left: opposite,
                right: node,
            },
            Side::Right => Self {
                left: node,
                right: opposite,
            },
        }
    }

    /// Returns the member that is not `node`.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.left == node {
            self.right
        } else {
            self.left
        }
    }
}

/// Per-network state.
#[derive(Debug, Clone, Default)]
pub struct NetworkData {
    /// Display name of the partition.
    pub name: String,
    /// Codelength reported by the partitioning run.
    pub codelength: f64,
    /// Flow threshold used by the most recent layout.
    pub flow_threshold: f64,
    /// Set once the user reordered modules by hand; suppresses the automatic sort.
    pub custom_sorted: bool,
    /// Every leaf ingested for this network, attached or not.
    pub leaves: Vec<NodeId>,
    /// Lookup from leaf identifier to leaf handle.
    pub leaf_index: BTreeMap<String, NodeId>,
    /// Live modules keyed by module path.
    pub modules: BTreeMap<String, NodeId>,
}

/// Module state.
#[derive(Debug, Clone)]
pub struct ModuleData {
    /// Module path at the resolved level.
    pub path: TreePath,
    /// Number of resolved path segments.
    pub module_level: usize,
    /// Gap below the next module, assigned by layout.
    pub margin: f64,
}

/// Highlight group state.
#[derive(Debug, Clone)]
pub struct GroupData {
    /// User highlight category.
    pub highlight_index: i32,
    /// Whether the group holds insignificant leaves.
    pub insignificant: bool,
    /// LEFT and RIGHT branch handles, indexed by [`Side::index`].
    pub branches: [NodeId; 2],
}

impl GroupData {
    /// Branch for one side.
    pub fn branch(&self, side: Side) -> NodeId {
        self.branches[side.index()]
    }
}

/// Branch state.
#[derive(Debug, Clone)]
pub struct BranchData {
    /// Direction of the branch.
    pub side: Side,
}

/// Streamline state.
#[derive(Debug, Clone)]
pub struct StreamlineData {
    /// Side of the branch the streamline hangs from.
    pub side: Side,
    /// Structured identity; the node id string is its encoding.
    pub streamline_id: StreamlineId,
    /// Link to the mirrored streamline, when not dangling.
    pub link: Option<StreamlineLink>,
}

/// Leaf state.
#[derive(Debug, Clone)]
pub struct LeafData {
    /// Display name.
    pub name: String,
    /// Identity used to match the same item across networks.
    pub identifier: String,
    /// Numeric id carried over from the input.
    pub node_id: u64,
    /// User highlight category.
    pub highlight_index: i32,
    /// Number of path segments resolved into the leaf's module.
    pub module_level: usize,
    /// Full path of the leaf in its partition.
    pub tree_path: TreePath,
    /// Owning network.
    pub network: NodeId,
    pub(crate) parents: [Option<NodeId>; 2],
    pub(crate) opposites: [Option<NodeId>; 2],
}

impl LeafData {
    /// Depth of the leaf in its partition tree.
    pub fn level(&self) -> usize {
        self.tree_path.level()
    }

    /// Whether the leaf's module is insignificant at the current module level.
    pub fn insignificant(&self) -> bool {
        self.tree_path.is_insignificant_at(self.module_level)
    }

    /// Path of the module the leaf belongs to at its current module level.
    pub fn module_path(&self) -> TreePath {
        self.tree_path.ancestor_at_level(self.module_level)
    }

    /// Parent streamline on one side.
    pub fn parent(&self, side: Side) -> Option<NodeId> {
        self.parents[side.index()]
    }

    /// Matching leaf in the neighbouring network on one side.
    pub fn opposite(&self, side: Side) -> Option<NodeId> {
        self.opposites[side.index()]
    }

    /// Whether the leaf currently hangs in the tree.
    pub fn is_attached(&self) -> bool {
        self.parents.iter().any(Option::is_some)
    }
}

/// Closed set of node kinds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Diagram root.
    Root,
    /// Network node.
    Network(NetworkData),
    /// Module node.
    Module(ModuleData),
    /// Highlight group node.
    HighlightGroup(GroupData),
    /// Branch node.
    Branch(BranchData),
    /// Streamline node.
    Streamline(StreamlineData),
    /// Leaf node.
    Leaf(LeafData),
}

impl NodeKind {
    /// Fixed depth of the kind.
    pub fn depth(&self) -> Depth {
        match self {
            NodeKind::Root => Depth::Root,
            NodeKind::Network(_) => Depth::Network,
            NodeKind::Module(_) => Depth::Module,
            NodeKind::HighlightGroup(_) => Depth::HighlightGroup,
            NodeKind::Branch(_) => Depth::Branch,
            NodeKind::Streamline(_) => Depth::StreamlineNode,
            NodeKind::Leaf(_) => Depth::LeafNode,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeRecord {
    pub(crate) alive: bool,
    pub(crate) id: String,
    pub(crate) network_id: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) flow: f64,
    pub(crate) layout: Layout,
    pub(crate) kind: NodeKind,
}

impl NodeRecord {
    pub(crate) fn new(
        id: impl Into<String>,
        network_id: impl Into<String>,
        parent: Option<NodeId>,
        kind: NodeKind,
    ) -> Self {
        Self {
            alive: true,
            id: id.into(),
            network_id: network_id.into(),
            parent,
            children: Vec::new(),
            flow: 0.0,
            layout: Layout::default(),
            kind,
        }
    }
}

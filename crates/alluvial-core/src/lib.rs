#![deny(missing_docs)]
#![doc = "Core identifiers, module paths and error types shared by the alluvial diagram crates."]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod path;
pub mod streamline;

pub use errors::{AlluvialError, ErrorInfo};
pub use path::{difference_index, PathError, TreePath};
pub use streamline::{endpoint_key, StreamlineId, LINK_SEPARATOR};

/// Highlight index assigned to leaves that carry no user highlight.
pub const NOT_HIGHLIGHTED: i32 = -1;

/// Handle for a node stored in a diagram arena.
///
/// Handles are plain indices. They do not own the node and become invalid once the
/// node is destroyed; lookups through the owning diagram report stale handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new handle from its raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index of the handle.
    pub fn as_raw(&self) -> u32 {
        self.0
    }

    /// Returns the handle as an arena slot index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fixed depth of each node kind in the diagram hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Depth {
    /// The diagram root.
    Root = 0,
    /// One partitioned network.
    Network = 1,
    /// A module of a network partition.
    Module = 2,
    /// Highlight/significance subdivision of a module.
    HighlightGroup = 3,
    /// One side of a highlight group.
    Branch = 4,
    /// Bundle of leaves flowing toward the same neighbouring module.
    StreamlineNode = 5,
    /// A single tracked item.
    LeafNode = 6,
}

impl Depth {
    /// Returns the numeric depth used by the render tree.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Direction of a branch: toward the previous or the next network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Toward the previous network.
    Left,
    /// Toward the next network.
    Right,
}

impl Side {
    /// Both sides in canonical order.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Returns the other side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Returns the slot index used for per-side arrays.
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    /// Returns the lowercase label used in identities and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#![deny(missing_docs)]

//! Incremental multi-network alluvial diagram engine built on the `alluvial-core`
//! identifiers.
//!
//! A [`Diagram`] owns an arena of nodes arranged as
//! root → network → module → highlight group → branch → streamline → leaf, plus the
//! registry of streamline identities. Networks are ingested with
//! [`Diagram::add_network`]; structural edits re-insert only the leaves they touch;
//! [`Diagram::calc_flow`] and [`Diagram::update_layout`] derive flows and geometry.

mod config;
mod flow;
mod hash;
mod invariants;
mod layout;
mod linking;
mod membership;
mod module;
mod names;
mod network;
mod node;
mod serialization;
mod sort;
mod tree;

pub use config::{LayoutConfig, ModuleSize, VerticalAlign};
pub use hash::canonical_hash;
pub use invariants::{InvariantRule, InvariantViolation};
pub use module::MutationOutcome;
pub use names::ModuleNames;
pub use network::NetworkStatistics;
pub use node::{
    BranchData, GroupData, Layout, LeafData, ModuleData, NetworkData, NodeKind, StreamlineData,
    StreamlineLink,
};
pub use tree::{Diagram, LeafNodes, Visit};

/// Re-export serialization helpers for downstream crates.
pub use serialization::{
    diagram_to_json, networks_from_json, GroupDetail, LeafDetail, LeafInput, ModuleDetail,
    NetworkDetail, NetworkInput, NodeObject, StreamlineDetail,
};

//! Structural self-check of a quiescent diagram.

use std::collections::BTreeMap;

use alluvial_core::{Depth, NodeId, Side};
use serde::Serialize;
use thiserror::Error;

use crate::node::NodeKind;
use crate::tree::Diagram;

const FLOW_TOLERANCE: f64 = 1e-9;

/// Rule broken by an [`InvariantViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvariantRule {
    /// A node's flow differs from the sum of its children.
    FlowConservation,
    /// A highlight group's LEFT branch does not carry the flow of its leaves.
    GroupLeftBranchFlow,
    /// A registry key does not match the node it points to, or a node is missing.
    Registry,
    /// A streamline link is not mirrored by its partner.
    LinkSymmetry,
    /// A module, group or streamline exists with nothing in it.
    EmptyNode,
    /// An attached leaf lacks a parent on one side or spans two groups.
    LeafParents,
}

/// One failed structural check.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{rule:?} at {}: {detail}", .node.map(|n| n.to_string()).unwrap_or_default())]
pub struct InvariantViolation {
    /// Broken rule.
    pub rule: InvariantRule,
    /// Offending node, when one can be named.
    pub node: Option<NodeId>,
    /// Human readable description.
    pub detail: String,
}

impl Diagram {
    /// Checks the structural invariants. Flow rules assume a preceding
    /// [`Diagram::calc_flow`].
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let mut report = |rule: InvariantRule, node: Option<NodeId>, detail: String| {
            violations.push(InvariantViolation { rule, node, detail })
        };

        let mut streamline_nodes = BTreeMap::new();
        for node in self.node_handles() {
            let Ok(record) = self.record(node) else {
                continue;
            };
            match &record.kind {
                NodeKind::Leaf(leaf) => {
                    self.check_leaf(node, leaf.parent(Side::Left), leaf.parent(Side::Right), &mut report);
                    continue;
                }
                NodeKind::HighlightGroup(group) => {
                    if self.is_empty(node) {
                        report(InvariantRule::EmptyNode, Some(node), "empty highlight group".into());
                    }
                    let left = self.flow(group.branch(Side::Left)).unwrap_or(f64::NAN);
                    let right = self.flow(group.branch(Side::Right)).unwrap_or(f64::NAN);
                    let leaves: f64 = self
                        .leaf_nodes(node)
                        .map(|leaf| self.flow(leaf).unwrap_or(0.0))
                        .sum();
                    if !close(left, leaves) || !close(right, leaves) {
                        report(
                            InvariantRule::GroupLeftBranchFlow,
                            Some(node),
                            format!("branches carry {left}/{right}, leaves carry {leaves}"),
                        );
                    }
                    if !close(record.flow, left) {
                        report(
                            InvariantRule::FlowConservation,
                            Some(node),
                            format!("group flow {} differs from LEFT branch flow {left}", record.flow),
                        );
                    }
                    continue;
                }
                NodeKind::Module(_) if record.children.is_empty() => {
                    report(InvariantRule::EmptyNode, Some(node), "empty module".into());
                }
                NodeKind::Streamline(data) => {
                    streamline_nodes.insert(node, record.id.clone());
                    if record.children.is_empty() {
                        report(InvariantRule::EmptyNode, Some(node), "empty streamline".into());
                    }
                    if let Some(link) = data.link {
                        let partner = link.other(node);
                        let mirrored = self
                            .as_streamline(partner)
                            .map(|p| p.link == Some(link))
                            .unwrap_or(false);
                        let oriented = (link.left == node) == (data.side == Side::Right);
                        if !mirrored || !oriented {
                            report(
                                InvariantRule::LinkSymmetry,
                                Some(node),
                                format!("link to {partner} is not mirrored"),
                            );
                        }
                    }
                }
                _ => {}
            }
            let children: f64 = record
                .children
                .iter()
                .map(|child| self.flow(*child).unwrap_or(0.0))
                .sum();
            if !close(record.flow, children) {
                report(
                    InvariantRule::FlowConservation,
                    Some(node),
                    format!("flow {} differs from children sum {children}", record.flow),
                );
            }
        }

        let mut registered = BTreeMap::new();
        for (key, node) in self.streamline_ids() {
            match streamline_nodes.get(&node) {
                Some(id) if id == key => {}
                Some(id) => report(
                    InvariantRule::Registry,
                    Some(node),
                    format!("registered as {key} but carries id {id}"),
                ),
                None => report(
                    InvariantRule::Registry,
                    Some(node),
                    format!("{key} points to a node that is not a live streamline"),
                ),
            }
            if let Some(previous) = registered.insert(node, key) {
                report(
                    InvariantRule::Registry,
                    Some(node),
                    format!("registered under both {previous} and {key}"),
                );
            }
        }
        for (node, id) in &streamline_nodes {
            if !registered.contains_key(node) {
                report(
                    InvariantRule::Registry,
                    Some(*node),
                    format!("streamline {id} is missing from the registry"),
                );
            }
        }
        violations
    }

    fn check_leaf<F>(&self, leaf: NodeId, left: Option<NodeId>, right: Option<NodeId>, report: &mut F)
    where
        F: FnMut(InvariantRule, Option<NodeId>, String),
    {
        let group_of = |streamline: NodeId| self.ancestor(streamline, Depth::HighlightGroup);
        match (left, right) {
            (None, None) => {}
            (Some(left), Some(right)) => {
                if group_of(left) != group_of(right) {
                    report(
                        InvariantRule::LeafParents,
                        Some(leaf),
                        "LEFT and RIGHT parents sit in different groups".into(),
                    );
                }
                for streamline in [left, right] {
                    if !self.children(streamline).contains(&leaf) {
                        report(
                            InvariantRule::LeafParents,
                            Some(leaf),
                            format!("parent {streamline} does not list the leaf"),
                        );
                    }
                }
            }
            _ => report(
                InvariantRule::LeafParents,
                Some(leaf),
                "leaf is attached on one side only".into(),
            ),
        }
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOW_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

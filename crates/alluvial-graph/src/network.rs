use std::collections::{BTreeMap, BTreeSet};

use alluvial_core::errors::AlluvialError;
use alluvial_core::{NodeId, Side, TreePath, NOT_HIGHLIGHTED};
use serde::Serialize;
use tracing::{debug, info_span, warn};

use crate::module::MutationOutcome;
use crate::node::{LeafData, NetworkData, NodeKind, NodeRecord};
use crate::serialization::NetworkInput;
use crate::tree::Diagram;

/// Summary of one network's partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatistics {
    /// Network id.
    pub id: String,
    /// Number of ingested leaves.
    pub num_leaf_nodes: usize,
    /// Number of distinct top-level modules.
    pub num_top_modules: usize,
    /// Deepest leaf level.
    pub num_levels: usize,
    /// Summed leaf flow per top-level module.
    pub flow_distribution: BTreeMap<u32, f64>,
}

struct PreparedLeaf {
    record_id: String,
    data: LeafData,
    flow: f64,
}

impl Diagram {
    /// Network handles in display order.
    pub fn networks(&self) -> &[NodeId] {
        self.children(self.root())
    }

    /// Network with the given id.
    pub fn network(&self, network_id: &str) -> Option<NodeId> {
        self.networks()
            .iter()
            .copied()
            .find(|network| self.id_of(*network).map(|id| id == network_id).unwrap_or(false))
    }

    /// Leaf of a network by identifier.
    pub fn find_leaf(&self, network_id: &str, identifier: &str) -> Option<NodeId> {
        let network = self.network(network_id)?;
        self.as_network(network)
            .ok()?
            .leaf_index
            .get(identifier)
            .copied()
    }

    /// Neighbouring network toward `side`.
    pub fn neighbor_network(&self, network: NodeId, side: Side) -> Option<NodeId> {
        let networks = self.networks();
        let index = networks.iter().position(|n| *n == network)?;
        match side {
            Side::Left => index.checked_sub(1).map(|i| networks[i]),
            Side::Right => networks.get(index + 1).copied(),
        }
    }

    /// Ingests one partitioned network after the existing ones.
    ///
    /// Fails without touching the tree when the id is taken or a leaf is invalid.
    pub fn add_network(&mut self, input: NetworkInput) -> Result<NodeId, AlluvialError> {
        let _span = info_span!("add_network", network = %input.id).entered();
        if self.network(&input.id).is_some() {
            return Err(network_error(
                "duplicate-network",
                format!("network with id {} already exists", input.id),
            )
            .with_context("network", &input.id));
        }
        let prepared = prepare_leaves(&input)?;
        let mut names = Vec::with_capacity(input.module_names.len());
        for (path, name) in &input.module_names {
            let path = TreePath::parse(path)
                .map_err(|err| AlluvialError::from(err).with_context("network", &input.id))?;
            names.push((path, name.clone()));
        }

        let root = self.root();
        let data = NetworkData {
            name: input.name.clone(),
            codelength: input.codelength,
            ..NetworkData::default()
        };
        let network = self.alloc(NodeRecord::new(
            input.id.clone(),
            input.id.clone(),
            Some(root),
            NodeKind::Network(data),
        ))?;
        self.add_child(root, network)?;
        for (path, name) in &names {
            self.module_names.set(&input.id, path, name, 0.0);
        }

        let mut leaves = Vec::with_capacity(prepared.len());
        for PreparedLeaf {
            record_id,
            mut data,
            flow,
        } in prepared
        {
            data.network = network;
            let identifier = data.identifier.clone();
            let mut record = NodeRecord::new(record_id, input.id.clone(), None, NodeKind::Leaf(data));
            record.flow = flow;
            let leaf = self.alloc(record)?;
            let network_data = self.as_network_mut(network)?;
            network_data.leaves.push(leaf);
            if network_data.leaf_index.contains_key(&identifier) {
                warn!(identifier = %identifier, "duplicate leaf identifier; only the first is linked");
            } else {
                network_data.leaf_index.insert(identifier, leaf);
            }
            leaves.push(leaf);
        }
        for leaf in &leaves {
            self.add_leaf(*leaf)?;
        }
        debug!(
            leaves = leaves.len(),
            modules = self.children(network).len(),
            streamlines = self.num_streamlines(),
            "network added"
        );
        Ok(network)
    }

    /// Removes a network and every node below it.
    ///
    /// Neighbouring leaves keep their streamlines, which turn dangling; the former
    /// neighbours are not linked to each other (see [`Diagram::relink_networks`]).
    pub fn remove_network(&mut self, network_id: &str) -> Result<(), AlluvialError> {
        let _span = info_span!("remove_network", network = %network_id).entered();
        let network = self.network(network_id).ok_or_else(|| {
            network_error(
                "unknown-network",
                format!("network with id {network_id} does not exist"),
            )
            .with_context("network", network_id)
        })?;
        let leaves = self.as_network(network)?.leaves.clone();
        for leaf in &leaves {
            if self.as_leaf(*leaf)?.is_attached() {
                self.remove_leaf(*leaf, false)?;
            }
        }
        self.release_network(network)?;
        debug!(leaves = leaves.len(), streamlines = self.num_streamlines(), "network removed");
        Ok(())
    }

    /// Swaps a network with its neighbour toward `direction` and relinks the
    /// networks whose neighbours changed.
    pub fn move_network(
        &mut self,
        network_id: &str,
        direction: Side,
    ) -> Result<MutationOutcome, AlluvialError> {
        let network = self.network(network_id).ok_or_else(|| {
            network_error("unknown-network", "network does not exist")
                .with_context("network", network_id)
        })?;
        let networks = self.networks().to_vec();
        let index = networks
            .iter()
            .position(|n| *n == network)
            .unwrap_or_default();
        let target = match direction {
            Side::Left => index.checked_sub(1),
            Side::Right => (index + 1 < networks.len()).then_some(index + 1),
        };
        let Some(target) = target else {
            warn!(network = %network_id, direction = %direction, "network is already at the end");
            return Ok(MutationOutcome::unchanged());
        };
        let root = self.root();
        self.children_mut(root)?.swap(index, target);

        let low = index.min(target).saturating_sub(1);
        let high = (index.max(target) + 1).min(networks.len() - 1);
        let window: Vec<String> = self.networks()[low..=high]
            .iter()
            .map(|n| self.id_of(*n).map(str::to_string))
            .collect::<Result<_, _>>()?;
        let ids: Vec<&str> = window.iter().map(String::as_str).collect();
        let updated = self.relink_networks(&ids)?;
        Ok(MutationOutcome {
            changed: true,
            leaves_updated: updated,
        })
    }

    /// Drops the cached opposites of every leaf in the given networks and re-inserts
    /// each attached leaf, so linkage reflects the current network order.
    pub fn relink_networks(&mut self, network_ids: &[&str]) -> Result<usize, AlluvialError> {
        let mut networks = Vec::with_capacity(network_ids.len());
        for id in network_ids {
            let network = self.network(id).ok_or_else(|| {
                network_error("unknown-network", "network does not exist").with_context("network", id)
            })?;
            networks.push(network);
        }
        let mut leaves = Vec::new();
        for network in &networks {
            leaves.extend(self.as_network(*network)?.leaves.iter().copied());
        }
        for leaf in &leaves {
            self.clear_opposites(*leaf)?;
        }
        let mut updated = 0;
        for leaf in &leaves {
            if self.as_leaf(*leaf)?.is_attached() {
                self.update_leaf(*leaf)?;
                updated += 1;
            }
        }
        debug!(networks = networks.len(), leaves = updated, "relinked networks");
        Ok(updated)
    }

    /// Partition summary of a network.
    pub fn network_statistics(&self, network: NodeId) -> Result<NetworkStatistics, AlluvialError> {
        let data = self.as_network(network)?;
        let mut top_modules = BTreeSet::new();
        let mut flow_distribution = BTreeMap::new();
        let mut num_levels = 0;
        for leaf in &data.leaves {
            let leaf_data = self.as_leaf(*leaf)?;
            num_levels = num_levels.max(leaf_data.level());
            if let Some(top) = leaf_data.tree_path.segments().first() {
                top_modules.insert(*top);
                *flow_distribution.entry(*top).or_insert(0.0) += self.flow(*leaf)?;
            }
        }
        Ok(NetworkStatistics {
            id: self.id_of(network)?.to_string(),
            num_leaf_nodes: data.leaves.len(),
            num_top_modules: top_modules.len(),
            num_levels,
            flow_distribution,
        })
    }

    fn clear_opposites(&mut self, leaf: NodeId) -> Result<(), AlluvialError> {
        let opposites = self.as_leaf(leaf)?.opposites;
        for side in Side::BOTH {
            if let Some(opposite) = opposites[side.index()] {
                if let Ok(data) = self.as_leaf_mut(opposite) {
                    let back = &mut data.opposites[side.opposite().index()];
                    if *back == Some(leaf) {
                        *back = None;
                    }
                }
            }
        }
        self.as_leaf_mut(leaf)?.opposites = [None, None];
        Ok(())
    }

    /// Destroys a network whose leaves are all detached.
    pub(crate) fn release_network(&mut self, network: NodeId) -> Result<(), AlluvialError> {
        let leaves = self.as_network(network)?.leaves.clone();
        for leaf in &leaves {
            self.clear_opposites(*leaf)?;
        }
        let mut stale = BTreeSet::new();
        let mut stack = self.children(network).to_vec();
        while let Some(node) = stack.pop() {
            if let Ok(NodeKind::Leaf(_)) = self.kind(node) {
                continue;
            }
            stack.extend(self.children(node).iter().copied());
            stale.insert(node);
        }
        self.streamlines_by_id.retain(|_, node| !stale.contains(node));
        for node in stale.into_iter().chain(leaves) {
            self.release(node);
        }
        let root = self.root();
        self.children_mut(root)?.retain(|n| *n != network);
        self.release(network);
        Ok(())
    }
}

fn prepare_leaves(input: &NetworkInput) -> Result<Vec<PreparedLeaf>, AlluvialError> {
    let mut prepared = Vec::with_capacity(input.nodes.len());
    for (index, node) in input.nodes.iter().enumerate() {
        let tree_path = TreePath::parse(&node.path).map_err(|err| {
            AlluvialError::from(err)
                .with_context("network", &input.id)
                .with_context("leaf", index)
        })?;
        if !node.flow.is_finite() || node.flow < 0.0 {
            return Err(network_error("invalid-leaf", "leaf flow must be finite and non-negative")
                .with_context("network", &input.id)
                .with_context("leaf", index)
                .with_context("flow", node.flow));
        }
        let identifier = if node.identifier.is_empty() {
            node.name.clone()
        } else {
            node.identifier.clone()
        };
        if identifier.is_empty() {
            return Err(network_error("invalid-leaf", "leaf needs an identifier or a name")
                .with_context("network", &input.id)
                .with_context("leaf", index));
        }
        let max_level = tree_path.level().saturating_sub(1).max(1);
        let module_level = node.module_level.unwrap_or(1).clamp(1, max_level);
        let data = LeafData {
            name: node.name.clone(),
            identifier,
            node_id: node.node_id.unwrap_or_default(),
            highlight_index: node.highlight_index.unwrap_or(NOT_HIGHLIGHTED),
            module_level,
            tree_path: tree_path.clone(),
            network: NodeId::from_raw(0),
            parents: [None, None],
            opposites: [None, None],
        };
        prepared.push(PreparedLeaf {
            record_id: tree_path.to_string(),
            data,
            flow: node.flow,
        });
    }
    Ok(prepared)
}

fn network_error(code: &str, message: impl Into<String>) -> AlluvialError {
    AlluvialError::network(code, message)
}

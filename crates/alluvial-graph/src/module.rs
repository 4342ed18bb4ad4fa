//! Module queries and structural edits: expand, regroup and manual reordering.

use std::cmp::Ordering;

use alluvial_core::errors::AlluvialError;
use alluvial_core::{NodeId, TreePath};
use serde::Serialize;
use tracing::{debug, warn};

use crate::tree::{tree_error, Diagram};

/// Result of a structural edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    /// Whether the tree changed.
    pub changed: bool,
    /// Number of leaves that were re-inserted.
    pub leaves_updated: usize,
}

impl MutationOutcome {
    /// Outcome of a refused edit.
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub(crate) fn updated(leaves_updated: usize) -> Self {
        Self {
            changed: leaves_updated > 0,
            leaves_updated,
        }
    }

    pub(crate) fn reordered() -> Self {
        Self {
            changed: true,
            leaves_updated: 0,
        }
    }
}

impl Diagram {
    /// Module at a path in a network.
    pub fn module(&self, network_id: &str, path: &TreePath) -> Option<NodeId> {
        let network = self.network(network_id)?;
        self.as_network(network)
            .ok()?
            .modules
            .get(&path.path_string())
            .copied()
    }

    /// Module at a position in its network's current child order.
    pub fn module_at(&self, network: NodeId, index: usize) -> Option<NodeId> {
        self.as_network(network).ok()?;
        self.children(network).get(index).copied()
    }

    /// Whether some leaf of the module sits deeper than one level below it.
    pub fn has_submodules(&self, module: NodeId) -> Result<bool, AlluvialError> {
        let module_level = self.as_module(module)?.module_level;
        Ok(self.leaf_nodes(module).any(|leaf| {
            self.as_leaf(leaf)
                .map(|data| data.level().saturating_sub(1) > module_level)
                .unwrap_or(false)
        }))
    }

    /// Whether the module reaches the flow threshold of its last layout.
    pub fn is_visible(&self, module: NodeId) -> Result<bool, AlluvialError> {
        self.as_module(module)?;
        let flow = self.flow(module)?;
        let threshold = match self.parent(module)? {
            Some(network) => self.as_network(network)?.flow_threshold,
            None => 0.0,
        };
        Ok(module_visible(flow, threshold))
    }

    /// Names of the `limit` highest-flow leaves of a module, highest first.
    pub fn largest_leaf_names(
        &self,
        module: NodeId,
        limit: usize,
    ) -> Result<Vec<String>, AlluvialError> {
        self.as_module(module)?;
        let mut leaves: Vec<(f64, &str)> = self
            .leaf_nodes(module)
            .filter_map(|leaf| {
                let flow = self.flow(leaf).ok()?;
                let data = self.as_leaf(leaf).ok()?;
                Some((flow, data.name.as_str()))
            })
            .collect();
        leaves.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        Ok(leaves
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect())
    }

    /// Splits a module into its submodules one level down.
    ///
    /// Refused when the module has no leaves or when some leaf has nothing below
    /// the next level.
    pub fn expand(&mut self, module: NodeId) -> Result<MutationOutcome, AlluvialError> {
        let module_level = self.as_module(module)?.module_level;
        let leaves: Vec<NodeId> = self.leaf_nodes(module).collect();
        if leaves.is_empty() {
            warn!(module = %self.id_of(module)?, "no leaf nodes found");
            return Ok(MutationOutcome::unchanged());
        }
        let new_level = module_level + 1;
        let exhausted = leaves.iter().any(|leaf| {
            self.as_leaf(*leaf)
                .map(|data| data.level() <= new_level)
                .unwrap_or(true)
        });
        if exhausted {
            warn!(
                module = %self.id_of(module)?,
                level = new_level,
                "module can't be expanded because some leaves are at the current level"
            );
            return Ok(MutationOutcome::unchanged());
        }
        let network = self.owning_network(module)?;
        self.as_network_mut(network)?.custom_sorted = false;
        self.set_module_level(&leaves, new_level)?;
        debug!(leaves = leaves.len(), level = new_level, "expanded module");
        Ok(MutationOutcome::updated(leaves.len()))
    }

    /// Merges a module and every sibling under the same parent path back into one
    /// module a level up.
    pub fn regroup(&mut self, module: NodeId) -> Result<MutationOutcome, AlluvialError> {
        let (module_level, path) = {
            let data = self.as_module(module)?;
            (data.module_level, data.path.clone())
        };
        if module_level <= 1 {
            warn!(module = %self.id_of(module)?, level = module_level, "module is already at the top level");
            return Ok(MutationOutcome::unchanged());
        }
        let network = self.owning_network(module)?;
        let parent_path = path.ancestor_at_level(module_level - 1);
        let siblings: Vec<NodeId> = self
            .children(network)
            .iter()
            .copied()
            .filter(|sibling| {
                self.as_module(*sibling)
                    .map(|data| parent_path.is_ancestor_of(&data.path))
                    .unwrap_or(false)
            })
            .collect();
        let leaves: Vec<NodeId> = siblings
            .iter()
            .flat_map(|sibling| self.leaf_nodes(*sibling))
            .collect();
        if leaves.is_empty() {
            warn!(module = %self.id_of(module)?, "no leaf nodes found");
            return Ok(MutationOutcome::unchanged());
        }
        self.as_network_mut(network)?.custom_sorted = false;
        self.set_module_level(&leaves, module_level - 1)?;
        debug!(
            modules = siblings.len(),
            leaves = leaves.len(),
            level = module_level - 1,
            "regrouped modules"
        );
        Ok(MutationOutcome::updated(leaves.len()))
    }

    /// Swaps a module with the one after it; later modules are drawn higher.
    pub fn move_up(&mut self, module: NodeId) -> Result<MutationOutcome, AlluvialError> {
        self.swap_module(module, Ordering::Greater)
    }

    /// Swaps a module with the one before it.
    pub fn move_down(&mut self, module: NodeId) -> Result<MutationOutcome, AlluvialError> {
        self.swap_module(module, Ordering::Less)
    }

    fn swap_module(
        &mut self,
        module: NodeId,
        direction: Ordering,
    ) -> Result<MutationOutcome, AlluvialError> {
        self.as_module(module)?;
        let network = self.owning_network(module)?;
        let siblings = self.children(network);
        let index = siblings
            .iter()
            .position(|sibling| *sibling == module)
            .ok_or_else(|| tree_error("unknown-node", "module is not a child of its network"))?;
        let target = match direction {
            Ordering::Greater if index + 1 < siblings.len() => index + 1,
            Ordering::Less if index > 0 => index - 1,
            Ordering::Greater => {
                warn!("can't move module up because it is already at the top");
                return Ok(MutationOutcome::unchanged());
            }
            _ => {
                warn!("can't move module down because it is already at the bottom");
                return Ok(MutationOutcome::unchanged());
            }
        };
        self.as_network_mut(network)?.custom_sorted = true;
        self.children_mut(network)?.swap(index, target);
        Ok(MutationOutcome::reordered())
    }

    fn set_module_level(&mut self, leaves: &[NodeId], level: usize) -> Result<(), AlluvialError> {
        for leaf in leaves {
            self.as_leaf_mut(*leaf)?.module_level = level;
            self.update_leaf(*leaf)?;
        }
        Ok(())
    }

    fn owning_network(&self, module: NodeId) -> Result<NodeId, AlluvialError> {
        self.parent(module)?
            .ok_or_else(|| tree_error("unknown-node", "module has no network").with_context("node", module.as_raw()))
    }
}

pub(crate) fn module_visible(flow: f64, threshold: f64) -> bool {
    flow >= threshold && flow > 0.0
}

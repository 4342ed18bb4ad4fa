use alluvial_core::errors::AlluvialError;
use alluvial_core::{endpoint_key, Depth, NodeId, Side, StreamlineId, TreePath};
use tracing::{trace, warn};

use crate::module::MutationOutcome;
use crate::node::{BranchData, GroupData, ModuleData, NodeKind, NodeRecord};
use crate::tree::{tree_error, Diagram};

impl Diagram {
    /// Inserts a leaf into the tree, creating its module and highlight group on
    /// demand and linking it to the matching leaves in both neighbouring networks.
    pub fn add_leaf(&mut self, leaf: NodeId) -> Result<(), AlluvialError> {
        let (network, module_path, module_level, highlight_index, insignificant) = {
            let data = self.as_leaf(leaf)?;
            if data.is_attached() {
                warn!(leaf = %self.id_of(leaf)?, "leaf is already attached");
                return Ok(());
            }
            (
                data.network,
                data.module_path(),
                data.module_level,
                data.highlight_index,
                data.insignificant(),
            )
        };
        let module = self.module_or_create(network, &module_path, module_level)?;
        let group = self.group_or_create(module, highlight_index, insignificant)?;

        for side in Side::BOTH {
            let branch = self.as_group(group)?.branch(side);
            let opposite_side = side.opposite();
            let target = match self.resolve_opposite(leaf, side)? {
                Some(opposite) => self
                    .attached_branch(opposite, opposite_side)?
                    .map(|opposite_branch| (opposite, opposite_branch)),
                None => None,
            };

            let Some((opposite, opposite_branch)) = target else {
                let id = StreamlineId::dangling(self.id_of(branch)?);
                let (streamline, _) = self.streamline_in(branch, id)?;
                self.attach_to_side(leaf, side, streamline)?;
                continue;
            };

            self.detach_from_side(opposite, opposite_side)?;
            let source = self.id_of(branch)?.to_string();
            let target = self.id_of(opposite_branch)?.to_string();
            let id = StreamlineId::new(source.clone(), Some(target.clone()));
            let mirrored = StreamlineId::new(target, Some(source));

            let (streamline, _) = self.streamline_in(branch, id)?;
            let (opposite_streamline, _) = self.streamline_in(opposite_branch, mirrored)?;
            let unlinked = self.as_streamline(streamline)?.link.is_none()
                || self.as_streamline(opposite_streamline)?.link.is_none();
            if unlinked {
                self.link_streamlines(streamline, side, opposite_streamline)?;
            }
            self.attach_to_side(opposite, opposite_side, opposite_streamline)?;
            self.attach_to_side(leaf, side, streamline)?;
            trace!(
                leaf = %self.id_of(leaf)?,
                side = %side,
                streamline = %self.id_of(streamline)?,
                "linked leaf"
            );
        }
        Ok(())
    }

    /// Detaches a leaf from both sides and collapses the ancestors it leaves empty.
    ///
    /// With `release_network_if_empty` the owning network is destroyed once it holds
    /// no module, clearing the opposite references that pointed into it.
    pub fn remove_leaf(
        &mut self,
        leaf: NodeId,
        release_network_if_empty: bool,
    ) -> Result<(), AlluvialError> {
        let network = self.as_leaf(leaf)?.network;
        let group = self.ancestor(leaf, Depth::HighlightGroup);

        for side in Side::BOTH {
            self.detach_from_side(leaf, side)?;
        }
        if let Some(group) = group {
            self.collapse_group(group)?;
        }
        if release_network_if_empty && self.children(network).is_empty() {
            self.release_network(network)?;
        }
        Ok(())
    }

    /// Re-inserts a leaf after its module key changed.
    pub fn update_leaf(&mut self, leaf: NodeId) -> Result<(), AlluvialError> {
        self.remove_leaf(leaf, false)?;
        self.add_leaf(leaf)
    }

    /// Moves leaves into the highlight group for `highlight_index`.
    pub fn set_highlight_index(
        &mut self,
        leaves: &[NodeId],
        highlight_index: i32,
    ) -> Result<MutationOutcome, AlluvialError> {
        for leaf in leaves {
            self.as_leaf(*leaf)?;
        }
        let mut updated = 0;
        for leaf in leaves {
            let data = self.as_leaf_mut(*leaf)?;
            if data.highlight_index == highlight_index {
                continue;
            }
            data.highlight_index = highlight_index;
            let attached = data.is_attached();
            if attached {
                self.update_leaf(*leaf)?;
            }
            updated += 1;
        }
        Ok(MutationOutcome::updated(updated))
    }

    fn resolve_opposite(&mut self, leaf: NodeId, side: Side) -> Result<Option<NodeId>, AlluvialError> {
        let (network, identifier, cached) = {
            let data = self.as_leaf(leaf)?;
            (data.network, data.identifier.clone(), data.opposite(side))
        };
        // A repeated identifier dangles; only the indexed leaf takes part in links.
        if self.as_network(network)?.leaf_index.get(&identifier) != Some(&leaf) {
            return Ok(None);
        }
        let Some(neighbor) = self.neighbor_network(network, side) else {
            return Ok(None);
        };
        if let Some(cached) = cached {
            if self.as_leaf(cached).map(|o| o.network == neighbor).unwrap_or(false) {
                return Ok(Some(cached));
            }
        }
        let found = self.as_network(neighbor)?.leaf_index.get(&identifier).copied();
        self.as_leaf_mut(leaf)?.opposites[side.index()] = found;
        if let Some(opposite) = found {
            self.as_leaf_mut(opposite)?.opposites[side.opposite().index()] = Some(leaf);
        }
        Ok(found)
    }

    /// Branch on `side` of the highlight group an attached leaf currently lives in.
    fn attached_branch(&self, leaf: NodeId, side: Side) -> Result<Option<NodeId>, AlluvialError> {
        let Some(group) = self.ancestor(leaf, Depth::HighlightGroup) else {
            return Ok(None);
        };
        Ok(Some(self.as_group(group)?.branch(side)))
    }

    pub(crate) fn module_or_create(
        &mut self,
        network: NodeId,
        path: &TreePath,
        module_level: usize,
    ) -> Result<NodeId, AlluvialError> {
        let key = path.path_string();
        if let Some(module) = self.as_network(network)?.modules.get(&key) {
            return Ok(*module);
        }
        let network_id = self.id_of(network)?.to_string();
        let kind = NodeKind::Module(ModuleData {
            path: path.clone(),
            module_level,
            margin: 0.0,
        });
        let id = format!("{network_id}_module{key}");
        let module = self.alloc(NodeRecord::new(id, network_id, Some(network), kind))?;
        self.add_child(network, module)?;
        self.as_network_mut(network)?.modules.insert(key, module);
        Ok(module)
    }

    pub(crate) fn group_or_create(
        &mut self,
        module: NodeId,
        highlight_index: i32,
        insignificant: bool,
    ) -> Result<NodeId, AlluvialError> {
        let existing = self.children(module).iter().copied().find(|group| {
            self.as_group(*group)
                .map(|g| g.highlight_index == highlight_index && g.insignificant == insignificant)
                .unwrap_or(false)
        });
        if let Some(group) = existing {
            return Ok(group);
        }

        let (module_id, network_id, path) = {
            let record = self.record(module)?;
            let NodeKind::Module(data) = &record.kind else {
                return Err(tree_error("wrong-kind", "highlight groups hang from modules")
                    .with_context("node", module.as_raw()));
            };
            (record.id.clone(), record.network_id.clone(), data.path.clone())
        };
        let marker = if insignificant { "i" } else { "" };
        let group_id = format!("{module_id}_group{marker}{highlight_index}");

        let mut branches = [NodeId::from_raw(0); 2];
        for side in Side::BOTH {
            let branch_id = endpoint_key(&network_id, &path, highlight_index, insignificant, side);
            let record = NodeRecord::new(
                branch_id,
                network_id.clone(),
                None,
                NodeKind::Branch(BranchData { side }),
            );
            branches[side.index()] = self.alloc(record)?;
        }
        let kind = NodeKind::HighlightGroup(GroupData {
            highlight_index,
            insignificant,
            branches,
        });
        let group = self.alloc(NodeRecord::new(group_id, network_id, Some(module), kind))?;
        self.add_child(module, group)?;
        for branch in branches {
            self.add_child(group, branch)?;
        }
        Ok(group)
    }

    /// Removes a highlight group once both branches are empty, then its module once
    /// it holds no group.
    fn collapse_group(&mut self, group: NodeId) -> Result<(), AlluvialError> {
        if !self.contains(group) || !self.is_empty(group) {
            return Ok(());
        }
        let module = self.record(group)?.parent;
        let branches = self.as_group(group)?.branches;
        for branch in branches {
            self.release(branch);
        }
        if let Some(module) = module {
            self.remove_child(module, group)?;
        }
        self.release(group);

        let Some(module) = module else {
            return Ok(());
        };
        if !self.children(module).is_empty() {
            return Ok(());
        }
        let network = self.record(module)?.parent;
        let key = self.as_module(module)?.path.path_string();
        if let Some(network) = network {
            self.remove_child(network, module)?;
            self.as_network_mut(network)?.modules.remove(&key);
        }
        self.release(module);
        Ok(())
    }
}

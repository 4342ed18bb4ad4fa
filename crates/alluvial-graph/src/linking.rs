//! Creation, lookup, dissolution and merging of streamline nodes.

use alluvial_core::errors::AlluvialError;
use alluvial_core::{NodeId, Side, StreamlineId};
use tracing::{trace, warn};

use crate::node::{NodeKind, NodeRecord, StreamlineData, StreamlineLink};
use crate::tree::{tree_error, Diagram};

impl Diagram {
    /// Streamline registered under an identity string.
    pub fn streamline_by_id(&self, id: &str) -> Option<NodeId> {
        self.streamlines_by_id.get(id).copied()
    }

    /// Registry entries in identity order.
    pub fn streamline_ids(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.streamlines_by_id
            .iter()
            .map(|(id, node)| (id.as_str(), *node))
    }

    /// Number of registered streamlines.
    pub fn num_streamlines(&self) -> usize {
        self.streamlines_by_id.len()
    }

    /// Linked partner of a streamline, if any.
    pub fn opposite_streamline(&self, streamline: NodeId) -> Result<Option<NodeId>, AlluvialError> {
        Ok(self
            .as_streamline(streamline)?
            .link
            .map(|link| link.other(streamline)))
    }

    /// Looks up the streamline registered under `streamline_id`, creating it under
    /// `branch` when absent. Returns the node and whether it was created.
    pub(crate) fn streamline_in(
        &mut self,
        branch: NodeId,
        streamline_id: StreamlineId,
    ) -> Result<(NodeId, bool), AlluvialError> {
        let key = streamline_id.encode();
        if let Some(existing) = self.streamlines_by_id.get(&key) {
            return Ok((*existing, false));
        }
        let (side, network_id) = {
            let record = self.record(branch)?;
            let NodeKind::Branch(data) = &record.kind else {
                return Err(tree_error("wrong-kind", "streamlines hang from branches")
                    .with_context("node", branch.as_raw()));
            };
            (data.side, record.network_id.clone())
        };
        let kind = NodeKind::Streamline(StreamlineData {
            side,
            streamline_id,
            link: None,
        });
        let node = self.alloc(NodeRecord::new(key.clone(), network_id, Some(branch), kind))?;
        self.add_child(branch, node)?;
        trace!(streamline = %key, "created streamline");
        self.streamlines_by_id.insert(key, node);
        Ok((node, true))
    }

    /// Pairs two streamlines. `side` is the branch side of `node`.
    pub(crate) fn link_streamlines(
        &mut self,
        node: NodeId,
        side: Side,
        opposite: NodeId,
    ) -> Result<(), AlluvialError> {
        let link = StreamlineLink::oriented(node, side, opposite);
        self.as_streamline_mut(node)?.link = Some(link);
        self.as_streamline_mut(opposite)?.link = Some(link);
        Ok(())
    }

    /// Hangs a leaf from a streamline on one side.
    pub(crate) fn attach_to_side(
        &mut self,
        leaf: NodeId,
        side: Side,
        streamline: NodeId,
    ) -> Result<(), AlluvialError> {
        self.add_child(streamline, leaf)?;
        self.as_leaf_mut(leaf)?.parents[side.index()] = Some(streamline);
        Ok(())
    }

    /// Detaches a leaf from its streamline on one side.
    ///
    /// A streamline left empty is deleted. Its linked partner cannot be deleted, so
    /// it is turned dangling and re-registered; if a dangling streamline with that
    /// identity already exists the two are merged.
    pub(crate) fn detach_from_side(&mut self, leaf: NodeId, side: Side) -> Result<(), AlluvialError> {
        let Some(streamline) = self.as_leaf(leaf)?.parent(side) else {
            warn!(leaf = %self.id_of(leaf)?, side = %side, "leaf has no parent on this side");
            return Ok(());
        };
        self.remove_child(streamline, leaf)?;
        self.as_leaf_mut(leaf)?.parents[side.index()] = None;

        if !self.children(streamline).is_empty() {
            return Ok(());
        }
        if let Some(link) = self.as_streamline(streamline)?.link {
            self.make_dangling(link.other(streamline), side.opposite())?;
        }
        self.discard_streamline(streamline)
    }

    fn make_dangling(&mut self, streamline: NodeId, side: Side) -> Result<(), AlluvialError> {
        let old_id = self.id_of(streamline)?.to_string();
        if self.streamlines_by_id.get(&old_id) == Some(&streamline) {
            self.streamlines_by_id.remove(&old_id);
        }
        let new_id = {
            let data = self.as_streamline_mut(streamline)?;
            data.link = None;
            data.streamline_id.make_dangling();
            data.streamline_id.encode()
        };

        match self.streamlines_by_id.get(&new_id).copied() {
            Some(existing) if existing != streamline => {
                let leaves = self.children(streamline).to_vec();
                for leaf in &leaves {
                    self.attach_to_side(*leaf, side, existing)?;
                }
                if let Some(branch) = self.record(streamline)?.parent {
                    self.remove_child(branch, streamline)?;
                }
                self.release(streamline);
                trace!(streamline = %new_id, moved = leaves.len(), "merged dangling streamline");
            }
            _ => {
                self.set_id(streamline, new_id.clone())?;
                trace!(from = %old_id, to = %new_id, "streamline now dangling");
                self.streamlines_by_id.insert(new_id, streamline);
            }
        }
        Ok(())
    }

    fn discard_streamline(&mut self, streamline: NodeId) -> Result<(), AlluvialError> {
        let id = self.id_of(streamline)?.to_string();
        if self.streamlines_by_id.get(&id) == Some(&streamline) {
            self.streamlines_by_id.remove(&id);
        }
        if let Some(branch) = self.record(streamline)?.parent {
            self.remove_child(branch, streamline)?;
        }
        self.release(streamline);
        trace!(streamline = %id, "removed empty streamline");
        Ok(())
    }
}

//! Geometry for the whole diagram.
//!
//! The layout runs in three passes: a sizing pass that orders modules and assigns
//! provisional heights and margins, a margin normalisation pass, and a placement
//! pass that stacks streamlines, branches, groups and modules bottom-up. Screen y
//! grows downward; stacking starts at `height` and moves toward zero.

use alluvial_core::errors::AlluvialError;
use alluvial_core::{difference_index, Depth, NodeId, Side};
use tracing::{debug, debug_span};

use crate::config::{LayoutConfig, ModuleSize, VerticalAlign};
use crate::module::module_visible;
use crate::node::{Layout, NodeKind};
use crate::sort::structural_order;
use crate::tree::Diagram;

const MAX_MARGIN_FRACTION_OF_HEIGHT: f64 = 0.5;

/// Relative size of a node within one network.
#[derive(Debug, Clone, Copy)]
struct NodeSizer {
    max_network_flow: f64,
    network_leaves: usize,
}

impl NodeSizer {
    fn size(&self, diagram: &Diagram, node: NodeId, metric: ModuleSize) -> f64 {
        match metric {
            ModuleSize::Flow => {
                if self.max_network_flow > 0.0 {
                    diagram.flow(node).unwrap_or(0.0) / self.max_network_flow
                } else {
                    0.0
                }
            }
            ModuleSize::Nodes => {
                if self.network_leaves > 0 {
                    diagram.num_leaf_nodes(node) as f64 / self.network_leaves as f64
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct NetworkTotals {
    margins: f64,
    visible_size: f64,
    visible_modules: usize,
}

impl Diagram {
    /// Lays the diagram out. Expects flows from a preceding [`Diagram::calc_flow`].
    ///
    /// Re-running with the same tree and parameters yields the same geometry.
    pub fn update_layout(&mut self, config: &LayoutConfig) -> Result<(), AlluvialError> {
        config.validate()?;
        let _span = debug_span!("update_layout").entered();
        let root = self.root();
        let networks = self.networks().to_vec();
        let height = config.height;
        if networks.is_empty() {
            return self.set_layout(root, Layout::new(0.0, 0.0, 0.0, height));
        }

        let streamline_width = config.streamline_fraction * config.module_width;
        let network_width = config.module_width + streamline_width;
        let total_width = network_width * networks.len() as f64 - streamline_width;
        let max_network_flow = networks
            .iter()
            .map(|network| self.flow(*network))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .fold(0.0, f64::max);

        let mut sizers = Vec::with_capacity(networks.len());
        let mut totals = vec![NetworkTotals::default(); networks.len()];
        for (index, network) in networks.iter().copied().enumerate() {
            let sizer = NodeSizer {
                max_network_flow,
                network_leaves: self.num_leaf_nodes(network),
            };
            let x = index as f64 * network_width;
            totals[index] = self.size_network(network, x, &sizer, config)?;
            sizers.push(sizer);
        }

        let max_total_margin = totals.iter().map(|t| t.margins).fold(0.0, f64::max);
        let mut usable_height = height - max_total_margin;
        if height > 0.0 && max_total_margin / height > MAX_MARGIN_FRACTION_OF_HEIGHT {
            let scale = MAX_MARGIN_FRACTION_OF_HEIGHT * height / max_total_margin;
            for network in &networks {
                for module in self.children(*network).to_vec() {
                    self.as_module_mut(module)?.margin *= scale;
                }
            }
            usable_height = height - max_total_margin * scale;
        }

        if config.vertical_align == VerticalAlign::Justify {
            for (network, network_totals) in networks.iter().zip(&totals) {
                self.justify_margins(
                    *network,
                    network_totals,
                    max_total_margin,
                    usable_height,
                    config.flow_threshold,
                )?;
            }
        }

        self.sort_streamlines(&networks, config.flow_threshold)?;

        for (index, network) in networks.iter().copied().enumerate() {
            let x = index as f64 * network_width;
            let remaining = self.place_network(network, x, &sizers[index], usable_height, config)?;
            if config.vertical_align == VerticalAlign::Top && remaining > 0.0 {
                self.shift_network(network, remaining)?;
            }
        }
        self.set_layout(root, Layout::new(0.0, 0.0, total_width, height))?;
        debug!(
            networks = networks.len(),
            usable_height,
            max_total_margin,
            "layout updated"
        );
        Ok(())
    }

    /// Orders modules and groups, assigns provisional module geometry and margins.
    fn size_network(
        &mut self,
        network: NodeId,
        x: f64,
        sizer: &NodeSizer,
        config: &LayoutConfig,
    ) -> Result<NetworkTotals, AlluvialError> {
        let custom_sorted = {
            let data = self.as_network_mut(network)?;
            data.flow_threshold = config.flow_threshold;
            data.custom_sorted
        };
        if !custom_sorted {
            let entries = self
                .children(network)
                .iter()
                .map(|module| {
                    let segments = self.as_module(*module)?.path.segments().to_vec();
                    Ok((*module, segments, sizer.size(self, *module, config.sort_modules_by)))
                })
                .collect::<Result<Vec<_>, AlluvialError>>()?;
            *self.children_mut(network)? = structural_order(&entries);
        }

        let visible = self.visible_modules(network, config.flow_threshold)?;
        for module in self.children(network).to_vec() {
            self.as_module_mut(module)?.margin = 0.0;
        }
        let mut totals = NetworkTotals::default();
        let mut y = config.height;
        for (index, module) in visible.iter().copied().enumerate() {
            self.sort_groups(module)?;
            let margin = match visible.get(index + 1) {
                Some(next) => {
                    let shared = difference_index(
                        self.as_module(module)?.path.segments(),
                        self.as_module(*next)?.path.segments(),
                    );
                    2f64.powf(config.margin_exponent - 2.0 * shared as f64)
                }
                None => 0.0,
            };
            let size = sizer.size(self, module, config.module_size);
            let module_height = size * config.height;
            y -= module_height;
            self.as_module_mut(module)?.margin = margin;
            self.set_layout(module, Layout::new(x, y, config.module_width, module_height))?;

            let mut group_y = y + module_height;
            for group in self.children(module).to_vec() {
                let group_height = sizer.size(self, group, config.module_size) * config.height;
                group_y -= group_height;
                self.set_layout(group, Layout::new(x, group_y, config.module_width, group_height))?;
            }

            y -= margin;
            totals.margins += margin;
            totals.visible_size += size;
            totals.visible_modules += 1;
        }
        Ok(totals)
    }

    /// Highlight order, insignificant groups last.
    fn sort_groups(&mut self, module: NodeId) -> Result<(), AlluvialError> {
        let mut keyed = self
            .children(module)
            .iter()
            .map(|group| {
                let data = self.as_group(*group)?;
                Ok(((data.insignificant, data.highlight_index), *group))
            })
            .collect::<Result<Vec<_>, AlluvialError>>()?;
        keyed.sort_by_key(|(key, _)| *key);
        *self.children_mut(module)? = keyed.into_iter().map(|(_, group)| group).collect();
        Ok(())
    }

    fn justify_margins(
        &mut self,
        network: NodeId,
        totals: &NetworkTotals,
        max_total_margin: f64,
        usable_height: f64,
        flow_threshold: f64,
    ) -> Result<(), AlluvialError> {
        let num_margins = totals.visible_modules.saturating_sub(1);
        let missing_margin = (1.0 - totals.visible_size) * usable_height;
        for module in self.visible_modules(network, flow_threshold)? {
            let data = self.as_module_mut(module)?;
            if data.margin > 0.0 {
                data.margin *= max_total_margin / totals.margins;
                if num_margins > 0 {
                    data.margin += missing_margin / num_margins as f64;
                }
            }
        }
        Ok(())
    }

    /// Orders every branch's streamlines by the vertical position of the group
    /// their partner sits in.
    fn sort_streamlines(&mut self, networks: &[NodeId], flow_threshold: f64) -> Result<(), AlluvialError> {
        for network in networks {
            for module in self.children(*network).to_vec() {
                for group in self.children(module).to_vec() {
                    for branch in self.children(group).to_vec() {
                        let mut keyed = self
                            .children(branch)
                            .iter()
                            .map(|streamline| {
                                (self.opposite_position(*streamline, flow_threshold), *streamline)
                            })
                            .collect::<Vec<_>>();
                        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
                        *self.children_mut(branch)? =
                            keyed.into_iter().map(|(_, streamline)| streamline).collect();
                    }
                }
            }
        }
        Ok(())
    }

    fn opposite_position(&self, streamline: NodeId, flow_threshold: f64) -> f64 {
        let Ok(Some(opposite)) = self.opposite_streamline(streamline) else {
            return f64::NEG_INFINITY;
        };
        let Some(group) = self.ancestor(opposite, Depth::HighlightGroup) else {
            return f64::NEG_INFINITY;
        };
        let visible = self
            .ancestor(group, Depth::Module)
            .and_then(|module| self.flow(module).ok())
            .map(|flow| module_visible(flow, flow_threshold))
            .unwrap_or(false);
        if !visible {
            return f64::NEG_INFINITY;
        }
        self.layout(group).map(|layout| -layout.y).unwrap_or(f64::NEG_INFINITY)
    }

    /// Final placement of one network. Returns the unused space above the stack.
    fn place_network(
        &mut self,
        network: NodeId,
        x: f64,
        sizer: &NodeSizer,
        usable_height: f64,
        config: &LayoutConfig,
    ) -> Result<f64, AlluvialError> {
        let width = config.module_width;
        let metric = config.module_size;
        let mut y = config.height;
        for module in self.children(network).to_vec() {
            if self.flow(module)? < config.flow_threshold {
                self.collapse_subtree(module, Layout::new(x, y, width, 0.0))?;
                continue;
            }
            for group in self.children(module).to_vec() {
                for branch in self.children(group).to_vec() {
                    let start = y;
                    for streamline in self.children(branch).to_vec() {
                        let streamline_height = sizer.size(self, streamline, metric) * usable_height;
                        y -= streamline_height;
                        self.set_layout(streamline, Layout::new(x, y, width, streamline_height))?;
                    }
                    let branch_height = sizer.size(self, branch, metric) * usable_height;
                    self.set_layout(branch, Layout::new(x, y, width, branch_height))?;
                    if let Ok(NodeKind::Branch(data)) = self.kind(branch) {
                        if data.side == Side::Left {
                            y = start;
                        }
                    }
                }
                let group_height = sizer.size(self, group, metric) * usable_height;
                self.set_layout(group, Layout::new(x, y, width, group_height))?;
            }
            let module_height = sizer.size(self, module, metric) * usable_height;
            self.set_layout(module, Layout::new(x, y, width, module_height))?;
            y -= self.as_module(module)?.margin;
        }
        self.set_layout(network, Layout::new(x, 0.0, width, config.height))?;
        Ok(y.max(0.0))
    }

    fn visible_modules(&self, network: NodeId, flow_threshold: f64) -> Result<Vec<NodeId>, AlluvialError> {
        let mut visible = Vec::new();
        for module in self.children(network) {
            if self.flow(*module)? >= flow_threshold {
                visible.push(*module);
            }
        }
        Ok(visible)
    }

    fn collapse_subtree(&mut self, node: NodeId, layout: Layout) -> Result<(), AlluvialError> {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if matches!(self.kind(current)?, NodeKind::Leaf(_)) {
                continue;
            }
            self.set_layout(current, layout)?;
            stack.extend(self.children(current).iter().copied());
        }
        Ok(())
    }

    fn shift_network(&mut self, network: NodeId, offset: f64) -> Result<(), AlluvialError> {
        let mut stack = self.children(network).to_vec();
        while let Some(current) = stack.pop() {
            if matches!(self.kind(current)?, NodeKind::Leaf(_)) {
                continue;
            }
            let mut layout = self.layout(current)?;
            layout.y -= offset;
            self.set_layout(current, layout)?;
            stack.extend(self.children(current).iter().copied());
        }
        Ok(())
    }
}

use alluvial_core::errors::AlluvialError;
use alluvial_core::{Depth, NodeId, Side};
use tracing::{debug, debug_span};

use crate::node::NodeKind;
use crate::tree::Diagram;

impl Diagram {
    /// Recomputes the aggregated flow of every internal node bottom-up and returns
    /// the total flow at the root.
    ///
    /// A highlight group takes the flow of its LEFT branch; both branches hold the
    /// same leaves.
    pub fn calc_flow(&mut self) -> Result<f64, AlluvialError> {
        let _span = debug_span!("calc_flow").entered();
        let root = self.root();
        let mut failure = None;
        self.for_each_post_order_while(
            root,
            |diagram, node| {
                diagram
                    .depth(node)
                    .map(|depth| depth < Depth::LeafNode)
                    .unwrap_or(false)
            },
            |diagram, visit| {
                if let Err(err) = diagram.aggregate_flow(visit.node) {
                    failure.get_or_insert(err);
                }
            },
        );
        if let Some(err) = failure {
            return Err(err);
        }
        self.aggregate_flow(root)?;
        let total = self.flow(root)?;
        debug!(total, networks = self.networks().len(), "flow aggregated");
        Ok(total)
    }

    fn aggregate_flow(&mut self, node: NodeId) -> Result<(), AlluvialError> {
        let flow = match &self.record(node)?.kind {
            NodeKind::HighlightGroup(group) => self.flow(group.branch(Side::Left))?,
            _ => self
                .children(node)
                .iter()
                .map(|child| self.flow(*child))
                .sum::<Result<f64, AlluvialError>>()?,
        };
        self.set_flow(node, flow)
    }
}

use alluvial_core::errors::AlluvialError;
use alluvial_core::{NodeId, Side};
use sha2::{Digest, Sha256};

use crate::tree::Diagram;

/// Computes a structural hash of the diagram.
///
/// Covers network order, modules, highlight groups and streamline topology. Child
/// order below a network and flows are left out, so swap-removal reorderings and
/// summation order do not change the hash.
pub fn canonical_hash(diagram: &Diagram) -> Result<String, AlluvialError> {
    let mut hasher = Sha256::new();
    let networks = diagram.networks();
    hasher.update((networks.len() as u64).to_le_bytes());
    for network in networks {
        update_str(diagram.id_of(*network)?, &mut hasher);
        encode_network(diagram, *network, &mut hasher)?;
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn encode_network(
    diagram: &Diagram,
    network: NodeId,
    hasher: &mut Sha256,
) -> Result<(), AlluvialError> {
    let mut modules = Vec::new();
    for module in diagram.children(network) {
        let data = diagram.as_module(*module)?;
        modules.push((data.path.to_string(), data.module_level, *module));
    }
    modules.sort();
    hasher.update((modules.len() as u64).to_le_bytes());
    for (path, level, module) in modules {
        update_str(&path, hasher);
        hasher.update((level as u64).to_le_bytes());
        encode_module(diagram, module, hasher)?;
    }
    Ok(())
}

fn encode_module(
    diagram: &Diagram,
    module: NodeId,
    hasher: &mut Sha256,
) -> Result<(), AlluvialError> {
    let mut groups = Vec::new();
    for group in diagram.children(module) {
        let data = diagram.as_group(*group)?;
        groups.push((data.highlight_index, data.insignificant, data.branches));
    }
    groups.sort_by_key(|(highlight_index, insignificant, _)| (*highlight_index, *insignificant));
    hasher.update((groups.len() as u64).to_le_bytes());
    for (highlight_index, insignificant, branches) in groups {
        hasher.update(highlight_index.to_le_bytes());
        hasher.update([u8::from(insignificant)]);
        for side in Side::BOTH {
            update_str(side.as_str(), hasher);
            encode_branch(diagram, branches[side.index()], hasher)?;
        }
    }
    Ok(())
}

fn encode_branch(
    diagram: &Diagram,
    branch: NodeId,
    hasher: &mut Sha256,
) -> Result<(), AlluvialError> {
    let mut streamlines = Vec::new();
    for streamline in diagram.children(branch) {
        let id = diagram.id_of(*streamline)?.to_string();
        let partner = match diagram.opposite_streamline(*streamline)? {
            Some(opposite) => Some(diagram.id_of(opposite)?.to_string()),
            None => None,
        };
        let mut leaves = Vec::new();
        for leaf in diagram.children(*streamline) {
            leaves.push(diagram.as_leaf(*leaf)?.identifier.clone());
        }
        leaves.sort();
        streamlines.push((id, partner, leaves));
    }
    streamlines.sort();
    hasher.update((streamlines.len() as u64).to_le_bytes());
    for (id, partner, leaves) in streamlines {
        update_str(&id, hasher);
        match partner {
            Some(partner) => {
                hasher.update(b"linked");
                update_str(&partner, hasher);
            }
            None => hasher.update(b"dangling"),
        }
        hasher.update((leaves.len() as u64).to_le_bytes());
        for leaf in &leaves {
            update_str(leaf, hasher);
        }
    }
    Ok(())
}

fn update_str(value: &str, hasher: &mut Sha256) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

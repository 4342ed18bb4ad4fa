//! Custom module names that outlive the transient module nodes.
//!
//! Names are keyed by network id and module path, so a module destroyed by an
//! expand and rebuilt by a regroup finds its name again.

use std::collections::BTreeMap;

use alluvial_core::errors::AlluvialError;
use alluvial_core::{NodeId, TreePath};

use crate::tree::Diagram;

#[derive(Debug, Clone, PartialEq)]
struct CustomName {
    name: String,
    flow: f64,
}

/// Registry of user supplied module names for one diagram.
#[derive(Debug, Clone, Default)]
pub struct ModuleNames {
    names: BTreeMap<(String, Vec<u32>), CustomName>,
}

impl ModuleNames {
    /// Stores a name, or clears it when `name` is empty.
    pub fn set(&mut self, network_id: &str, path: &TreePath, name: &str, flow: f64) {
        let key = (network_id.to_string(), path.segments().to_vec());
        if name.is_empty() {
            self.names.remove(&key);
        } else {
            self.names.insert(
                key,
                CustomName {
                    name: name.to_string(),
                    flow,
                },
            );
        }
    }

    /// Removes the name stored for one module path.
    pub fn clear(&mut self, network_id: &str, path: &TreePath) {
        self.names
            .remove(&(network_id.to_string(), path.segments().to_vec()));
    }

    /// Name stored for exactly this module path.
    pub fn get(&self, network_id: &str, path: &TreePath) -> Option<&str> {
        self.names
            .get(&(network_id.to_string(), path.segments().to_vec()))
            .map(|custom| custom.name.as_str())
    }

    /// Name shown for a module: its own name, else the names stored for paths below
    /// it ordered by the flow recorded when they were named.
    pub fn display_name(&self, network_id: &str, path: &TreePath) -> Option<Vec<String>> {
        if let Some(name) = self.get(network_id, path) {
            return Some(vec![name.to_string()]);
        }
        let mut below: Vec<&CustomName> = self
            .names
            .iter()
            .filter(|((net, segments), _)| {
                net == network_id
                    && segments.len() > path.level()
                    && segments.starts_with(path.segments())
            })
            .map(|(_, custom)| custom)
            .collect();
        if below.is_empty() {
            return None;
        }
        below.sort_by(|a, b| a.flow.total_cmp(&b.flow));
        Some(below.into_iter().map(|custom| custom.name.clone()).collect())
    }

    /// Number of stored names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no names are stored.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Diagram {
    /// Names a module, or clears its name with `None` or an empty string.
    pub fn set_module_name(
        &mut self,
        module: NodeId,
        name: Option<&str>,
    ) -> Result<(), AlluvialError> {
        let path = self.as_module(module)?.path.clone();
        let network_id = self.network_id_of(module)?.to_string();
        let flow = self.flow(module)?;
        match name {
            Some(name) if !name.is_empty() => {
                self.module_names.set(&network_id, &path, name, flow)
            }
            _ => self.module_names.clear(&network_id, &path),
        }
        Ok(())
    }

    /// Displayed name of a module.
    pub fn module_name(&self, module: NodeId) -> Result<Option<Vec<String>>, AlluvialError> {
        let path = &self.as_module(module)?.path;
        let network_id = self.network_id_of(module)?;
        Ok(self.module_names.display_name(network_id, path))
    }

    /// The diagram's module name registry.
    pub fn module_names(&self) -> &ModuleNames {
        &self.module_names
    }
}

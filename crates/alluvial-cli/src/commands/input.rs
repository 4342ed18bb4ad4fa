//! Loading helpers shared by the subcommands.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use alluvial_core::TreePath;
use alluvial_graph::{networks_from_json, Diagram};
use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct NetworkFiles {
    /// JSON file with one network or an array of networks; repeat to append more.
    #[arg(long = "network", value_name = "PATH", required = true)]
    pub networks: Vec<PathBuf>,
}

impl NetworkFiles {
    /// Builds a diagram from every file in command line order.
    pub fn load(&self) -> Result<Diagram, Box<dyn Error>> {
        let mut diagram = Diagram::new();
        for path in &self.networks {
            let text = fs::read_to_string(path)
                .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
            for network in networks_from_json(&text)? {
                diagram.add_network(network)?;
            }
        }
        info!(
            networks = diagram.networks().len(),
            streamlines = diagram.num_streamlines(),
            "loaded networks"
        );
        Ok(diagram)
    }
}

/// `<network id>:<module path>` reference such as `run2:1:3`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRef {
    pub network_id: String,
    pub path: TreePath,
}

impl FromStr for ModuleRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (network_id, path) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <network>:<path>, got `{s}`"))?;
        if network_id.is_empty() {
            return Err(format!("missing network id in `{s}`"));
        }
        let path = TreePath::parse(path).map_err(|err| err.to_string())?;
        Ok(Self {
            network_id: network_id.to_string(),
            path,
        })
    }
}

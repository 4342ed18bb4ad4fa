use std::error::Error;

use alluvial_graph::{canonical_hash, NetworkStatistics};
use clap::Args;
use serde::Serialize;

use super::input::NetworkFiles;

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: NetworkFiles,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    structure_hash: String,
    total_flow: f64,
    num_streamlines: usize,
    networks: Vec<NetworkStatistics>,
}

pub fn run(args: &StatsArgs) -> Result<(), Box<dyn Error>> {
    let mut diagram = args.input.load()?;
    let total_flow = diagram.calc_flow()?;
    let networks = diagram
        .networks()
        .iter()
        .map(|network| diagram.network_statistics(*network))
        .collect::<Result<Vec<_>, _>>()?;
    let report = StatsReport {
        structure_hash: canonical_hash(&diagram)?,
        total_flow,
        num_streamlines: diagram.num_streamlines(),
        networks,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

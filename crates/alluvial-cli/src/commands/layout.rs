use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use alluvial_core::{AlluvialError, NodeId};
use alluvial_graph::{diagram_to_json, Diagram, LayoutConfig, VerticalAlign};
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use super::input::{ModuleRef, NetworkFiles};

#[derive(Args, Debug)]
pub struct LayoutArgs {
    #[command(flatten)]
    pub input: NetworkFiles,
    /// TOML file with layout parameters.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output file for the render tree; stdout when absent.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Expand a module, given as `<network>:<path>`. Applied in order.
    #[arg(long, value_name = "NET:PATH")]
    pub expand: Vec<ModuleRef>,
    /// Regroup a module, given as `<network>:<path>`. Applied after every expand.
    #[arg(long, value_name = "NET:PATH")]
    pub regroup: Vec<ModuleRef>,
    /// Override the drawing height.
    #[arg(long)]
    pub height: Option<f64>,
    /// Override the module flow threshold.
    #[arg(long)]
    pub flow_threshold: Option<f64>,
    /// Override the vertical alignment.
    #[arg(long, value_enum)]
    pub vertical_align: Option<AlignArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum AlignArg {
    Bottom,
    Justify,
    Top,
}

impl From<AlignArg> for VerticalAlign {
    fn from(value: AlignArg) -> Self {
        match value {
            AlignArg::Bottom => VerticalAlign::Bottom,
            AlignArg::Justify => VerticalAlign::Justify,
            AlignArg::Top => VerticalAlign::Top,
        }
    }
}

pub fn run(args: &LayoutArgs) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(args)?;
    let mut diagram = args.input.load()?;

    for target in &args.expand {
        let module = find_module(&diagram, target)?;
        let outcome = diagram.expand(module)?;
        info!(network = %target.network_id, path = %target.path, changed = outcome.changed, "expand");
    }
    for target in &args.regroup {
        let module = find_module(&diagram, target)?;
        let outcome = diagram.regroup(module)?;
        info!(network = %target.network_id, path = %target.path, changed = outcome.changed, "regroup");
    }

    let total_flow = diagram.calc_flow()?;
    diagram.update_layout(&config)?;
    let json = diagram_to_json(&diagram)?;
    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
            info!(path = %path.display(), total_flow, "render tree written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn resolve_config(args: &LayoutArgs) -> Result<LayoutConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => LayoutConfig::default(),
    };
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(threshold) = args.flow_threshold {
        config.flow_threshold = threshold;
    }
    if let Some(align) = args.vertical_align {
        config.vertical_align = align.into();
    }
    if let Err(err) = config.validate() {
        warn!(%err, "falling back to default values for invalid layout parameters");
        config = config.sanitised();
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<LayoutConfig, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    let config: LayoutConfig = toml::from_str(&text).map_err(|err| {
        AlluvialError::serde("deserialize-toml", err.to_string())
            .with_context("path", path.display())
    })?;
    Ok(config)
}

fn find_module(diagram: &Diagram, target: &ModuleRef) -> Result<NodeId, Box<dyn Error>> {
    diagram
        .module(&target.network_id, &target.path)
        .ok_or_else(|| format!("no module {} in network {}", target.path, target.network_id).into())
}

use std::error::Error;

use clap::Args;
use tracing::{error, info};

use super::input::NetworkFiles;

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: NetworkFiles,
    /// Emit the violations as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let mut diagram = args.input.load()?;
    diagram.calc_flow()?;
    let violations = diagram.check_invariants();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&violations)?);
    }
    if violations.is_empty() {
        info!(networks = diagram.networks().len(), "no invariant violations");
        return Ok(());
    }
    for violation in &violations {
        error!(%violation, "invariant violated");
    }
    Err(format!("{} invariant violation(s)", violations.len()).into())
}

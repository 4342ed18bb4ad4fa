use std::error::Error;
use std::process::Command;

use alluvial_graph::LayoutConfig;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Also print the build commit and the built-in layout defaults.
    #[arg(long)]
    pub long: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildReport {
    version: &'static str,
    commit: Option<String>,
    default_layout: LayoutConfig,
}

pub fn run(args: &VersionArgs) -> Result<(), Box<dyn Error>> {
    let version = env!("CARGO_PKG_VERSION");
    if !args.long {
        println!("{version}");
        return Ok(());
    }
    let report = BuildReport {
        version,
        commit: git_commit(),
        default_layout: LayoutConfig::default(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn git_commit() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

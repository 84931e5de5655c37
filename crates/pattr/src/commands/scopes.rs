//! Scopes command - hydrate a page and dump its scope tree

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;

use super::{data_dir, hydrate_with_files, load_engine, CliError};
use crate::config::PattrConfig;

#[derive(Args)]
pub struct ScopesArgs {
    /// Page to inspect
    pub page: PathBuf,

    /// Print the raw scope records as JSON instead of the live tree
    #[arg(long)]
    pub raw: bool,

    /// Directory `p-src` urls resolve against
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

pub fn run(args: ScopesArgs, config: &PattrConfig) -> Result<String, CliError> {
    let mut engine = load_engine(&args.page, config)?;
    let data_dir = data_dir(args.data_dir.as_deref(), config, &args.page);
    hydrate_with_files(&mut engine, &data_dir)?;

    if args.raw {
        let mut json = serde_json::to_string_pretty(engine.raw_data()).unwrap_or_default();
        json.push('\n');
        return Ok(json);
    }

    let mut out = engine.scopes().to_display();
    for node in engine.failed() {
        let _ = writeln!(out, "unbound {} (remote data unavailable)", node);
    }
    Ok(out)
}

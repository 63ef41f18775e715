use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::error;

use docjoin::{utils, Args};

fn main() -> Result<()> {
    utils::load_env_file(Path::new(".env"))?;

    let args = Args::parse();
    utils::setup_logging(args.verbose);
    utils::validate_args(&args)?;

    if let Err(e) = docjoin::run(&args) {
        error!(action = "fail", component = "main", error = ?e, "Analysis failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

//! Command-line front end for sample metadata reconciliation.
//!
//! Derives sample names from a directory of sequence files, builds a fresh
//! metadata record per sample, reconciles it with the snapshot left by a
//! previous run, and optionally compresses the run's fastq files.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{run_cli, Cli};
use log::info;

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG controls the level)
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting with arguments: {:?}", cli);

    run_cli(cli)
}

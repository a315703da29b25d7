//! # snpack
//!
//! Command-line front end for snpack light-curve containers.
//!
//! ## Usage
//!
//! ```bash
//! # Write a small synthetic run
//! snpack demo out DEMO_0001 --records 25
//!
//! # Inspect a container
//! snpack info out/DEMO_0001_HEAD.SNPACK
//!
//! # Dump parameters of every record listed in a list file
//! snpack dump out/DEMO_0001.LIST --param SNID --param RA --param FLUXCAL
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}

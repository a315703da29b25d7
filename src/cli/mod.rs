use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod demo;
mod dump;
mod info;

/// snpack - columnar storage for supernova light curves
#[derive(Parser)]
#[command(name = "snpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display global keys, tables and column forms of a container
    Info {
        /// Container path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Write per-record parameter values of a run as CSV
    Dump {
        /// List file naming the header containers
        #[arg(value_name = "LIST")]
        list: PathBuf,

        /// Parameter to dump; repeat for several
        #[arg(short, long = "param", value_name = "NAME", required = true)]
        params: Vec<String>,

        /// Epoch mask applied to photometry parameters, e.g. 1,0,1
        #[arg(long, value_delimiter = ',')]
        mask: Vec<i32>,

        /// Output CSV path (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Do not open spectrum containers
        #[arg(long)]
        no_spectra: bool,
    },

    /// Write a small synthetic run
    Demo {
        /// Output directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Container name prefix
        #[arg(value_name = "PREFIX", default_value = "DEMO_0001")]
        prefix: String,

        /// Snapshot TOML deciding which columns exist
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Writer settings TOML
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Number of records
        #[arg(short = 'n', long, default_value = "20")]
        records: usize,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Info { file } => info::run(file),
        Commands::Dump {
            list,
            params,
            mask,
            output,
            no_spectra,
        } => dump::run(list, params, mask, output, no_spectra),
        Commands::Demo {
            dir,
            prefix,
            snapshot,
            config,
            records,
        } => demo::run(dir, prefix, snapshot, config, records),
    }
}

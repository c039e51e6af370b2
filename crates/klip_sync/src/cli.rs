use std::path::PathBuf;

use clap::Parser;
use klip_logging::{LevelFilter, LogDestination};

#[derive(Debug, Parser)]
#[command(name = "klip-sync")]
#[command(about = "Download pending klip articles and acknowledge them on the server")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to config.json next to the executable)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also append log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

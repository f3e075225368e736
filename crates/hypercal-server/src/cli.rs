//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;

/// hypercal - Cleaner university timetables as iCalendar feeds
#[derive(Debug, Parser)]
#[command(name = "hypercal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "HYPERCAL_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Port to listen on, overriding the configuration
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

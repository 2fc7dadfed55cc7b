use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "extapi",
    about = "Extended REST endpoints for custom fields, saved queries and bulk time entries",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ConfigArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
    /// Load a fixture file and report what it contains
    CheckFixture(CheckFixtureArgs),
}

/// Where the configuration comes from. Flags override the file.
#[derive(Args, Default)]
pub struct ConfigArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(long)]
    pub fixture: Option<PathBuf>,
    #[arg(long)]
    pub max_batch: Option<usize>,
}

#[derive(Args)]
pub struct CheckFixtureArgs {
    pub file: PathBuf,
}
